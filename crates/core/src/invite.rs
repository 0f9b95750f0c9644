//! Invite code generation and redemption rules.
//!
//! An invite code is single-use and may carry an expiry. Registration is only
//! allowed with a code that is both unused and unexpired.

use rand::Rng;

use crate::types::Timestamp;

/// Length of a generated invite code.
pub const INVITE_CODE_LEN: usize = 8;

/// URL-safe base64 alphabet, so codes can be pasted into links unescaped.
const INVITE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generate a random invite code of [`INVITE_CODE_LEN`] URL-safe characters.
pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.random_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

/// Whether a code in the given state can still be redeemed at `now`.
pub fn is_redeemable(used: bool, expires_at: Option<Timestamp>, now: Timestamp) -> bool {
    !used && expires_at.map_or(true, |at| at > now)
}
