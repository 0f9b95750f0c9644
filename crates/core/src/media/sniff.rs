//! Magic-byte detection for formats that arrive with misleading content types.

/// ISO-BMFF major brands used by HEIC/HEIF stills and sequences.
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Whether `data` starts with an ISO-BMFF `ftyp` box carrying a HEIF brand.
///
/// Layout: 4-byte box size, `ftyp`, then the 4-byte major brand.
pub fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    HEIF_BRANDS.iter().any(|brand| &data[8..12] == brand.as_slice())
}
