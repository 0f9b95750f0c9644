//! Object key layout: `{images|videos|files}/{uuid}{.ext}`.

use spartan_core::media::content_type::file_extension;

pub const IMAGES_PREFIX: &str = "images/";
pub const VIDEOS_PREFIX: &str = "videos/";
pub const FILES_PREFIX: &str = "files/";

/// Folder for a content type, chosen by its top-level family.
pub fn folder_for_content_type(content_type: &str) -> &'static str {
    if content_type.starts_with("image/") {
        IMAGES_PREFIX
    } else if content_type.starts_with("video/") {
        VIDEOS_PREFIX
    } else {
        FILES_PREFIX
    }
}

/// Fresh key for an object, keeping the lowercased extension of `filename`.
pub fn object_key(content_type: &str, filename: &str) -> String {
    let folder = folder_for_content_type(content_type);
    let id = uuid::Uuid::new_v4();
    match file_extension(filename) {
        Some(ext) => format!("{folder}{id}.{ext}"),
        None => format!("{folder}{id}"),
    }
}

/// Public URL of `key`: `{endpoint}/{bucket}/{key}` for a custom endpoint,
/// otherwise the virtual-hosted AWS form.
pub fn public_url(endpoint: Option<&str>, bucket: &str, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
        None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
    }
}

/// Recover an object key from a stored media URL (or a bare key).
///
/// Handles both virtual-hosted and path-style URLs. Keys stored without a
/// folder get one inferred from their extension. Returns `None` when nothing
/// remains after stripping.
pub fn key_from_url(url: &str, bucket: &str) -> Option<String> {
    let path = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(rest) => &rest[rest.find('/')?..],
        None => url,
    };

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_start_matches('/');
    let key = path
        .strip_prefix(bucket)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path);

    if key.is_empty() {
        return None;
    }
    if [IMAGES_PREFIX, VIDEOS_PREFIX, FILES_PREFIX]
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        return Some(key.to_string());
    }
    Some(format!("{}{key}", folder_for_extension(key)))
}

fn folder_for_extension(key: &str) -> &'static str {
    match file_extension(key).as_deref() {
        Some("jpg" | "jpeg" | "png" | "gif" | "webp") => IMAGES_PREFIX,
        Some("mp4" | "webm" | "mov") => VIDEOS_PREFIX,
        _ => FILES_PREFIX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_follows_content_family() {
        assert!(object_key("image/jpeg", "a.jpg").starts_with("images/"));
        assert!(object_key("image/webp", "a.webp").starts_with("images/"));
        assert!(object_key("video/mp4", "clip.mp4").starts_with("videos/"));
        assert!(object_key("application/pdf", "doc.pdf").starts_with("files/"));
    }

    #[test]
    fn key_keeps_lowercased_extension() {
        let key = object_key("image/jpeg", "Holiday.JPG");
        assert!(key.ends_with(".jpg"), "{key}");
        // images/ + 36-char uuid + .jpg
        assert_eq!(key.len(), 7 + 36 + 4);

        let bare = object_key("image/png", "noext");
        assert_eq!(bare.len(), 7 + 36);
    }

    #[test]
    fn keys_are_unique() {
        assert_ne!(object_key("image/png", "a.png"), object_key("image/png", "a.png"));
    }

    #[test]
    fn public_url_forms() {
        assert_eq!(
            public_url(None, "media", "images/a.jpg"),
            "https://media.s3.amazonaws.com/images/a.jpg"
        );
        assert_eq!(
            public_url(Some("http://localhost:9000/"), "media", "images/a.jpg"),
            "http://localhost:9000/media/images/a.jpg"
        );
    }

    #[test]
    fn virtual_hosted_url() {
        assert_eq!(
            key_from_url("https://media.s3.amazonaws.com/videos/x.mp4", "media").as_deref(),
            Some("videos/x.mp4")
        );
    }

    #[test]
    fn path_style_url_strips_bucket() {
        assert_eq!(
            key_from_url("http://localhost:9000/media/images/a.jpg?x=1#top", "media").as_deref(),
            Some("images/a.jpg")
        );
    }

    #[test]
    fn missing_folder_is_inferred() {
        assert_eq!(
            key_from_url("https://media.s3.amazonaws.com/a.JPEG", "media").as_deref(),
            Some("images/a.JPEG")
        );
        assert_eq!(key_from_url("clip.mov", "media").as_deref(), Some("videos/clip.mov"));
        assert_eq!(key_from_url("/notes.txt", "media").as_deref(), Some("files/notes.txt"));
    }

    #[test]
    fn empty_path_has_no_key() {
        assert_eq!(key_from_url("https://media.s3.amazonaws.com/", "media"), None);
        assert_eq!(key_from_url("https://media.s3.amazonaws.com", "media"), None);
        assert_eq!(key_from_url("", "media"), None);
    }
}
