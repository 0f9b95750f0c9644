//! Content-type resolution for uploaded files.

/// Content types that carry no information about the payload.
const GENERIC_CONTENT_TYPES: &[&str] = &["", "application/octet-stream", "binary/octet-stream"];

/// Content types browsers can play without transcoding.
const BROWSER_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm"];

/// Fallback when neither the declared type nor the extension says anything.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the effective content type of an upload.
///
/// The declared type wins unless it is missing or generic, in which case the
/// filename extension is used. Parameters such as `; charset=` are dropped and
/// the result is lowercased.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if !GENERIC_CONTENT_TYPES.contains(&declared.as_str()) {
        return declared;
    }

    content_type_for_extension(filename)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Map a filename's extension to a content type.
pub fn content_type_for_extension(filename: &str) -> Option<&'static str> {
    let ext = file_extension(filename)?;
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" | "heif" => "image/heic",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => return None,
    };
    Some(content_type)
}

/// Lowercased extension of `filename` without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Canonical file extension (with dot) for a content type produced by the pipeline.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/heic" | "image/heif" => ".heic",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        _ => ".bin",
    }
}

/// HEIC/HEIF still images, which browsers cannot display.
pub fn is_heif_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence"
    )
}

/// Video formats served as-is.
pub fn is_browser_compatible_video(content_type: &str) -> bool {
    BROWSER_VIDEO_TYPES.contains(&content_type)
}
