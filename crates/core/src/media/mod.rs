//! Media ingestion: turn an arbitrary upload into a web-deliverable object.
//!
//! - [`content_type`] -- resolve declared or extension-derived content types.
//! - [`sniff`] -- magic-byte detection for HEIC/HEIF.
//! - [`raster`] -- in-process decode, downscale and re-encode of stills.
//! - [`convert`] -- pluggable external converters and fallback chains.
//! - [`video`] -- FFmpeg transcoder and thumbnailer.
//! - [`pipeline`] -- the end-to-end [`MediaPipeline`].

pub mod content_type;
pub mod convert;
pub mod pipeline;
pub mod raster;
pub mod sniff;
pub mod video;

use serde::{Deserialize, Serialize};

pub use convert::{ConversionError, ConverterChain, MediaConverter, SharedConverter};
pub use pipeline::MediaPipeline;

/// Classification that decides which processing branch an upload takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a resolved content type by its top-level family.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else if content_type.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Value stored in `posts.media_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// An upload as received, before any processing.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub data: Vec<u8>,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
    pub filename: String,
}

/// The pipeline's output, ready for object storage.
#[derive(Debug)]
pub struct ProcessedMedia {
    pub kind: MediaKind,
    pub data: Vec<u8>,
    pub content_type: String,
    /// Extension matching `content_type`, including the dot.
    pub extension: &'static str,
    /// JPEG still for videos, when one could be extracted.
    pub thumbnail: Option<Vec<u8>>,
}

impl ProcessedMedia {
    /// `original` with its extension replaced to match the processed content.
    pub fn file_name(&self, original: &str) -> String {
        let stem = match original.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => original,
        };
        let stem = if stem.is_empty() { "upload" } else { stem };
        format!("{stem}{}", self.extension)
    }
}

/// Errors from the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported media type: {0}")]
    Unsupported(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Could not encode image: {0}")]
    Encode(String),

    #[error("Image conversion failed: {0}")]
    ImageConversion(#[source] ConversionError),

    #[error("Video format not supported by web browsers and transcoding failed: {0}")]
    Transcode(#[source] ConversionError),

    #[error("Scratch file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media processing task failed: {0}")]
    Task(String),
}

impl MediaError {
    /// Whether the failure is the uploader's fault (unsupported or broken
    /// input) rather than an environment or infrastructure problem.
    pub fn is_client_error(&self) -> bool {
        match self {
            MediaError::Unsupported(_) | MediaError::Decode(_) => true,
            MediaError::ImageConversion(e) | MediaError::Transcode(e) => !e.is_infrastructure(),
            MediaError::Encode(_) | MediaError::Io(_) | MediaError::Task(_) => false,
        }
    }
}
