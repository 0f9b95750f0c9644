//! In-process still image decode, downscale and re-encode.
//!
//! These functions are CPU bound; callers run them on the blocking pool.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use super::MediaError;

/// Largest width a stored image may have.
pub const MAX_WIDTH: u32 = 1920;
/// Largest height a stored image may have.
pub const MAX_HEIGHT: u32 = 1080;
/// JPEG quality used for every re-encoded image.
pub const JPEG_QUALITY: u8 = 85;

/// Encoding chosen for a compressed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

/// A decoded, bounded and re-encoded image.
#[derive(Debug)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

/// Dimensions that fit `width`×`height` inside `max_width`×`max_height`.
///
/// Returns `None` when the image already fits, so small images are never upscaled.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let new_width = ((f64::from(width) * scale).round() as u32).clamp(1, max_width);
    let new_height = ((f64::from(height) * scale).round() as u32).clamp(1, max_height);
    Some((new_width, new_height))
}

/// Decode `data`, shrink it to fit the stored-image bounds and re-encode it.
///
/// PNG sources stay PNG so transparency survives; everything else becomes a
/// JPEG at [`JPEG_QUALITY`].
pub fn compress(data: &[u8]) -> Result<CompressedImage, MediaError> {
    let source_format = image::guess_format(data).ok();
    let img = image::load_from_memory(data).map_err(|e| MediaError::Decode(e.to_string()))?;

    let img = match fit_within(img.width(), img.height(), MAX_WIDTH, MAX_HEIGHT) {
        Some((w, h)) => img.resize_exact(w, h, FilterType::Lanczos3),
        None => img,
    };

    let format = if source_format == Some(ImageFormat::Png) {
        OutputFormat::Png
    } else {
        OutputFormat::Jpeg
    };

    let data = encode(&img, format)?;
    Ok(CompressedImage {
        data,
        format,
        width: img.width(),
        height: img.height(),
    })
}

fn encode(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, MediaError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
                .encode_image(&rgb)
                .map_err(|e| MediaError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| MediaError::Encode(e.to_string()))?;
        }
    }
    Ok(buf)
}
