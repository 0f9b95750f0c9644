//! End-to-end media ingestion.
//!
//! ```text
//! resolve type --> image? --> HEIC? --> converter chain --> decode/resize/encode
//!              |
//!              +-> video? --> browser-compatible? --(no)--> transcode chain
//!                                                 |
//!                                                 +--> thumbnail chain (non-fatal)
//! ```
//!
//! Every external tool run happens inside a per-request scratch directory that
//! is removed when the processing call returns, whichever way it returns.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use super::content_type::{
    extension_for, file_extension, is_browser_compatible_video, is_heif_type,
    resolve_content_type,
};
use super::convert::{heic_chain, ConverterChain};
use super::video::{thumbnail_chain, transcode_chain};
use super::{raster, sniff, MediaAsset, MediaError, MediaKind, ProcessedMedia};

/// Prefix of every scratch directory created by the pipeline.
const SCRATCH_PREFIX: &str = "spartan-media-";

/// Turns uploads into bounded, browser-friendly media.
#[derive(Clone)]
pub struct MediaPipeline {
    scratch_root: PathBuf,
    tool_timeout: Duration,
    heic: ConverterChain,
    transcode: ConverterChain,
    thumbnail: ConverterChain,
}

impl MediaPipeline {
    /// Pipeline using the installed ImageMagick, libheif and FFmpeg tools.
    pub fn new(scratch_root: PathBuf, tool_timeout: Duration) -> Self {
        Self::with_chains(
            scratch_root,
            tool_timeout,
            heic_chain(),
            transcode_chain(),
            thumbnail_chain(),
        )
    }

    /// Pipeline with explicit converter chains.
    pub fn with_chains(
        scratch_root: PathBuf,
        tool_timeout: Duration,
        heic: ConverterChain,
        transcode: ConverterChain,
        thumbnail: ConverterChain,
    ) -> Self {
        Self {
            scratch_root,
            tool_timeout,
            heic,
            transcode,
            thumbnail,
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Run an upload through the pipeline.
    pub async fn process(&self, asset: MediaAsset) -> Result<ProcessedMedia, MediaError> {
        let content_type = resolve_content_type(asset.content_type.as_deref(), &asset.filename);
        let kind = MediaKind::from_content_type(&content_type)
            .ok_or_else(|| MediaError::Unsupported(content_type.clone()))?;

        tracing::debug!(
            content_type = %content_type,
            kind = kind.as_str(),
            size = asset.data.len(),
            "Processing upload"
        );

        match kind {
            MediaKind::Image => self.process_image(asset.data, &content_type).await,
            MediaKind::Video => {
                self.process_video(asset.data, &content_type, &asset.filename)
                    .await
            }
        }
    }

    async fn process_image(
        &self,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<ProcessedMedia, MediaError> {
        let data = if is_heif_type(content_type) || sniff::is_heic(&data) {
            self.convert_heic(&data).await?
        } else {
            data
        };

        let compressed = tokio::task::spawn_blocking(move || raster::compress(&data))
            .await
            .map_err(|e| MediaError::Task(e.to_string()))??;

        let content_type = compressed.format.content_type();
        Ok(ProcessedMedia {
            kind: MediaKind::Image,
            data: compressed.data,
            content_type: content_type.to_string(),
            extension: extension_for(content_type),
            thumbnail: None,
        })
    }

    async fn convert_heic(&self, data: &[u8]) -> Result<Vec<u8>, MediaError> {
        let scratch = self.scratch_dir().await?;
        let input = scratch.path().join("input.heic");
        let output = scratch.path().join("output.jpg");
        tokio::fs::write(&input, data).await?;

        let converter = self
            .heic
            .run(&input, &output, self.tool_timeout)
            .await
            .map_err(MediaError::ImageConversion)?;
        tracing::info!(converter, "Converted HEIC image to JPEG");

        Ok(tokio::fs::read(&output).await?)
    }

    async fn process_video(
        &self,
        data: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<ProcessedMedia, MediaError> {
        let scratch = self.scratch_dir().await?;
        let ext = file_extension(filename)
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| extension_for(content_type).to_string());
        let input = scratch.path().join(format!("input{ext}"));
        tokio::fs::write(&input, &data).await?;

        let (video_path, content_type, data) = if is_browser_compatible_video(content_type) {
            (input, content_type.to_string(), data)
        } else {
            let output = scratch.path().join("output.mp4");
            let converter = self
                .transcode
                .run(&input, &output, self.tool_timeout)
                .await
                .map_err(MediaError::Transcode)?;
            tracing::info!(converter, from = %content_type, "Transcoded video to MP4");
            let transcoded = tokio::fs::read(&output).await?;
            (output, "video/mp4".to_string(), transcoded)
        };

        let thumbnail = self.extract_thumbnail(&video_path, scratch.path()).await;

        Ok(ProcessedMedia {
            kind: MediaKind::Video,
            extension: extension_for(&content_type),
            data,
            content_type,
            thumbnail,
        })
    }

    /// Best effort: failures are logged and yield `None`.
    async fn extract_thumbnail(&self, video: &Path, scratch: &Path) -> Option<Vec<u8>> {
        let output = scratch.join("thumbnail.jpg");
        if let Err(e) = self.thumbnail.run(video, &output, self.tool_timeout).await {
            tracing::warn!(error = %e, "Thumbnail extraction failed, continuing without thumbnail");
            return None;
        }
        match tokio::fs::read(&output).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read extracted thumbnail");
                None
            }
        }
    }

    async fn scratch_dir(&self) -> Result<TempDir, MediaError> {
        tokio::fs::create_dir_all(&self.scratch_root).await?;
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.scratch_root)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    use assert_matches::assert_matches;
    use image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;
    use crate::media::convert::fakes::{Failing, WriteBytes};
    use crate::media::SharedConverter;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        buf
    }

    fn heic_header() -> Vec<u8> {
        let mut data = vec![0, 0, 0, 0x18];
        data.extend_from_slice(b"ftypheic");
        data.extend_from_slice(&[0; 32]);
        data
    }

    fn chain(converters: Vec<SharedConverter>) -> ConverterChain {
        ConverterChain::new(converters)
    }

    fn pipeline(
        root: &Path,
        heic: ConverterChain,
        transcode: ConverterChain,
        thumbnail: ConverterChain,
    ) -> MediaPipeline {
        MediaPipeline::with_chains(root.to_path_buf(), TIMEOUT, heic, transcode, thumbnail)
    }

    fn scratch_entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn heic_upload_becomes_bounded_jpeg() {
        let root = tempfile::tempdir().unwrap();
        let converted = WriteBytes::new("heif-convert", jpeg(4032, 3024));
        let p = pipeline(
            root.path(),
            chain(vec![Failing::missing("convert") as SharedConverter, converted.clone()]),
            ConverterChain::default(),
            ConverterChain::default(),
        );

        let out = p
            .process(MediaAsset {
                data: heic_header(),
                content_type: Some("image/heic".into()),
                filename: "IMG_0001.HEIC".into(),
            })
            .await
            .unwrap();

        assert_eq!(out.kind, MediaKind::Image);
        assert_eq!(out.content_type, "image/jpeg");
        assert_eq!(out.extension, ".jpg");
        assert_eq!(converted.calls.load(Ordering::SeqCst), 1);

        let decoded = image::load_from_memory(&out.data).unwrap();
        assert!(decoded.width() <= raster::MAX_WIDTH);
        assert!(decoded.height() <= raster::MAX_HEIGHT);
        assert_eq!((decoded.width(), decoded.height()), (1440, 1080));
        assert_eq!(scratch_entries(root.path()), 0, "scratch dir must be removed");
    }

    #[tokio::test]
    async fn sniffed_heic_with_generic_type_is_converted() {
        let root = tempfile::tempdir().unwrap();
        let converted = WriteBytes::new("convert", jpeg(100, 100));
        let p = pipeline(
            root.path(),
            chain(vec![converted.clone() as SharedConverter]),
            ConverterChain::default(),
            ConverterChain::default(),
        );

        let out = p
            .process(MediaAsset {
                data: heic_header(),
                content_type: Some("image/jpeg".into()),
                filename: "photo.jpg".into(),
            })
            .await
            .unwrap();

        assert_eq!(out.content_type, "image/jpeg");
        assert_eq!(converted.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_heic_chain_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(
            root.path(),
            chain(vec![
                Failing::rejecting("convert") as SharedConverter,
                Failing::rejecting("heif-convert"),
                Failing::rejecting("ffmpeg"),
            ]),
            ConverterChain::default(),
            ConverterChain::default(),
        );

        let err = p
            .process(MediaAsset {
                data: heic_header(),
                content_type: None,
                filename: "broken.heic".into(),
            })
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_matches!(err, MediaError::ImageConversion(_));
        assert_eq!(scratch_entries(root.path()), 0, "scratch dir must be removed");
    }

    #[tokio::test]
    async fn unknown_type_is_unsupported() {
        let root = tempfile::tempdir().unwrap();
        let p = MediaPipeline::new(root.path().to_path_buf(), TIMEOUT);

        let err = p
            .process(MediaAsset {
                data: b"%PDF-1.7".to_vec(),
                content_type: Some("application/pdf".into()),
                filename: "doc.pdf".into(),
            })
            .await
            .unwrap_err();

        assert_matches!(err, MediaError::Unsupported(ref ct) if ct == "application/pdf");
    }

    #[tokio::test]
    async fn compatible_video_passes_through_with_thumbnail() {
        let root = tempfile::tempdir().unwrap();
        let transcoder = WriteBytes::new("ffmpeg-h264", b"transcoded".to_vec());
        let p = pipeline(
            root.path(),
            ConverterChain::default(),
            chain(vec![transcoder.clone() as SharedConverter]),
            chain(vec![WriteBytes::new("ffmpeg-frame", b"thumb".to_vec()) as SharedConverter]),
        );

        let out = p
            .process(MediaAsset {
                data: b"mp4 bytes".to_vec(),
                content_type: Some("video/mp4".into()),
                filename: "clip.mp4".into(),
            })
            .await
            .unwrap();

        assert_eq!(out.kind, MediaKind::Video);
        assert_eq!(out.content_type, "video/mp4");
        assert_eq!(out.data, b"mp4 bytes");
        assert_eq!(out.thumbnail.as_deref(), Some(&b"thumb"[..]));
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn quicktime_is_transcoded_to_mp4() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(
            root.path(),
            ConverterChain::default(),
            chain(vec![WriteBytes::new("ffmpeg-h264", b"h264".to_vec()) as SharedConverter]),
            chain(vec![WriteBytes::new("ffmpeg-frame", b"thumb".to_vec()) as SharedConverter]),
        );

        let out = p
            .process(MediaAsset {
                data: b"mov bytes".to_vec(),
                content_type: Some("application/octet-stream".into()),
                filename: "clip.MOV".into(),
            })
            .await
            .unwrap();

        assert_eq!(out.content_type, "video/mp4");
        assert_eq!(out.extension, ".mp4");
        assert_eq!(out.data, b"h264");
        assert_eq!(out.file_name("clip.MOV"), "clip.mp4");
    }

    #[tokio::test]
    async fn failed_transcode_is_terminal() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(
            root.path(),
            ConverterChain::default(),
            chain(vec![Failing::rejecting("ffmpeg-h264") as SharedConverter]),
            chain(vec![WriteBytes::new("ffmpeg-frame", b"thumb".to_vec()) as SharedConverter]),
        );

        let err = p
            .process(MediaAsset {
                data: b"avi bytes".to_vec(),
                content_type: Some("video/x-msvideo".into()),
                filename: "clip.avi".into(),
            })
            .await
            .unwrap_err();

        assert_matches!(err, MediaError::Transcode(_));
        assert_eq!(scratch_entries(root.path()), 0, "scratch dir must be removed");
    }

    #[tokio::test]
    async fn thumbnail_failure_is_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        let p = pipeline(
            root.path(),
            ConverterChain::default(),
            ConverterChain::default(),
            chain(vec![Failing::missing("ffmpeg-frame") as SharedConverter]),
        );

        let out = p
            .process(MediaAsset {
                data: b"webm bytes".to_vec(),
                content_type: Some("video/webm".into()),
                filename: "clip.webm".into(),
            })
            .await
            .unwrap();

        assert_eq!(out.content_type, "video/webm");
        assert!(out.thumbnail.is_none());
    }
}
