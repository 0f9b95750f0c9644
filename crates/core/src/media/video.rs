//! FFmpeg converters for the video branch: web transcoding and thumbnails.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::convert::{ConverterChain, MediaConverter, SharedConverter};
use crate::tool::{run_tool, ToolError};

/// Scale filter that caps output at 1920x1080 and keeps even dimensions,
/// which libx264 requires.
const SCALE_FILTER: &str = "scale=trunc(min(1920\\,iw)/2)*2:trunc(min(1080\\,ih)/2)*2";

/// Re-encode any FFmpeg-readable video as H.264/AAC MP4 with the moov atom up
/// front so playback can start before the download finishes.
pub struct FfmpegWebTranscoder;

#[async_trait]
impl MediaConverter for FfmpegWebTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg-h264"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        let args = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c:v"),
            OsStr::new("libx264"),
            OsStr::new("-crf"),
            OsStr::new("23"),
            OsStr::new("-preset"),
            OsStr::new("medium"),
            OsStr::new("-c:a"),
            OsStr::new("aac"),
            OsStr::new("-b:a"),
            OsStr::new("128k"),
            OsStr::new("-movflags"),
            OsStr::new("+faststart"),
            OsStr::new("-vf"),
            OsStr::new(SCALE_FILTER),
            output.as_os_str(),
        ];
        run_tool("ffmpeg", args, timeout).await
    }
}

/// Grab one frame at `offset_secs` as a JPEG.
pub struct FfmpegThumbnailer {
    pub offset_secs: u32,
}

#[async_trait]
impl MediaConverter for FfmpegThumbnailer {
    fn name(&self) -> &'static str {
        if self.offset_secs == 0 {
            "ffmpeg-first-frame"
        } else {
            "ffmpeg-frame"
        }
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        let offset = self.offset_secs.to_string();
        // Seeking before -i is fast; clips shorter than the offset produce no frame.
        let args = [
            OsStr::new("-y"),
            OsStr::new("-ss"),
            OsStr::new(&offset),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-vframes"),
            OsStr::new("1"),
            OsStr::new("-f"),
            OsStr::new("image2"),
            output.as_os_str(),
        ];
        run_tool("ffmpeg", args, timeout).await
    }
}

/// The default transcoding chain for browser-incompatible uploads.
pub fn transcode_chain() -> ConverterChain {
    ConverterChain::new(vec![Arc::new(FfmpegWebTranscoder) as SharedConverter])
}

/// The default thumbnail chain: the frame at one second, then the first frame
/// for clips shorter than that.
pub fn thumbnail_chain() -> ConverterChain {
    ConverterChain::new(vec![
        Arc::new(FfmpegThumbnailer { offset_secs: 1 }) as SharedConverter,
        Arc::new(FfmpegThumbnailer { offset_secs: 0 }),
    ])
}
