//! Pluggable external converters and the ordered fallback chain that runs them.
//!
//! A [`ConverterChain`] tries each [`MediaConverter`] in turn. The first one
//! that leaves a non-empty output file wins; every failure along the way is
//! recorded so the final error explains what was tried.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::tool::{run_tool, ToolError};

/// One external conversion step from an input file to an output file.
#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Convert `input` into `output`, giving up after `timeout`.
    async fn convert(&self, input: &Path, output: &Path, timeout: Duration)
        -> Result<(), ToolError>;
}

/// A failed attempt recorded by [`ConverterChain::run`].
#[derive(Debug)]
pub struct ConversionAttempt {
    pub converter: &'static str,
    pub error: ToolError,
}

impl fmt::Display for ConversionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.converter, self.error)
    }
}

/// Error returned when no converter in a chain succeeded.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("no converters configured")]
    Empty,

    #[error("all converters failed: {}", format_attempts(.attempts))]
    Exhausted { attempts: Vec<ConversionAttempt> },
}

impl ConversionError {
    /// True when every attempt failed for environmental reasons, meaning the
    /// input itself was never really judged.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            ConversionError::Empty => true,
            ConversionError::Exhausted { attempts } => {
                attempts.iter().all(|a| a.error.is_infrastructure())
            }
        }
    }
}

fn format_attempts(attempts: &[ConversionAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shared handle to a converter.
pub type SharedConverter = Arc<dyn MediaConverter>;

/// Ordered list of converters tried until one succeeds.
#[derive(Clone, Default)]
pub struct ConverterChain {
    converters: Vec<SharedConverter>,
}

impl ConverterChain {
    pub fn new(converters: Vec<SharedConverter>) -> Self {
        Self { converters }
    }

    /// Names of the converters in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Run the chain, returning the name of the converter that succeeded.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        timeout: Duration,
    ) -> Result<&'static str, ConversionError> {
        if self.converters.is_empty() {
            return Err(ConversionError::Empty);
        }

        let mut attempts = Vec::with_capacity(self.converters.len());
        for converter in &self.converters {
            let name = converter.name();

            // A failed predecessor may have left a partial file behind.
            let _ = tokio::fs::remove_file(output).await;

            let result = match converter.convert(input, output, timeout).await {
                Ok(()) => ensure_output(name, output).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    tracing::debug!(converter = name, "Conversion succeeded");
                    return Ok(name);
                }
                Err(error) => {
                    tracing::warn!(converter = name, error = %error, "Converter failed, trying next");
                    attempts.push(ConversionAttempt {
                        converter: name,
                        error,
                    });
                }
            }
        }

        Err(ConversionError::Exhausted { attempts })
    }
}

async fn ensure_output(program: &str, output: &Path) -> Result<(), ToolError> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(ToolError::MissingOutput {
            program: program.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::MissingOutput {
            program: program.to_string(),
        }),
        Err(e) => Err(ToolError::Io(e)),
    }
}

// ---------------------------------------------------------------------------
// HEIC/HEIF to JPEG converters
// ---------------------------------------------------------------------------

/// ImageMagick: `convert input output.jpg`.
pub struct ImageMagickConverter;

#[async_trait]
impl MediaConverter for ImageMagickConverter {
    fn name(&self) -> &'static str {
        "convert"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        run_tool("convert", [input.as_os_str(), output.as_os_str()], timeout).await
    }
}

/// libheif: `heif-convert -q 85 input output.jpg`.
pub struct HeifConvertConverter;

#[async_trait]
impl MediaConverter for HeifConvertConverter {
    fn name(&self) -> &'static str {
        "heif-convert"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        let quality = super::raster::JPEG_QUALITY.to_string();
        let args = [
            OsStr::new("-q"),
            OsStr::new(&quality),
            input.as_os_str(),
            output.as_os_str(),
        ];
        run_tool("heif-convert", args, timeout).await
    }
}

/// FFmpeg as a last resort for stills: `ffmpeg -y -i input -q:v 2 output.jpg`.
pub struct FfmpegStillConverter;

#[async_trait]
impl MediaConverter for FfmpegStillConverter {
    fn name(&self) -> &'static str {
        "ffmpeg"
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
            OsStr::new("-q:v"),
            OsStr::new("2"),
            output.as_os_str(),
        ];
        run_tool("ffmpeg", args, timeout).await
    }
}

/// The default HEIC chain: ImageMagick, then libheif, then FFmpeg.
pub fn heic_chain() -> ConverterChain {
    ConverterChain::new(vec![
        Arc::new(ImageMagickConverter) as SharedConverter,
        Arc::new(HeifConvertConverter),
        Arc::new(FfmpegStillConverter),
    ])
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Converters that never spawn a process.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Writes fixed bytes to the output path.
    pub struct WriteBytes {
        pub name: &'static str,
        pub bytes: Vec<u8>,
        pub calls: AtomicUsize,
    }

    impl WriteBytes {
        pub fn new(name: &'static str, bytes: Vec<u8>) -> Arc<Self> {
            Arc::new(Self {
                name,
                bytes,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MediaConverter for WriteBytes {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn convert(
            &self,
            _input: &Path,
            output: &Path,
            _timeout: Duration,
        ) -> Result<(), ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(output, &self.bytes).await?;
            Ok(())
        }
    }

    /// Always fails as if the binary were missing or the input were rejected.
    pub struct Failing {
        pub name: &'static str,
        pub missing: bool,
        pub calls: AtomicUsize,
    }

    impl Failing {
        pub fn missing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                missing: true,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn rejecting(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                missing: false,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MediaConverter for Failing {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn convert(
            &self,
            _input: &Path,
            _output: &Path,
            _timeout: Duration,
        ) -> Result<(), ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.missing {
                Err(ToolError::NotFound {
                    program: self.name.to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            } else {
                Err(ToolError::ExecutionFailed {
                    program: self.name.to_string(),
                    exit_code: Some(1),
                    stderr: "unsupported input".to_string(),
                })
            }
        }
    }
}
