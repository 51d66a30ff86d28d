//! Best-effort compression dispatch.
//!
//! Upload orchestration talks to [`Compress`] and never sees codec errors:
//! whatever goes wrong inside a codec, the original file flows through
//! unchanged and the failure is logged.

use std::sync::Arc;

use async_trait::async_trait;

use lectio_core::{MediaFile, MediaKind};

use crate::image::{ImageCompressor, ImageCompressorConfig};
use crate::transcode::{TranscodeError, TranscoderEngine};
use crate::ProgressFn;

/// Outcome of a compression pass.
#[derive(Debug, Clone)]
pub struct CompressedMedia {
    pub file: MediaFile,
    /// Source duration in whole minutes, known only when a video probed
    /// successfully.
    pub duration_minutes: Option<u32>,
}

/// Compression seam between upload orchestration and the codecs.
#[async_trait]
pub trait Compress: Send + Sync {
    /// Compress `file` according to `kind`.
    ///
    /// Infallible by contract: when compression cannot improve on the input
    /// or fails outright, the original file is returned unchanged.
    async fn compress(
        &self,
        file: MediaFile,
        kind: MediaKind,
        on_progress: Option<ProgressFn>,
    ) -> CompressedMedia;
}

/// Production compressor: images go to the in-process encoder on a blocking
/// thread, videos to the shared transcoder engine.
#[derive(Clone)]
pub struct MediaCompressor {
    images: ImageCompressor,
    engine: Arc<TranscoderEngine>,
}

impl MediaCompressor {
    pub fn new(images: ImageCompressor, engine: Arc<TranscoderEngine>) -> Self {
        Self { images, engine }
    }

    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self {
            images: ImageCompressor::new(ImageCompressorConfig::from_config(config)),
            engine: Arc::new(TranscoderEngine::from_config(config)),
        }
    }
}

#[async_trait]
impl Compress for MediaCompressor {
    async fn compress(
        &self,
        file: MediaFile,
        kind: MediaKind,
        on_progress: Option<ProgressFn>,
    ) -> CompressedMedia {
        match kind {
            MediaKind::Image => {
                let compressor = self.images.clone();
                let input = file.clone();
                match tokio::task::spawn_blocking(move || compressor.compress(&input)).await {
                    Ok(output) => CompressedMedia {
                        file: output,
                        duration_minutes: None,
                    },
                    Err(e) => {
                        tracing::error!(
                            file = %file.name,
                            error = %e,
                            "Image compression task failed; using original"
                        );
                        CompressedMedia {
                            file,
                            duration_minutes: None,
                        }
                    }
                }
            }
            MediaKind::Video => match self.engine.transcode(&file, on_progress).await {
                Ok(output) => CompressedMedia {
                    file: output.file,
                    duration_minutes: Some(output.duration_minutes),
                },
                Err(e) => {
                    match e {
                        TranscodeError::Init(_) => tracing::error!(
                            file = %file.name,
                            error = %e,
                            "Transcoder unavailable; storing original video"
                        ),
                        _ => tracing::warn!(
                            file = %file.name,
                            error = %e,
                            "Video transcode failed; storing original video"
                        ),
                    }
                    CompressedMedia {
                        file,
                        duration_minutes: None,
                    }
                }
            },
        }
    }
}
