//! Lectio Media Library
//!
//! In-process media compression for the upload pipeline: a stateless image
//! compressor, a lazily-initialized video transcoder engine, and the facade
//! that dispatches between them by media kind. The facade never fails. On
//! any compression error the original file flows through unchanged.

pub mod facade;
pub mod image;
pub mod transcode;

use std::sync::Arc;

/// Callback invoked with integer percent-complete values (0-100) while a
/// compression operation advances.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

// Re-export commonly used types
pub use facade::{Compress, CompressedMedia, MediaCompressor};
pub use image::{ImageCompressor, ImageCompressorConfig};
pub use transcode::{TranscodeConfig, TranscodeError, TranscodeOutput, TranscoderEngine};
