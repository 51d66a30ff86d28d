//! Video transcoding backed by the system ffmpeg installation.

mod engine;
mod probe;
mod progress;
mod runtime;

pub use engine::{TranscodeConfig, TranscodeError, TranscodeOutput, TranscoderEngine};
pub use probe::VideoMetadata;
