//! Verified handles to the ffmpeg and ffprobe executables.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::TranscodeError;

/// A pair of ffmpeg/ffprobe binaries that responded to `-version`.
///
/// Construction is the expensive, fallible part of transcoder startup and is
/// deferred until the first transcode request.
#[derive(Debug, Clone)]
pub(crate) struct Runtime {
    pub(crate) ffmpeg: PathBuf,
    pub(crate) ffprobe: PathBuf,
}

impl Runtime {
    pub(crate) async fn load(ffmpeg: &Path, ffprobe: &Path) -> Result<Self, TranscodeError> {
        let ffmpeg_banner = version_banner(ffmpeg).await?;
        version_banner(ffprobe).await?;

        tracing::info!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            version = %ffmpeg_banner,
            "Transcoder runtime initialized"
        );

        Ok(Self {
            ffmpeg: ffmpeg.to_path_buf(),
            ffprobe: ffprobe.to_path_buf(),
        })
    }
}

/// Run `<binary> -version` and return the first line of its output.
async fn version_banner(binary: &Path) -> Result<String, TranscodeError> {
    let output = Command::new(binary)
        .arg("-version")
        .output()
        .await
        .map_err(|e| {
            TranscodeError::Init(format!("failed to launch {}: {e}", binary.display()))
        })?;

    if !output.status.success() {
        return Err(TranscodeError::Init(format!(
            "{} -version exited with {}",
            binary.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().to_string())
}
