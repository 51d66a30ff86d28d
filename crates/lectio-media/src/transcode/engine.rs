//! H.264 transcoding engine.
//!
//! Wraps the system ffmpeg installation behind a lazily initialized runtime
//! and a fixed number of encode slots. Binary verification happens on the
//! first transcode, not at construction, and a failed verification is retried
//! on the next request.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{OnceCell, Semaphore};

use lectio_core::MediaFile;

use super::probe;
use super::progress::{parse_line, PercentTracker, ProgressEvent};
use super::runtime::Runtime;
use crate::ProgressFn;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Transcoder initialization failed: {0}")]
    Init(String),

    #[error("Video probe failed: {0}")]
    Probe(String),

    #[error("Video encode failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoder invocation parameters.
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Cap on the larger output dimension. Smaller inputs pass through at
    /// their native resolution.
    pub max_dimension_px: u32,
    pub crf: u8,
    pub preset: String,
    pub tune: String,
    pub max_concurrent_transcodes: usize,
}

impl TranscodeConfig {
    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self {
            ffmpeg_path: PathBuf::from(&config.ffmpeg_path),
            ffprobe_path: PathBuf::from(&config.ffprobe_path),
            max_dimension_px: config.max_video_dimension_px,
            crf: config.video_crf,
            preset: config.video_preset.clone(),
            tune: config.video_tune.clone(),
            max_concurrent_transcodes: config.max_concurrent_transcodes,
        }
    }
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self::from_config(&lectio_core::Config::default())
    }
}

/// Result of a successful transcode.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    /// The encoded MP4, named `<input stem>_compressed.mp4`.
    pub file: MediaFile,
    /// Source duration rounded up to whole minutes.
    pub duration_minutes: u32,
}

/// Process-wide video transcoder.
///
/// Concurrent requests queue on a FIFO semaphore so at most
/// `max_concurrent_transcodes` encodes run at once. Intended to be shared
/// behind an `Arc`.
pub struct TranscoderEngine {
    config: TranscodeConfig,
    runtime: OnceCell<Runtime>,
    slots: Semaphore,
}

impl TranscoderEngine {
    pub fn new(config: TranscodeConfig) -> Self {
        let slots = Semaphore::new(config.max_concurrent_transcodes.max(1));
        Self {
            config,
            runtime: OnceCell::new(),
            slots,
        }
    }

    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self::new(TranscodeConfig::from_config(config))
    }

    /// Re-encode a video file to H.264 MP4.
    ///
    /// Reported progress is monotonically non-decreasing and reaches 100 only
    /// on success.
    pub async fn transcode(
        &self,
        file: &MediaFile,
        on_progress: Option<ProgressFn>,
    ) -> Result<TranscodeOutput, TranscodeError> {
        let queued = Instant::now();
        let _permit = self
            .slots
            .acquire()
            .await
            .map_err(|_| TranscodeError::Encode("transcode queue closed".to_string()))?;

        let runtime = self
            .runtime
            .get_or_try_init(|| Runtime::load(&self.config.ffmpeg_path, &self.config.ffprobe_path))
            .await?;

        let start = Instant::now();
        tracing::info!(
            input = %file.name,
            input_bytes = file.len(),
            queued_ms = queued.elapsed().as_millis() as u64,
            "Starting video transcode"
        );

        // Scratch space scoped to this transcode. Dropping it removes the
        // intermediate files even on error paths.
        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join(input_file_name(file));
        tokio::fs::write(&input_path, &file.data).await?;

        let metadata = probe::probe(&runtime.ffprobe, &input_path).await?;
        let downscale = plan_downscale(metadata.width, metadata.height, self.config.max_dimension_px);

        tracing::debug!(
            width = metadata.width,
            height = metadata.height,
            video_duration_secs = metadata.duration_secs,
            target = ?downscale,
            "Planned encode"
        );

        let output_path = scratch.path().join("output.mp4");
        let args = self.build_encode_args(&input_path, &output_path, downscale);

        self.run_encode(&runtime.ffmpeg, &args, metadata.duration(), on_progress)
            .await?;

        let data = tokio::fs::read(&output_path).await?;
        let output_name = format!("{}_compressed.mp4", file.stem());

        tracing::info!(
            input = %file.name,
            output = %output_name,
            input_bytes = file.len(),
            output_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Video transcode completed"
        );

        Ok(TranscodeOutput {
            file: MediaFile::new(output_name, "video/mp4", data),
            duration_minutes: metadata.duration_minutes(),
        })
    }

    fn build_encode_args(
        &self,
        input: &Path,
        output: &Path,
        downscale: Option<(u32, u32)>,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-nostats".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
        ];

        if let Some((width, height)) = downscale {
            args.extend_from_slice(&["-vf".to_string(), format!("scale={}:{}", width, height)]);
        }

        args.extend_from_slice(&[
            "-c:v".to_string(),
            "libx264".to_string(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-tune".to_string(),
            self.config.tune.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }

    async fn run_encode(
        &self,
        ffmpeg: &Path,
        args: &[String],
        total_duration: std::time::Duration,
        on_progress: Option<ProgressFn>,
    ) -> Result<(), TranscodeError> {
        let mut child = Command::new(ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranscodeError::Encode(format!("failed to launch ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TranscodeError::Encode("ffmpeg stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::Encode("ffmpeg stderr unavailable".to_string()))?;

        // Drain stderr concurrently so a chatty encoder cannot fill the pipe
        // and stall itself while we read progress from stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let mut tracker = PercentTracker::new(total_duration);
        let reader = BufReader::new(stdout);
        if let Err(e) = pump_progress(reader, &mut tracker, on_progress.as_ref()).await {
            // A dead progress stream leaves the encode unsupervised; kill and
            // reap it before surfacing the error.
            let _ = child.kill().await;
            return Err(TranscodeError::Io(e));
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(TranscodeError::Encode(format!(
                "ffmpeg exited with {}: {}",
                status,
                error_tail(&stderr_output)
            )));
        }

        if let Some(pct) = tracker.finish() {
            if let Some(callback) = on_progress.as_ref() {
                callback(pct);
            }
        }

        Ok(())
    }
}

/// Forward percentages from the `-progress` stream until it closes or the
/// encoder reports `progress=end`.
async fn pump_progress<R>(
    stdout: R,
    tracker: &mut PercentTracker,
    on_progress: Option<&ProgressFn>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = stdout.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some(ProgressEvent::OutTime(position)) => {
                if let Some(pct) = tracker.observe(position) {
                    if let Some(callback) = on_progress {
                        callback(pct);
                    }
                }
            }
            Some(ProgressEvent::End) => break,
            None => {}
        }
    }
    Ok(())
}

/// Scratch file name for the input payload, keeping the original extension so
/// ffmpeg can use it as a container hint.
fn input_file_name(file: &MediaFile) -> String {
    let ext = file
        .extension()
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp4".to_string());
    format!("input.{ext}")
}

/// Compute even output dimensions capped at `cap` on the larger side, or
/// `None` when the input already fits. Never upscales.
fn plan_downscale(width: u32, height: u32, cap: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let larger = width.max(height);
    if larger <= cap {
        return None;
    }

    let scale = cap as f64 / larger as f64;
    let (w, h) = if width >= height {
        (cap, (height as f64 * scale).round() as u32)
    } else {
        ((width as f64 * scale).round() as u32, cap)
    };

    Some((round_even(w), round_even(h)))
}

/// x264 requires even dimensions for 4:2:0 output.
fn round_even(value: u32) -> u32 {
    let value = value.max(2);
    value - value % 2
}

/// Last few stderr lines, for bounded error messages.
fn error_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "no error output".to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_plan_downscale_landscape() {
        assert_eq!(plan_downscale(1920, 1080, 1280), Some((1280, 720)));
        assert_eq!(plan_downscale(3840, 2160, 1280), Some((1280, 720)));
    }

    #[test]
    fn test_plan_downscale_portrait() {
        assert_eq!(plan_downscale(720, 1920, 1280), Some((480, 1280)));
        assert_eq!(plan_downscale(1080, 1920, 1280), Some((720, 1280)));
    }

    #[test]
    fn test_plan_downscale_skips_small_inputs() {
        assert_eq!(plan_downscale(1280, 720, 1280), None);
        assert_eq!(plan_downscale(640, 480, 1280), None);
        assert_eq!(plan_downscale(0, 0, 1280), None);
    }

    #[test]
    fn test_plan_downscale_rounds_to_even() {
        // 1279x853 scaled to cap 639 would give 639x426.2.
        let (w, h) = plan_downscale(1279, 853, 639).unwrap();
        assert_eq!(w % 2, 0);
        assert_eq!(h % 2, 0);
    }

    #[test]
    fn test_encode_args_include_codec_settings() {
        let engine = TranscoderEngine::new(TranscodeConfig::default());
        let args = engine.build_encode_args(
            Path::new("/tmp/in.mov"),
            Path::new("/tmp/out.mp4"),
            Some((1280, 720)),
        );

        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-crf 32"));
        assert!(joined.contains("-preset ultrafast"));
        assert!(joined.contains("-tune fastdecode"));
        assert!(joined.contains("-movflags +faststart"));
        assert!(joined.contains("-vf scale=1280:720"));
        assert!(joined.contains("-progress pipe:1"));
    }

    #[test]
    fn test_encode_args_omit_scale_when_within_cap() {
        let engine = TranscoderEngine::new(TranscodeConfig::default());
        let args = engine.build_encode_args(Path::new("/tmp/in.mp4"), Path::new("/tmp/out.mp4"), None);
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_input_file_name_keeps_safe_extension() {
        let file = MediaFile::new("talk.MOV", "video/quicktime", Bytes::from_static(b"x"));
        assert_eq!(input_file_name(&file), "input.mov");

        let odd = MediaFile::new("talk.m p4", "video/mp4", Bytes::from_static(b"x"));
        assert_eq!(input_file_name(&odd), "input.mp4");

        let bare = MediaFile::new("talk", "video/mp4", Bytes::from_static(b"x"));
        assert_eq!(input_file_name(&bare), "input.mp4");
    }

    #[tokio::test]
    async fn test_pump_progress_ignores_lines_after_end_marker() {
        let stream: &[u8] =
            b"out_time_us=30000000\nprogress=continue\nprogress=end\nout_time_us=60000000\n";
        let mut tracker = PercentTracker::new(Duration::from_secs(60));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressFn = Arc::new(move |pct| sink.lock().unwrap().push(pct));

        pump_progress(stream, &mut tracker, Some(&callback))
            .await
            .unwrap();

        // The 60s update sits after progress=end and must never be observed.
        assert_eq!(*seen.lock().unwrap(), vec![50]);
    }

    #[tokio::test]
    async fn test_pump_progress_surfaces_read_errors() {
        let stdout = tokio_test::io::Builder::new()
            .read(b"out_time_us=30000000\n")
            .read_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "progress pipe closed",
            ))
            .build();

        let mut tracker = PercentTracker::new(Duration::from_secs(60));
        let err = pump_progress(BufReader::new(stdout), &mut tracker, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_transcode_fails_with_missing_binaries() {
        let engine = TranscoderEngine::new(TranscodeConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe_path: PathBuf::from("/nonexistent/ffprobe"),
            ..TranscodeConfig::default()
        });

        let file = MediaFile::new("talk.mp4", "video/mp4", Bytes::from_static(b"not a video"));
        let err = engine.transcode(&file, None).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Init(_)));

        // Initialization is retried, not latched, so the second call sees the
        // same failure rather than a poisoned state.
        let err = engine.transcode(&file, None).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Init(_)));
    }
}
