//! Video metadata extraction via ffprobe.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use super::TranscodeError;

/// Stream and container properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    /// Container duration in seconds.
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs.max(0.0))
    }

    /// Duration rounded up to whole minutes, as stored on lesson records.
    pub fn duration_minutes(&self) -> u32 {
        (self.duration_secs.max(0.0) / 60.0).ceil() as u32
    }
}

/// Probe a video file for duration and dimensions.
pub(crate) async fn probe(ffprobe_path: &Path, video_path: &Path) -> Result<VideoMetadata, TranscodeError> {
    let start = std::time::Instant::now();

    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(video_path)
        .output()
        .await
        .map_err(|e| TranscodeError::Probe(format!("failed to execute ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(TranscodeError::Probe(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let metadata = parse_probe_output(&output.stdout)?;

    tracing::debug!(
        duration_ms = start.elapsed().as_millis() as u64,
        video_duration_secs = metadata.duration_secs,
        width = metadata.width,
        height = metadata.height,
        "Video probe completed"
    );

    Ok(metadata)
}

fn parse_probe_output(stdout: &[u8]) -> Result<VideoMetadata, TranscodeError> {
    let probe_data: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| TranscodeError::Probe(format!("failed to parse ffprobe output: {e}")))?;

    let stream = probe_data["streams"]
        .get(0)
        .ok_or_else(|| TranscodeError::Probe("no video stream found".to_string()))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| TranscodeError::Probe("could not read stream width".to_string()))?
        as u32;

    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| TranscodeError::Probe("could not read stream height".to_string()))?
        as u32;

    // Some containers report duration per stream rather than on the format
    // block, so fall back to the stream value.
    let duration_secs = probe_data["format"]["duration"]
        .as_str()
        .or_else(|| stream["duration"].as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| TranscodeError::Probe("could not read duration".to_string()))?;

    Ok(VideoMetadata {
        duration_secs,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let stdout = br#"{
            "streams": [{"width": 1920, "height": 1080, "codec_name": "h264"}],
            "format": {"duration": "125.500000", "bit_rate": "1200000"}
        }"#;

        let metadata = parse_probe_output(stdout).unwrap();
        assert_eq!(metadata.width, 1920);
        assert_eq!(metadata.height, 1080);
        assert!((metadata.duration_secs - 125.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let stdout = br#"{
            "streams": [{"width": 640, "height": 480, "duration": "30.0"}],
            "format": {}
        }"#;

        let metadata = parse_probe_output(stdout).unwrap();
        assert!((metadata.duration_secs - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_rejects_missing_stream() {
        let stdout = br#"{"streams": [], "format": {"duration": "10.0"}}"#;
        let err = parse_probe_output(stdout).unwrap_err();
        assert!(matches!(err, TranscodeError::Probe(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn test_duration_minutes_rounds_up() {
        let metadata = VideoMetadata {
            duration_secs: 125.5,
            width: 1920,
            height: 1080,
        };
        assert_eq!(metadata.duration_minutes(), 3);

        let exact = VideoMetadata {
            duration_secs: 120.0,
            ..metadata
        };
        assert_eq!(exact.duration_minutes(), 2);

        let short = VideoMetadata {
            duration_secs: 4.2,
            ..metadata
        };
        assert_eq!(short.duration_minutes(), 1);
    }
}
