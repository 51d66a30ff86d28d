//! Configuration module
//!
//! Environment-driven settings for the upload pipeline: image compression
//! ceilings, transcoder invocation parameters, storage key prefixes, and
//! registry eviction timing. Every knob has a sane default so `from_env()`
//! succeeds on an empty environment.

use std::env;
use std::time::Duration;

// Defaults
const MAX_IMAGE_SIZE_MB: usize = 1;
const MAX_IMAGE_DIMENSION_PX: u32 = 1920;
const MAX_VIDEO_DIMENSION_PX: u32 = 1280;
const VIDEO_CRF: u8 = 32;
const VIDEO_PRESET: &str = "ultrafast";
const VIDEO_TUNE: &str = "fastdecode";
const MAX_CONCURRENT_TRANSCODES: usize = 1;
const MEDIA_KEY_PREFIX: &str = "lessons";
const COMPANION_KEY_PREFIX: &str = "materials";
const EVICT_COMPLETED_AFTER_SECS: u64 = 5;
const DEFAULT_INSTRUCTOR: &str = "Admin";

const KNOWN_PRESETS: [&str; 9] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

const KNOWN_TUNES: [&str; 8] = [
    "film",
    "animation",
    "grain",
    "stillimage",
    "psnr",
    "ssim",
    "fastdecode",
    "zerolatency",
];

/// Application configuration for the upload pipeline.
#[derive(Clone, Debug)]
pub struct Config {
    // Image compression
    pub max_image_size_mb: usize,
    pub max_image_dimension_px: u32,
    // Video transcoding
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_video_dimension_px: u32,
    pub video_crf: u8,
    pub video_preset: String,
    pub video_tune: String,
    pub max_concurrent_transcodes: usize,
    // Upload pipeline
    pub media_key_prefix: String,
    pub companion_key_prefix: String,
    pub evict_completed_after_secs: u64,
    pub default_instructor: String,
    // Local storage backend
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            max_image_size_mb: env::var("MAX_IMAGE_SIZE_MB")
                .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_SIZE_MB),
            max_image_dimension_px: env::var("MAX_IMAGE_DIMENSION_PX")
                .unwrap_or_else(|_| MAX_IMAGE_DIMENSION_PX.to_string())
                .parse()
                .unwrap_or(MAX_IMAGE_DIMENSION_PX),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            max_video_dimension_px: env::var("MAX_VIDEO_DIMENSION_PX")
                .unwrap_or_else(|_| MAX_VIDEO_DIMENSION_PX.to_string())
                .parse()
                .unwrap_or(MAX_VIDEO_DIMENSION_PX),
            video_crf: env::var("VIDEO_CRF")
                .unwrap_or_else(|_| VIDEO_CRF.to_string())
                .parse()
                .unwrap_or(VIDEO_CRF),
            video_preset: env::var("VIDEO_PRESET").unwrap_or_else(|_| VIDEO_PRESET.to_string()),
            video_tune: env::var("VIDEO_TUNE").unwrap_or_else(|_| VIDEO_TUNE.to_string()),
            max_concurrent_transcodes: env::var("MAX_CONCURRENT_TRANSCODES")
                .unwrap_or_else(|_| MAX_CONCURRENT_TRANSCODES.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_TRANSCODES),
            media_key_prefix: env::var("MEDIA_KEY_PREFIX")
                .unwrap_or_else(|_| MEDIA_KEY_PREFIX.to_string()),
            companion_key_prefix: env::var("COMPANION_KEY_PREFIX")
                .unwrap_or_else(|_| COMPANION_KEY_PREFIX.to_string()),
            evict_completed_after_secs: env::var("UPLOAD_EVICT_SECS")
                .unwrap_or_else(|_| EVICT_COMPLETED_AFTER_SECS.to_string())
                .parse()
                .unwrap_or(EVICT_COMPLETED_AFTER_SECS),
            default_instructor: env::var("DEFAULT_INSTRUCTOR")
                .unwrap_or_else(|_| DEFAULT_INSTRUCTOR.to_string()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_image_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be at least 1"));
        }
        if self.max_image_dimension_px == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_DIMENSION_PX must be at least 1"));
        }
        if self.max_video_dimension_px == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_DIMENSION_PX must be at least 1"));
        }
        if self.video_crf > 51 {
            return Err(anyhow::anyhow!("VIDEO_CRF must be in the range 0-51"));
        }
        if !KNOWN_PRESETS.contains(&self.video_preset.as_str()) {
            return Err(anyhow::anyhow!(
                "VIDEO_PRESET '{}' is not a known x264 preset",
                self.video_preset
            ));
        }
        if !KNOWN_TUNES.contains(&self.video_tune.as_str()) {
            return Err(anyhow::anyhow!(
                "VIDEO_TUNE '{}' is not a known x264 tune",
                self.video_tune
            ));
        }
        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be at least 1"
            ));
        }
        for (name, prefix) in [
            ("MEDIA_KEY_PREFIX", &self.media_key_prefix),
            ("COMPANION_KEY_PREFIX", &self.companion_key_prefix),
        ] {
            if prefix.is_empty() || prefix.contains('/') {
                return Err(anyhow::anyhow!(
                    "{} must be a non-empty path segment without '/'",
                    name
                ));
            }
        }
        Ok(())
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.max_image_size_mb * 1024 * 1024
    }

    pub fn evict_completed_after(&self) -> Duration {
        Duration::from_secs(self.evict_completed_after_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_image_size_mb: MAX_IMAGE_SIZE_MB,
            max_image_dimension_px: MAX_IMAGE_DIMENSION_PX,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            max_video_dimension_px: MAX_VIDEO_DIMENSION_PX,
            video_crf: VIDEO_CRF,
            video_preset: VIDEO_PRESET.to_string(),
            video_tune: VIDEO_TUNE.to_string(),
            max_concurrent_transcodes: MAX_CONCURRENT_TRANSCODES,
            media_key_prefix: MEDIA_KEY_PREFIX.to_string(),
            companion_key_prefix: COMPANION_KEY_PREFIX.to_string(),
            evict_completed_after_secs: EVICT_COMPLETED_AFTER_SECS,
            default_instructor: DEFAULT_INSTRUCTOR.to_string(),
            local_storage_path: None,
            local_storage_base_url: None,
        }
    }
}
