//! Image compression: dimension cap plus size-ceiling re-encode.
//!
//! The compressor never fails past its boundary: any decode or encode error
//! hands the original file back byte-identical, so an odd input can degrade
//! quality but can never block an upload.

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use lectio_core::models::MediaFile;
use std::io::Cursor;

const QUALITY_LADDER: [u8; 4] = [80, 70, 60, 50];
const MIN_DIMENSION_PX: u32 = 64;

/// Ceilings for compressed images.
#[derive(Debug, Clone)]
pub struct ImageCompressorConfig {
    pub max_output_bytes: usize,
    pub max_dimension_px: u32,
}

impl Default for ImageCompressorConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: 1024 * 1024,
            max_dimension_px: 1920,
        }
    }
}

impl ImageCompressorConfig {
    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self {
            max_output_bytes: config.max_image_size_bytes(),
            max_dimension_px: config.max_image_dimension_px,
        }
    }
}

/// Output encoding, chosen from the detected input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputTarget {
    Jpeg,
    Png,
    WebP,
}

impl OutputTarget {
    /// Formats we can re-encode stay themselves; everything else (GIF, BMP,
    /// TIFF, ...) becomes JPEG.
    fn for_input(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => OutputTarget::Png,
            ImageFormat::WebP => OutputTarget::WebP,
            _ => OutputTarget::Jpeg,
        }
    }

    fn mime_type(self) -> &'static str {
        match self {
            OutputTarget::Jpeg => "image/jpeg",
            OutputTarget::Png => "image/png",
            OutputTarget::WebP => "image/webp",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputTarget::Jpeg => "jpg",
            OutputTarget::Png => "png",
            OutputTarget::WebP => "webp",
        }
    }
}

/// Stateless, CPU-bound image compressor. Async callers should run
/// [`ImageCompressor::compress`] under `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ImageCompressor {
    config: ImageCompressorConfig,
}

impl ImageCompressor {
    pub fn new(config: ImageCompressorConfig) -> Self {
        Self { config }
    }

    /// Compress `file` to fit the configured ceilings.
    ///
    /// Returns the original file unchanged when compression fails or does not
    /// make the payload smaller.
    pub fn compress(&self, file: &MediaFile) -> MediaFile {
        match self.try_compress(file) {
            Ok(compressed) if compressed.len() < file.len() => {
                tracing::info!(
                    file = %file.name,
                    original_bytes = file.len(),
                    compressed_bytes = compressed.len(),
                    "Image compressed"
                );
                compressed
            }
            Ok(_) => {
                tracing::debug!(
                    file = %file.name,
                    size_bytes = file.len(),
                    "Re-encode did not shrink image, keeping original"
                );
                file.clone()
            }
            Err(e) => {
                tracing::warn!(
                    file = %file.name,
                    error = %e,
                    "Image compression failed, keeping original"
                );
                file.clone()
            }
        }
    }

    fn try_compress(&self, file: &MediaFile) -> Result<MediaFile> {
        let reader = ImageReader::new(Cursor::new(file.data.as_ref()))
            .with_guessed_format()
            .context("guess image format")?;
        let input_format = reader
            .format()
            .ok_or_else(|| anyhow!("unrecognized image format"))?;
        let mut img = reader.decode().context("decode image")?;

        let cap = self.config.max_dimension_px;
        let (width, height) = img.dimensions();
        if width.max(height) > cap {
            img = img.resize(cap, cap, FilterType::Lanczos3);
        }

        let target = OutputTarget::for_input(input_format);
        let mut best = encode_to_fit(&img, target, self.config.max_output_bytes)?;

        // Size ceiling is a goal, not a guarantee: when quality alone is not
        // enough, halve the dimensions down to a floor and take what we get.
        while best.len() > self.config.max_output_bytes {
            let (w, h) = img.dimensions();
            if w.max(h) / 2 < MIN_DIMENSION_PX {
                break;
            }
            img = img.resize(w / 2, h / 2, FilterType::Lanczos3);
            best = encode_to_fit(&img, target, self.config.max_output_bytes)?;
        }

        // Keep the caller's file name unless the format itself changed.
        let name = if matches!(
            input_format,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP
        ) {
            file.name.clone()
        } else {
            format!("{}.{}", file.stem(), target.extension())
        };

        Ok(MediaFile::new(name, target.mime_type(), best))
    }
}

/// Encode at descending quality steps, returning the first attempt that fits
/// the byte ceiling, or the smallest attempt when none does.
fn encode_to_fit(img: &DynamicImage, target: OutputTarget, max_bytes: usize) -> Result<Bytes> {
    let mut smallest: Option<Bytes> = None;

    for quality in QUALITY_LADDER {
        let encoded = encode(img, target, quality)?;
        if encoded.len() <= max_bytes {
            return Ok(encoded);
        }
        let replace = smallest
            .as_ref()
            .map(|s| encoded.len() < s.len())
            .unwrap_or(true);
        if replace {
            smallest = Some(encoded);
        }
        // PNG is lossless; the ladder only applies to lossy targets.
        if target == OutputTarget::Png {
            break;
        }
    }

    smallest.ok_or_else(|| anyhow!("no encode attempt produced output"))
}

fn encode(img: &DynamicImage, target: OutputTarget, quality: u8) -> Result<Bytes> {
    match target {
        OutputTarget::Jpeg => encode_jpeg(img, quality),
        OutputTarget::Png => encode_png(img),
        OutputTarget::WebP => encode_webp(img, quality),
    }
}

/// Encode to JPEG using mozjpeg
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(&rgb_img)?;
    let jpeg_data = comp.finish()?;

    Ok(Bytes::from(jpeg_data))
}

/// Encode to PNG
fn encode_png(img: &DynamicImage) -> Result<Bytes> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    img.write_to(&mut cursor, ImageFormat::Png)?;

    Ok(Bytes::from(buffer))
}

/// Encode to WebP
fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Bytes> {
    let (width, height) = img.dimensions();
    let rgba_img = img.to_rgba8();

    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(quality as f32);

    Ok(Bytes::copy_from_slice(&webp_data))
}
