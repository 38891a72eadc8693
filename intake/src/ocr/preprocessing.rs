use std::fmt;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageReader, Luma};
use serde::Serialize;

use crate::config::PreprocessingConfig;
use crate::error::{IntakeError, Result};

/// An uploaded photo, validated as an image within the upload ceiling.
#[derive(Debug, Clone)]
pub struct RawImage {
    bytes: Vec<u8>,
    mime: String,
}

impl RawImage {
    /// Rejects payloads above `max_upload_bytes` and anything whose magic
    /// bytes are not an image.
    pub fn from_bytes(bytes: Vec<u8>, max_upload_bytes: usize) -> Result<Self> {
        if bytes.len() > max_upload_bytes {
            return Err(IntakeError::ImageTooLarge {
                size: bytes.len(),
                limit: max_upload_bytes,
            });
        }

        match infer::get(&bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(Self {
                mime: kind.mime_type().to_string(),
                bytes,
            }),
            Some(kind) => Err(IntakeError::UnsupportedFormat(format!(
                "expected an image, got {}",
                kind.mime_type()
            ))),
            None => Err(IntakeError::UnsupportedFormat(
                "unrecognised file content".to_string(),
            )),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Enhancement presets tried in order when OCR results are weak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementTier {
    Mild,
    Binarized,
    StrongBinarized,
}

impl EnhancementTier {
    pub const ALL: [EnhancementTier; 3] = [
        EnhancementTier::Mild,
        EnhancementTier::Binarized,
        EnhancementTier::StrongBinarized,
    ];

    pub fn options(&self) -> PrepareOptions {
        match self {
            EnhancementTier::Mild => PrepareOptions {
                enhance: true,
                binarize: false,
                contrast: 1.25,
                brightness: 1.05,
                threshold: 0,
            },
            EnhancementTier::Binarized => PrepareOptions {
                enhance: true,
                binarize: true,
                contrast: 1.5,
                brightness: 1.1,
                threshold: 150,
            },
            EnhancementTier::StrongBinarized => PrepareOptions {
                enhance: true,
                binarize: true,
                contrast: 1.9,
                brightness: 1.15,
                threshold: 170,
            },
        }
    }
}

impl fmt::Display for EnhancementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnhancementTier::Mild => "mild",
            EnhancementTier::Binarized => "binarized",
            EnhancementTier::StrongBinarized => "strong_binarized",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrepareOptions {
    /// Grayscale, then contrast around mid-grey, then brightness.
    pub enhance: bool,
    /// Luminance at or above `threshold` becomes white, the rest black.
    pub binarize: bool,
    pub contrast: f32,
    pub brightness: f32,
    pub threshold: u8,
}

impl PrepareOptions {
    /// Size reduction only.
    pub const COMPRESS_ONLY: PrepareOptions = PrepareOptions {
        enhance: false,
        binarize: false,
        contrast: 1.0,
        brightness: 1.0,
        threshold: 0,
    };
}

/// Image ready to upload to an OCR provider.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
    /// `None` when the image was passed through or only compressed.
    pub tier: Option<EnhancementTier>,
}

impl PreparedImage {
    /// Multipart file name; providers sniff the format from its extension.
    pub fn file_name(&self) -> String {
        let extension = match self.mime.as_str() {
            "image/jpeg" => "jpg",
            other => other.strip_prefix("image/").unwrap_or("jpg"),
        };
        format!("ktp.{extension}")
    }
}

/// Re-encodes photos so they fit provider upload limits and read better.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessingConfig,
}

impl ImagePreprocessor {
    pub fn new(config: &PreprocessingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Produces the variant for `tier` at the configured target size.
    pub fn prepare_tier(&self, image: &RawImage, tier: EnhancementTier) -> Result<PreparedImage> {
        let mut prepared = self.prepare(image, self.config.target_size_bytes, &tier.options())?;
        prepared.tier = Some(tier);
        Ok(prepared)
    }

    /// The original photo, only shrunk to the target size.
    pub fn compress(&self, image: &RawImage) -> Result<PreparedImage> {
        self.prepare(
            image,
            self.config.target_size_bytes,
            &PrepareOptions::COMPRESS_ONLY,
        )
    }

    /// Deterministic: identical input and options give identical bytes.
    /// Returns the last encoding even when the dimension floor is reached
    /// before `target_size_bytes`.
    pub fn prepare(
        &self,
        image: &RawImage,
        target_size_bytes: usize,
        options: &PrepareOptions,
    ) -> Result<PreparedImage> {
        if image.size() <= target_size_bytes && !options.enhance && !options.binarize {
            return Ok(PreparedImage {
                bytes: image.bytes().to_vec(),
                mime: image.mime().to_string(),
                tier: None,
            });
        }

        let decoded = decode(image.bytes())?;
        let resized = resize_to_fit(decoded, self.config.max_dimension);
        let adjusted = apply_options(resized, options);
        let bytes = self.encode_within(adjusted, target_size_bytes)?;

        Ok(PreparedImage {
            bytes,
            mime: "image/jpeg".to_string(),
            tier: None,
        })
    }

    /// Lowers JPEG quality, then dimensions, until the output fits.
    fn encode_within(&self, image: DynamicImage, target_size_bytes: usize) -> Result<Vec<u8>> {
        let step = self.config.quality_step.max(1);
        let floor = self.config.min_dimension.max(1);
        let mut current = image;

        loop {
            let mut quality = self.config.initial_quality;
            let mut encoded = encode_jpeg(&current, quality)?;
            while encoded.len() > target_size_bytes && quality > self.config.min_quality {
                quality = quality.saturating_sub(step).max(self.config.min_quality);
                encoded = encode_jpeg(&current, quality)?;
            }
            if encoded.len() <= target_size_bytes {
                return Ok(encoded);
            }

            let (width, height) = current.dimensions();
            let longer = width.max(height);
            let next = ((longer as f32 * self.config.scale_step) as u32).max(floor);
            if longer <= floor || next >= longer {
                tracing::debug!(
                    size = encoded.len(),
                    target = target_size_bytes,
                    "Dimension floor reached above target size"
                );
                return Ok(encoded);
            }
            let resized = resize_to_fit(current, next);
            if resized.width().max(resized.height()) >= longer {
                return Ok(encoded);
            }
            current = resized;
        }
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| IntakeError::Processing(format!("Failed to read image: {e}")))?
        .decode()
        .map_err(|e| IntakeError::Processing(format!("Failed to decode image: {e}")))
}

/// Scales down so the longer side is at most `max_dim`, keeping the
/// aspect ratio.
fn resize_to_fit(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = max_dim as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio).round() as u32).max(1);
    let new_height = ((height as f32 * ratio).round() as u32).max(1);

    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

fn adjust_pixel(value: u8, contrast: f32, brightness: f32) -> u8 {
    let contrasted = (value as f32 - 128.0) * contrast + 128.0;
    (contrasted * brightness).round().clamp(0.0, 255.0) as u8
}

fn apply_options(img: DynamicImage, options: &PrepareOptions) -> DynamicImage {
    if !options.enhance && !options.binarize {
        return img;
    }

    let mut gray: GrayImage = img.to_luma8();
    if options.enhance {
        for pixel in gray.pixels_mut() {
            *pixel = Luma([adjust_pixel(pixel[0], options.contrast, options.brightness)]);
        }
    }
    if options.binarize {
        for pixel in gray.pixels_mut() {
            *pixel = Luma([if pixel[0] >= options.threshold { 255 } else { 0 }]);
        }
    }
    DynamicImage::ImageLuma8(gray)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
    let written = match img {
        DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder),
        other => other.to_rgb8().write_with_encoder(encoder),
    };
    written.map_err(|e| IntakeError::Processing(format!("Failed to encode image: {e}")))?;
    Ok(output)
}
