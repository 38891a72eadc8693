use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}

pub const DEFAULT_OCR_BASE_URL: &str = "https://api.ocr.space";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ocr: OcrConfig,
    pub secondary: Option<SecondaryOcrConfig>,
    pub preprocessing: PreprocessingConfig,
}

/// Primary (remote, third-party) OCR provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub primary_language: String,
    pub fallback_language: String,
    pub primary_engine: String,
    pub fallback_engine: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Budget for one whole identity extraction, all attempts included.
    pub deadline_secs: u64,
}

/// Backend-managed KTP OCR endpoint used as the last resort.
#[derive(Debug, Clone, Deserialize)]
pub struct SecondaryOcrConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessingConfig {
    pub max_upload_bytes: usize,
    pub target_size_bytes: usize,
    pub max_dimension: u32,
    pub min_dimension: u32,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
    pub scale_step: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            primary_language: "ind".to_string(),
            fallback_language: "eng".to_string(),
            primary_engine: "2".to_string(),
            fallback_engine: "1".to_string(),
            timeout_secs: 30,
            deadline_secs: 120,
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024,
            target_size_bytes: 900 * 1024,
            max_dimension: 1600,
            min_dimension: 480,
            initial_quality: 92,
            min_quality: 40,
            quality_step: 10,
            scale_step: 0.85,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ocr_defaults = OcrConfig::default();
        let pre_defaults = PreprocessingConfig::default();

        Self {
            ocr: OcrConfig {
                api_key: parse_env_opt("OCR_API_KEY"),
                base_url: parse_env_opt("OCR_BASE_URL"),
                primary_language: env::var("OCR_PRIMARY_LANGUAGE")
                    .unwrap_or(ocr_defaults.primary_language),
                fallback_language: env::var("OCR_FALLBACK_LANGUAGE")
                    .unwrap_or(ocr_defaults.fallback_language),
                primary_engine: env::var("OCR_PRIMARY_ENGINE")
                    .unwrap_or(ocr_defaults.primary_engine),
                fallback_engine: env::var("OCR_FALLBACK_ENGINE")
                    .unwrap_or(ocr_defaults.fallback_engine),
                timeout_secs: parse_env_or("OCR_TIMEOUT", ocr_defaults.timeout_secs),
                deadline_secs: parse_env_or("OCR_DEADLINE", ocr_defaults.deadline_secs),
            },
            secondary: parse_env_opt("KTP_OCR_URL").map(|url| SecondaryOcrConfig {
                url,
                token: parse_env_opt("KTP_OCR_TOKEN"),
                timeout_secs: parse_env_or("KTP_OCR_TIMEOUT", 60),
            }),
            preprocessing: PreprocessingConfig {
                max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", pre_defaults.max_upload_bytes),
                target_size_bytes: parse_env_or(
                    "OCR_TARGET_BYTES",
                    pre_defaults.target_size_bytes,
                ),
                max_dimension: parse_env_or("OCR_MAX_DIMENSION", pre_defaults.max_dimension),
                min_dimension: parse_env_or("OCR_MIN_DIMENSION", pre_defaults.min_dimension),
                initial_quality: parse_env_or(
                    "OCR_INITIAL_QUALITY",
                    pre_defaults.initial_quality,
                ),
                min_quality: parse_env_or("OCR_MIN_QUALITY", pre_defaults.min_quality),
                quality_step: parse_env_or("OCR_QUALITY_STEP", pre_defaults.quality_step),
                scale_step: parse_env_or("OCR_SCALE_STEP", pre_defaults.scale_step),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
