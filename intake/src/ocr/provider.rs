use async_trait::async_trait;
use serde::Serialize;

use super::preprocessing::PreparedImage;
use crate::config::OcrConfig;
use crate::error::Result;
use crate::models::CanonicalIdentityRecord;

/// Language/engine pair sent with one primary-provider request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrAttemptConfig {
    pub language: String,
    pub engine: String,
}

impl OcrAttemptConfig {
    pub fn new(language: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            engine: engine.into(),
        }
    }

    /// Attempts tried against every enhancement tier, in order: primary
    /// language on both engines, then the fallback language.
    pub fn sequence(config: &OcrConfig) -> [OcrAttemptConfig; 3] {
        [
            Self::new(&config.primary_language, &config.primary_engine),
            Self::new(&config.primary_language, &config.fallback_engine),
            Self::new(&config.fallback_language, &config.primary_engine),
        ]
    }
}

/// Remote service returning the raw text of an image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &PreparedImage, attempt: &OcrAttemptConfig)
        -> Result<String>;
}

/// What the server-side KTP reader returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryReading {
    pub fields: CanonicalIdentityRecord,
    pub warning: Option<String>,
}

/// Remote service returning structured KTP fields directly.
#[async_trait]
pub trait IdentityRecognizer: Send + Sync {
    async fn recognize_identity(&self, image: &PreparedImage) -> Result<SecondaryReading>;
}
