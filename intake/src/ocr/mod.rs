//! KTP photo reading.
//!
//! A photo goes through a fixed, bounded sequence: three enhancement tiers,
//! each read with three language/engine combinations by the primary text
//! provider, then one call to the server-side KTP reader. Raw text is turned
//! into fields by [`crate::extraction`].
//!
//! # Providers
//!
//! - [`TextRecognizer`] returns raw text (OCR.space in production).
//! - [`IdentityRecognizer`] returns structured fields (the KTP backend).
//!
//! Either may be absent from the configuration; the orchestrator only
//! refuses to start when both are.
//!
//! # Usage
//!
//! ```rust,ignore
//! let orchestrator = OcrOrchestrator::new(&config)?;
//! let extraction = orchestrator.extract_identity(photo_bytes).await?;
//! ```

mod api;
mod orchestrator;
mod preprocessing;
mod provider;

pub use api::{KtpBackendClient, OcrSpaceClient};
pub use orchestrator::{AttemptOutcome, IdentityExtraction, OcrOrchestrator, OcrResult};
pub use preprocessing::{
    EnhancementTier, ImagePreprocessor, PrepareOptions, PreparedImage, RawImage,
};
pub use provider::{IdentityRecognizer, OcrAttemptConfig, SecondaryReading, TextRecognizer};
