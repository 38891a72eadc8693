use thiserror::Error;

/// Message shown to the applicant when no strategy could read the ID card.
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Data KTP tidak dapat dibaca. Silakan unggah ulang foto KTP yang lebih jelas.";

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Image too large: {size} bytes exceeds the {limit} byte upload limit")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Report too large: {size} bytes exceeds the {limit} byte upload limit")]
    ReportTooLarge { size: u64, limit: u64 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("OCR provider transport error: {0}")]
    ProviderTransport(String),

    #[error("OCR provider processing error: {0}")]
    ProviderProcessing(String),

    #[error("OCR provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("OCR deadline of {secs} seconds exceeded")]
    DeadlineExceeded { secs: u64 },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("{message}")]
    ExtractionFailed {
        message: String,
        #[source]
        source: Option<Box<IntakeError>>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// Builds the terminal failure, keeping the most recent underlying cause.
    pub fn extraction_failed(last: Option<IntakeError>) -> Self {
        IntakeError::ExtractionFailed {
            message: EXTRACTION_FAILED_MESSAGE.to_string(),
            source: last.map(Box::new),
        }
    }

    /// Errors after which the orchestrator must stop issuing remote calls.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            IntakeError::DeadlineExceeded { .. } | IntakeError::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;
