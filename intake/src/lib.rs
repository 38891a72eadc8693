//! Loan-application intake: reads Indonesian ID cards (KTP) into canonical
//! identity records and parses SLIK credit-bureau reports into tables.

pub mod bureau;
pub mod config;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;

pub use bureau::{load_bureau_report, parse_bureau_bytes, parse_bureau_report};
pub use config::Config;
pub use error::{IntakeError, Result};
pub use extraction::{merge, revalidate, RevalidationPolicy};
pub use models::{BureauTable, CanonicalIdentityRecord, IdentityField};
pub use ocr::{IdentityExtraction, OcrOrchestrator};
