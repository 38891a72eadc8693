//! Text → record transforms for KTP readings.
//!
//! - [`identity`] turns the raw text of one OCR attempt into a
//!   [`CanonicalIdentityRecord`](crate::models::CanonicalIdentityRecord)
//! - [`merge`] reconciles two partial records

pub mod identity;
mod merge;

pub use identity::{extract, normalize_record};
pub use merge::{changed_fields, merge, revalidate, RevalidationPolicy};
