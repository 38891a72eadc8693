use crate::models::{CanonicalIdentityRecord, IdentityField};

/// Field-wise union of two readings. For every field the `primary` value
/// wins when it is non-empty, otherwise the `secondary` value is taken.
pub fn merge(
    primary: &CanonicalIdentityRecord,
    secondary: &CanonicalIdentityRecord,
) -> CanonicalIdentityRecord {
    let mut merged = primary.clone();
    for field in IdentityField::ALL {
        if !merged.is_filled(field) && secondary.is_filled(field) {
            merged.set(field, secondary.get(field));
        }
    }
    merged
}

/// How a fresh reading is applied to a record the applicant already has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevalidationPolicy {
    /// Keep every existing value, only fill the gaps.
    #[default]
    FillEmpty,
    /// Fresh non-empty values replace existing ones.
    Overwrite,
}

pub fn revalidate(
    existing: &CanonicalIdentityRecord,
    fresh: &CanonicalIdentityRecord,
    policy: RevalidationPolicy,
) -> CanonicalIdentityRecord {
    match policy {
        RevalidationPolicy::FillEmpty => merge(existing, fresh),
        RevalidationPolicy::Overwrite => merge(fresh, existing),
    }
}

/// Fields where `fresh` carries a value that differs from `existing`.
pub fn changed_fields(
    existing: &CanonicalIdentityRecord,
    fresh: &CanonicalIdentityRecord,
) -> Vec<IdentityField> {
    IdentityField::ALL
        .into_iter()
        .filter(|field| fresh.is_filled(*field) && fresh.get(*field) != existing.get(*field))
        .collect()
}
