//! Storage contracts for import records, vendors, and canonical tables.
//!
//! The engine crates only see these traits; `vendir-db` provides the
//! Postgres implementation and tests use an in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::canonical::{CanonicalCategory, CanonicalCity};
use crate::records::{ImportRecord, ImportStatus, NewVendor, Vendor};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {id}")]
    NotFound { id: Uuid },

    /// The vendor row was created but the import record could not be marked
    /// approved. Requires manual reconciliation; never swallow this.
    #[error("vendor {vendor_id} created but import {import_id} not marked approved: {reason}")]
    PartialApproval {
        import_id: Uuid,
        vendor_id: Uuid,
        reason: String,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Filter for listing import records.
///
/// `None` fields do not constrain the result. `city_resolved: Some(false)`
/// selects records with a null `city_id`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
    pub status: Option<ImportStatus>,
    pub city_resolved: Option<bool>,
    pub category_resolved: Option<bool>,
    pub has_email: Option<bool>,
    pub has_phone: Option<bool>,
    pub has_website: Option<bool>,
    pub limit: Option<i64>,
}

impl ImportFilter {
    /// Filter for the reconciliation sweep: all pending records.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: Some(ImportStatus::Pending),
            ..Self::default()
        }
    }
}

/// Partial update for an import record. `None` fields are left untouched.
///
/// The sweep writes back only on change, so an all-`None` update is the
/// "nothing changed" signal and must not reach the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportUpdate {
    pub city_raw: Option<String>,
    pub city_id: Option<i64>,
    pub category_id: Option<i64>,
    pub status: Option<ImportStatus>,
    pub status_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_vendor_id: Option<Uuid>,
    pub merged_into: Option<Uuid>,
}

impl ImportUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Partial update for an existing vendor, produced by the merge engine from
/// the selected [`crate::records::ImportRecord`] fields only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub social_media: Option<crate::records::SocialMedia>,
}

impl VendorPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Persistence contract for import records and vendors.
#[async_trait]
pub trait ImportStore: Send + Sync {
    async fn get_import(&self, id: Uuid) -> Result<Option<ImportRecord>, StoreError>;

    async fn list_imports(&self, filter: &ImportFilter) -> Result<Vec<ImportRecord>, StoreError>;

    /// Applies a partial update to one record. Errors with
    /// [`StoreError::NotFound`] if the id does not exist.
    async fn update_import(&self, id: Uuid, update: &ImportUpdate) -> Result<(), StoreError>;

    /// Permanently removes records. Returns the number actually deleted.
    async fn delete_imports(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    async fn count_by_status(&self, status: ImportStatus) -> Result<u64, StoreError>;

    /// Materializes the vendor and marks the import approved.
    ///
    /// Implementations that support transactions must make the two writes
    /// atomic; others must return [`StoreError::PartialApproval`] when the
    /// vendor insert succeeded but the status update failed, so an operator
    /// can detect and fix the orphaned vendor.
    async fn approve_import(&self, import_id: Uuid, vendor: &NewVendor) -> Result<(), StoreError>;

    async fn get_vendor(&self, id: Uuid) -> Result<Option<Vendor>, StoreError>;

    /// Applies a merge patch to an existing vendor.
    async fn patch_vendor(&self, id: Uuid, patch: &VendorPatch) -> Result<(), StoreError>;
}

/// Read-only access to the canonical taxonomy tables.
#[async_trait]
pub trait CanonicalSource: Send + Sync {
    async fn list_cities(&self) -> Result<Vec<CanonicalCity>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<CanonicalCategory>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_detected() {
        assert!(ImportUpdate::default().is_empty());
        let update = ImportUpdate {
            city_id: Some(3),
            ..ImportUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn pending_filter_only_constrains_status() {
        let filter = ImportFilter::pending();
        assert_eq!(filter.status, Some(ImportStatus::Pending));
        assert_eq!(filter.city_resolved, None);
        assert_eq!(filter.limit, None);
    }
}
