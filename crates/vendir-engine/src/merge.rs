//! Duplicate/merge decision engine.
//!
//! Compares an incoming import record against the existing vendor it
//! duplicates, field by field. Auto-fill only ever selects fields where the
//! vendor has nothing and the import has something; the operator can toggle
//! any decision before applying. Applying writes the selected fields to the
//! vendor and rejects the import with a merge annotation — the import is
//! never deleted, it stays as the provenance trail.

use chrono::Utc;
use uuid::Uuid;

use vendir_core::{
    ImportRecord, ImportStatus, ImportStore, ImportUpdate, SocialMedia, Vendor, VendorPatch,
};

use crate::error::EngineError;

/// Comparable fields between an import record and a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeField {
    Email,
    Phone,
    Website,
    Description,
    PriceRange,
    Facebook,
    Instagram,
    Twitter,
    Youtube,
    Pinterest,
}

impl MergeField {
    pub const ALL: [MergeField; 10] = [
        MergeField::Email,
        MergeField::Phone,
        MergeField::Website,
        MergeField::Description,
        MergeField::PriceRange,
        MergeField::Facebook,
        MergeField::Instagram,
        MergeField::Twitter,
        MergeField::Youtube,
        MergeField::Pinterest,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MergeField::Email => "email",
            MergeField::Phone => "phone",
            MergeField::Website => "website",
            MergeField::Description => "description",
            MergeField::PriceRange => "price_range",
            MergeField::Facebook => "facebook",
            MergeField::Instagram => "instagram",
            MergeField::Twitter => "twitter",
            MergeField::Youtube => "youtube",
            MergeField::Pinterest => "pinterest",
        }
    }

    fn from_import(self, record: &ImportRecord) -> Option<String> {
        match self {
            MergeField::Email => record.email.clone(),
            MergeField::Phone => record.phone.clone(),
            MergeField::Website => record.website.clone(),
            MergeField::Description => record.description.clone(),
            MergeField::PriceRange => record.price_range.clone(),
            MergeField::Facebook => record.social_media.facebook.clone(),
            MergeField::Instagram => record.social_media.instagram.clone(),
            MergeField::Twitter => record.social_media.twitter.clone(),
            MergeField::Youtube => record.social_media.youtube.clone(),
            MergeField::Pinterest => record.social_media.pinterest.clone(),
        }
    }

    fn from_vendor(self, vendor: &Vendor) -> Option<String> {
        match self {
            MergeField::Email => vendor.email.clone(),
            MergeField::Phone => vendor.phone.clone(),
            MergeField::Website => vendor.website.clone(),
            MergeField::Description => vendor.description.clone(),
            MergeField::PriceRange => vendor.price_range.clone(),
            MergeField::Facebook => vendor.social_media.facebook.clone(),
            MergeField::Instagram => vendor.social_media.instagram.clone(),
            MergeField::Twitter => vendor.social_media.twitter.clone(),
            MergeField::Youtube => vendor.social_media.youtube.clone(),
            MergeField::Pinterest => vendor.social_media.pinterest.clone(),
        }
    }
}

impl std::str::FromStr for MergeField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown merge field: {s}"))
    }
}

/// One per-field decision: what both sides hold and whether the incoming
/// value is selected for the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeDecision {
    pub field: MergeField,
    pub incoming: Option<String>,
    pub existing: Option<String>,
    pub selected: bool,
}

/// A full set of decisions for one import/vendor pair.
#[derive(Debug, Clone)]
pub struct MergePlan {
    pub import_id: Uuid,
    pub vendor_id: Uuid,
    pub decisions: Vec<MergeDecision>,
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl MergePlan {
    /// Builds a plan with the auto-fill heuristic applied: a field is
    /// selected iff the vendor side is empty and the import side is not.
    /// Populated vendor data is never auto-overwritten.
    #[must_use]
    pub fn auto_fill(record: &ImportRecord, vendor: &Vendor) -> Self {
        let decisions = MergeField::ALL
            .into_iter()
            .map(|field| {
                let incoming = field.from_import(record);
                let existing = field.from_vendor(vendor);
                let selected = is_blank(existing.as_deref()) && !is_blank(incoming.as_deref());
                MergeDecision {
                    field,
                    incoming,
                    existing,
                    selected,
                }
            })
            .collect();

        Self {
            import_id: record.id,
            vendor_id: vendor.id,
            decisions,
        }
    }

    /// Manual override: toggles one field regardless of the auto-fill result.
    pub fn set_selected(&mut self, field: MergeField, selected: bool) {
        if let Some(decision) = self.decisions.iter_mut().find(|d| d.field == field) {
            decision.selected = selected;
        }
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.selected).count()
    }

    /// Builds the vendor update payload from the selected fields only.
    ///
    /// Social platform selections are folded into a full [`SocialMedia`]
    /// value on top of the vendor's existing links, so unselected platforms
    /// survive untouched.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptySelection`] when nothing is selected.
    pub fn to_patch(&self, existing_social: &SocialMedia) -> Result<VendorPatch, EngineError> {
        if self.selected_count() == 0 {
            return Err(EngineError::EmptySelection);
        }

        let mut patch = VendorPatch::default();
        let mut social = existing_social.clone();
        let mut social_touched = false;

        for decision in self.decisions.iter().filter(|d| d.selected) {
            let value = decision.incoming.clone();
            match decision.field {
                MergeField::Email => patch.email = value,
                MergeField::Phone => patch.phone = value,
                MergeField::Website => patch.website = value,
                MergeField::Description => patch.description = value,
                MergeField::PriceRange => patch.price_range = value,
                MergeField::Facebook => {
                    social.facebook = value;
                    social_touched = true;
                }
                MergeField::Instagram => {
                    social.instagram = value;
                    social_touched = true;
                }
                MergeField::Twitter => {
                    social.twitter = value;
                    social_touched = true;
                }
                MergeField::Youtube => {
                    social.youtube = value;
                    social_touched = true;
                }
                MergeField::Pinterest => {
                    social.pinterest = value;
                    social_touched = true;
                }
            }
        }

        if social_touched {
            patch.social_media = Some(social);
        }

        Ok(patch)
    }
}

/// Applies a merge plan: patches the vendor, then rejects the import with a
/// merge annotation referencing the vendor.
///
/// # Errors
///
/// - [`EngineError::EmptySelection`] when nothing is selected.
/// - [`EngineError::InvalidTransition`] when the import already left the
///   reconciliation loop.
/// - [`EngineError::ImportNotFound`] / [`EngineError::VendorNotFound`] /
///   [`EngineError::Store`] for storage problems.
pub async fn apply_merge(store: &dyn ImportStore, plan: &MergePlan) -> Result<(), EngineError> {
    let record = store
        .get_import(plan.import_id)
        .await?
        .ok_or(EngineError::ImportNotFound { id: plan.import_id })?;
    if !matches!(
        record.status,
        ImportStatus::Pending | ImportStatus::Duplicate
    ) {
        return Err(EngineError::InvalidTransition {
            id: record.id,
            from: record.status,
            to: ImportStatus::Rejected,
        });
    }

    let vendor = store
        .get_vendor(plan.vendor_id)
        .await?
        .ok_or(EngineError::VendorNotFound { id: plan.vendor_id })?;

    let patch = plan.to_patch(&vendor.social_media)?;
    store.patch_vendor(plan.vendor_id, &patch).await?;

    let update = ImportUpdate {
        status: Some(ImportStatus::Rejected),
        status_reason: Some(format!("merged into vendor {}", plan.vendor_id)),
        merged_into: Some(plan.vendor_id),
        processed_at: Some(Utc::now()),
        ..ImportUpdate::default()
    };
    store.update_import(plan.import_id, &update).await?;

    tracing::info!(
        import_id = %plan.import_id,
        vendor_id = %plan.vendor_id,
        fields = plan.selected_count(),
        "merge applied"
    );
    Ok(())
}
