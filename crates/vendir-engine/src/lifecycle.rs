//! Import lifecycle state machine: approve, reject, duplicate, delete.
//!
//! Transitions are validated here, not in the store. Approval materializes a
//! vendor; rejection and duplicate-marking only annotate the import record.
//! Hard deletes go through a two-phase confirmation gate.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use vendir_core::{ImportRecord, ImportStatus, ImportStore, ImportUpdate, NewVendor, StoreError};
use vendir_match::{parse_location, resolve_region, LookupIndex};

use crate::error::EngineError;

/// Category fallback when the import never got a canonical category.
const FALLBACK_CATEGORY: &str = "Other";
/// City fallback when the raw location yielded nothing usable.
const FALLBACK_CITY: &str = "Unknown";

fn check_transition(record: &ImportRecord, to: ImportStatus) -> Result<(), EngineError> {
    let allowed = match to {
        ImportStatus::Approved | ImportStatus::Rejected => {
            matches!(record.status, ImportStatus::Pending | ImportStatus::Duplicate)
        }
        ImportStatus::Duplicate => record.status == ImportStatus::Pending,
        ImportStatus::Pending => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition {
            id: record.id,
            from: record.status,
            to,
        })
    }
}

/// Builds the vendor payload from an import record.
///
/// Resolved ids are mapped back to canonical display names through the
/// index; unresolved fields fall back to `"Other"` / `"Unknown"` so approval
/// never blocks on an incomplete match.
fn materialize(record: &ImportRecord, index: &LookupIndex) -> NewVendor {
    let parsed = parse_location(&record.city_raw);

    let city = record
        .city_id
        .and_then(|id| index.city_display(id))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            if parsed.city.trim().is_empty() {
                FALLBACK_CITY.to_owned()
            } else {
                parsed.city.clone()
            }
        });

    let category = record
        .category_id
        .and_then(|id| index.category_name(id))
        .map_or_else(|| FALLBACK_CATEGORY.to_owned(), str::to_owned);

    let (state, country) = match resolve_region(&city) {
        Some((state, country)) => (Some(state.to_owned()), Some(country.to_owned())),
        None => (
            None,
            parsed.country_hint.map(|h| h.code().to_owned()),
        ),
    };

    NewVendor {
        id: Uuid::new_v4(),
        business_name: record.business_name.clone(),
        category,
        city,
        zip: parsed.zip,
        state,
        country,
        description: record.description.clone(),
        price_range: record.price_range.clone(),
        email: record.email.clone(),
        phone: record.phone.clone(),
        website: record.website.clone(),
        source_url: record.source_url.clone(),
        source_name: record.source_name.clone(),
        social_media: record.social_media.clone(),
    }
}

/// Approves one import: materializes a vendor and marks the record approved.
/// Returns the new vendor's id.
///
/// # Errors
///
/// [`EngineError::ImportNotFound`], [`EngineError::InvalidTransition`], or a
/// store failure. A [`vendir_core::StoreError::PartialApproval`] from the
/// store is passed through untouched so the caller can surface the orphaned
/// vendor id.
pub async fn approve(
    store: &dyn ImportStore,
    index: &LookupIndex,
    id: Uuid,
) -> Result<Uuid, EngineError> {
    let record = store
        .get_import(id)
        .await?
        .ok_or(EngineError::ImportNotFound { id })?;
    check_transition(&record, ImportStatus::Approved)?;

    let vendor = materialize(&record, index);
    let vendor_id = vendor.id;
    store.approve_import(id, &vendor).await?;

    tracing::info!(import_id = %id, vendor_id = %vendor_id, "import approved");
    Ok(vendor_id)
}

/// Rejects one import with an optional operator-supplied reason.
pub async fn reject(
    store: &dyn ImportStore,
    id: Uuid,
    reason: Option<&str>,
) -> Result<(), EngineError> {
    let record = store
        .get_import(id)
        .await?
        .ok_or(EngineError::ImportNotFound { id })?;
    check_transition(&record, ImportStatus::Rejected)?;

    let update = ImportUpdate {
        status: Some(ImportStatus::Rejected),
        status_reason: reason.map(str::to_owned),
        processed_at: Some(Utc::now()),
        ..ImportUpdate::default()
    };
    store.update_import(id, &update).await?;
    tracing::info!(import_id = %id, "import rejected");
    Ok(())
}

/// Flags a pending import as a duplicate of an existing vendor. The record
/// stays in the review queue for a later merge or manual decision.
pub async fn mark_duplicate(
    store: &dyn ImportStore,
    id: Uuid,
    vendor_id: Uuid,
) -> Result<(), EngineError> {
    let record = store
        .get_import(id)
        .await?
        .ok_or(EngineError::ImportNotFound { id })?;
    check_transition(&record, ImportStatus::Duplicate)?;

    store
        .get_vendor(vendor_id)
        .await?
        .ok_or(EngineError::VendorNotFound { id: vendor_id })?;

    let update = ImportUpdate {
        status: Some(ImportStatus::Duplicate),
        status_reason: Some(format!("duplicate of vendor {vendor_id}")),
        ..ImportUpdate::default()
    };
    store.update_import(id, &update).await?;
    Ok(())
}

/// Per-id result of a bulk operation. One bad id never aborts the rest.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
}

/// Approves a batch of imports independently.
pub async fn bulk_approve(
    store: &dyn ImportStore,
    index: &LookupIndex,
    ids: &[Uuid],
) -> Result<BulkOutcome, EngineError> {
    let mut outcome = BulkOutcome::default();
    for &id in ids {
        match approve(store, index, id).await {
            Ok(_) => outcome.succeeded.push(id),
            // Partial approvals need the operator, not a retry loop.
            Err(EngineError::Store(err @ StoreError::PartialApproval { .. })) => {
                return Err(EngineError::Store(err));
            }
            Err(err) => outcome.failed.push((id, err.to_string())),
        }
    }
    Ok(outcome)
}

/// Rejects a batch of imports independently with a shared reason.
pub async fn bulk_reject(
    store: &dyn ImportStore,
    ids: &[Uuid],
    reason: Option<&str>,
) -> Result<BulkOutcome, EngineError> {
    let mut outcome = BulkOutcome::default();
    for &id in ids {
        match reject(store, id, reason).await {
            Ok(()) => outcome.succeeded.push(id),
            Err(err) => outcome.failed.push((id, err.to_string())),
        }
    }
    Ok(outcome)
}

/// Two-phase confirmation gate for hard deletes.
///
/// `request` registers the id set and hands back a token; `confirm` deletes
/// only if the token is known and younger than the TTL. Tokens are one-shot.
pub struct DeleteGate {
    ttl: Duration,
    pending: Mutex<HashMap<Uuid, (Vec<Uuid>, Instant)>>,
}

impl DeleteGate {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a delete request and returns its confirmation token.
    pub async fn request(&self, ids: &[Uuid]) -> Uuid {
        let token = Uuid::new_v4();
        self.pending
            .lock()
            .await
            .insert(token, (ids.to_vec(), Instant::now()));
        token
    }

    /// Consumes the token and performs the delete. Returns the number of
    /// records actually removed.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownDeleteToken`] for a token never issued (or
    /// already used), [`EngineError::ExpiredDeleteToken`] past the TTL.
    pub async fn confirm(
        &self,
        store: &dyn ImportStore,
        token: Uuid,
    ) -> Result<u64, EngineError> {
        let (ids, issued_at) = self
            .pending
            .lock()
            .await
            .remove(&token)
            .ok_or(EngineError::UnknownDeleteToken)?;
        if issued_at.elapsed() > self.ttl {
            return Err(EngineError::ExpiredDeleteToken);
        }

        let deleted = store.delete_imports(&ids).await?;
        tracing::warn!(requested = ids.len(), deleted, "import records deleted");
        Ok(deleted)
    }
}
