//! [`ImportStore`] / [`CanonicalSource`] implementations over a Postgres pool.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use vendir_core::{
    CanonicalCategory, CanonicalCity, CanonicalSource, ImportFilter, ImportRecord, ImportStatus,
    ImportStore, ImportUpdate, NewVendor, StoreError, Vendor, VendorPatch,
};

use crate::{canonical, imports, vendors, DbError};

/// Postgres-backed store handed to the engine crates.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a db error onto the engine-facing taxonomy. `NotFound` carries the
/// id the caller was operating on.
fn store_error(err: DbError, id: Uuid) -> StoreError {
    match err {
        DbError::NotFound => StoreError::NotFound { id },
        other => StoreError::Backend(other.to_string()),
    }
}

fn backend_error(err: DbError) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl ImportStore for PgStore {
    async fn get_import(&self, id: Uuid) -> Result<Option<ImportRecord>, StoreError> {
        imports::get_import(&self.pool, id)
            .await
            .map_err(backend_error)?
            .map(|row| ImportRecord::try_from(row).map_err(backend_error))
            .transpose()
    }

    async fn list_imports(&self, filter: &ImportFilter) -> Result<Vec<ImportRecord>, StoreError> {
        imports::list_imports(&self.pool, filter)
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(|row| ImportRecord::try_from(row).map_err(backend_error))
            .collect()
    }

    async fn update_import(&self, id: Uuid, update: &ImportUpdate) -> Result<(), StoreError> {
        imports::update_import(&self.pool, id, update)
            .await
            .map_err(|e| store_error(e, id))
    }

    async fn delete_imports(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        imports::delete_imports(&self.pool, ids)
            .await
            .map_err(backend_error)
    }

    async fn count_by_status(&self, status: ImportStatus) -> Result<u64, StoreError> {
        let count = imports::count_imports_by_status(&self.pool, status)
            .await
            .map_err(backend_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn approve_import(&self, import_id: Uuid, vendor: &NewVendor) -> Result<(), StoreError> {
        // The two writes share a transaction, so a failure can never leave an
        // orphaned vendor behind.
        imports::approve_import(&self.pool, import_id, vendor)
            .await
            .map_err(|e| store_error(e, import_id))
    }

    async fn get_vendor(&self, id: Uuid) -> Result<Option<Vendor>, StoreError> {
        vendors::get_vendor(&self.pool, id)
            .await
            .map_err(backend_error)?
            .map(|row| Vendor::try_from(row).map_err(backend_error))
            .transpose()
    }

    async fn patch_vendor(&self, id: Uuid, patch: &VendorPatch) -> Result<(), StoreError> {
        vendors::patch_vendor(&self.pool, id, patch)
            .await
            .map_err(|e| store_error(e, id))
    }
}

#[async_trait]
impl CanonicalSource for PgStore {
    async fn list_cities(&self) -> Result<Vec<CanonicalCity>, StoreError> {
        let rows = canonical::list_canonical_cities(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(rows.into_iter().map(CanonicalCity::from).collect())
    }

    async fn list_categories(&self) -> Result<Vec<CanonicalCategory>, StoreError> {
        let rows = canonical::list_canonical_categories(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(rows.into_iter().map(CanonicalCategory::from).collect())
    }
}
