//! Database operations for the `import_records` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vendir_core::{ImportFilter, ImportRecord, ImportStatus, ImportUpdate, NewVendor};

use crate::DbError;

const IMPORT_COLUMNS: &str = "id, business_name, city_raw, category_raw, email, phone, website, \
     description, price_range, source_url, source_name, social_media, duplicate_score, \
     city_id, category_id, status, status_reason, processed_at, created_vendor_id, merged_into";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `import_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRow {
    pub id: Uuid,
    pub business_name: String,
    pub city_raw: String,
    pub category_raw: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub social_media: serde_json::Value,
    pub duplicate_score: i16,
    pub city_id: Option<i64>,
    pub category_id: Option<i64>,
    pub status: String,
    pub status_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_vendor_id: Option<Uuid>,
    pub merged_into: Option<Uuid>,
}

impl TryFrom<ImportRow> for ImportRecord {
    type Error = DbError;

    fn try_from(row: ImportRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ImportStatus>()
            .map_err(DbError::MalformedRow)?;
        let social_media = serde_json::from_value(row.social_media)
            .map_err(|e| DbError::MalformedRow(format!("social_media: {e}")))?;

        Ok(Self {
            id: row.id,
            business_name: row.business_name,
            city_raw: row.city_raw,
            category_raw: row.category_raw,
            email: row.email,
            phone: row.phone,
            website: row.website,
            description: row.description,
            price_range: row.price_range,
            source_url: row.source_url,
            source_name: row.source_name,
            social_media,
            duplicate_score: row.duplicate_score,
            city_id: row.city_id,
            category_id: row.category_id,
            status,
            status_reason: row.status_reason,
            processed_at: row.processed_at,
            created_vendor_id: row.created_vendor_id,
            merged_into: row.merged_into,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a single import record by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_import(pool: &PgPool, id: Uuid) -> Result<Option<ImportRow>, DbError> {
    let row = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} FROM import_records WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns import records matching the filter, oldest first.
///
/// Every filter field binds as a nullable parameter; a NULL bind leaves that
/// predicate unconstrained, so one static statement covers all filter shapes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_imports(pool: &PgPool, filter: &ImportFilter) -> Result<Vec<ImportRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} \
         FROM import_records \
         WHERE ($1::TEXT IS NULL OR status = $1) \
           AND ($2::BOOL IS NULL OR (city_id IS NOT NULL) = $2) \
           AND ($3::BOOL IS NULL OR (category_id IS NOT NULL) = $3) \
           AND ($4::BOOL IS NULL OR (email IS NOT NULL) = $4) \
           AND ($5::BOOL IS NULL OR (phone IS NOT NULL) = $5) \
           AND ($6::BOOL IS NULL OR (website IS NOT NULL) = $6) \
         ORDER BY created_at, id \
         LIMIT $7"
    ))
    .bind(filter.status.map(ImportStatus::as_str))
    .bind(filter.city_resolved)
    .bind(filter.category_resolved)
    .bind(filter.has_email)
    .bind(filter.has_phone)
    .bind(filter.has_website)
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Applies a partial update to one import record. `None` fields keep their
/// current value.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_import(
    pool: &PgPool,
    id: Uuid,
    update: &ImportUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_records \
         SET city_raw          = COALESCE($2, city_raw), \
             city_id           = COALESCE($3, city_id), \
             category_id       = COALESCE($4, category_id), \
             status            = COALESCE($5, status), \
             status_reason     = COALESCE($6, status_reason), \
             processed_at      = COALESCE($7, processed_at), \
             created_vendor_id = COALESCE($8, created_vendor_id), \
             merged_into       = COALESCE($9, merged_into), \
             updated_at        = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(update.city_raw.as_deref())
    .bind(update.city_id)
    .bind(update.category_id)
    .bind(update.status.map(ImportStatus::as_str))
    .bind(update.status_reason.as_deref())
    .bind(update.processed_at)
    .bind(update.created_vendor_id)
    .bind(update.merged_into)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Permanently removes records. Returns the number actually deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_imports(pool: &PgPool, ids: &[Uuid]) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM import_records WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Counts records in one lifecycle status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_imports_by_status(
    pool: &PgPool,
    status: ImportStatus,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM import_records WHERE status = $1",
    )
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Materializes a vendor from an import and marks the import approved, in one
/// transaction. Either both writes land or neither does.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the import id does not exist (or was
/// approved concurrently), [`DbError::MalformedRow`] if the social media
/// payload cannot be serialized, or [`DbError::Sqlx`] on query failure.
pub async fn approve_import(
    pool: &PgPool,
    import_id: Uuid,
    vendor: &NewVendor,
) -> Result<(), DbError> {
    let social_media = serde_json::to_value(&vendor.social_media)
        .map_err(|e| DbError::MalformedRow(format!("social_media: {e}")))?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO vendors \
           (id, business_name, category, city, zip, state, country, description, \
            price_range, email, phone, website, source_url, source_name, social_media) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(vendor.id)
    .bind(&vendor.business_name)
    .bind(&vendor.category)
    .bind(&vendor.city)
    .bind(vendor.zip.as_deref())
    .bind(vendor.state.as_deref())
    .bind(vendor.country.as_deref())
    .bind(vendor.description.as_deref())
    .bind(vendor.price_range.as_deref())
    .bind(vendor.email.as_deref())
    .bind(vendor.phone.as_deref())
    .bind(vendor.website.as_deref())
    .bind(vendor.source_url.as_deref())
    .bind(vendor.source_name.as_deref())
    .bind(social_media)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(
        "UPDATE import_records \
         SET status = 'approved', created_vendor_id = $2, processed_at = NOW(), \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(import_id)
    .bind(vendor.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}
