//! Database operations for the `vendors` table.

use sqlx::PgPool;
use uuid::Uuid;

use vendir_core::{Vendor, VendorPatch};

use crate::DbError;

const VENDOR_COLUMNS: &str = "id, business_name, category, city, zip, state, country, \
     description, price_range, email, phone, website, source_url, source_name, social_media";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `vendors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VendorRow {
    pub id: Uuid,
    pub business_name: String,
    pub category: String,
    pub city: String,
    pub zip: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub social_media: serde_json::Value,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = DbError;

    fn try_from(row: VendorRow) -> Result<Self, Self::Error> {
        let social_media = serde_json::from_value(row.social_media)
            .map_err(|e| DbError::MalformedRow(format!("social_media: {e}")))?;

        Ok(Self {
            id: row.id,
            business_name: row.business_name,
            category: row.category,
            city: row.city,
            zip: row.zip,
            state: row.state,
            country: row.country,
            description: row.description,
            price_range: row.price_range,
            email: row.email,
            phone: row.phone,
            website: row.website,
            source_url: row.source_url,
            source_name: row.source_name,
            social_media,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a single vendor by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_vendor(pool: &PgPool, id: Uuid) -> Result<Option<VendorRow>, DbError> {
    let row = sqlx::query_as::<_, VendorRow>(&format!(
        "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Applies a merge patch to an existing vendor. `None` fields keep their
/// current value; the social media payload, when present, replaces the whole
/// JSONB column (the merge engine folds unselected platforms in beforehand).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id does not exist,
/// [`DbError::MalformedRow`] if the social media payload cannot be
/// serialized, or [`DbError::Sqlx`] if the query fails.
pub async fn patch_vendor(pool: &PgPool, id: Uuid, patch: &VendorPatch) -> Result<(), DbError> {
    let social_media = patch
        .social_media
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DbError::MalformedRow(format!("social_media: {e}")))?;

    let result = sqlx::query(
        "UPDATE vendors \
         SET email        = COALESCE($2, email), \
             phone        = COALESCE($3, phone), \
             website      = COALESCE($4, website), \
             description  = COALESCE($5, description), \
             price_range  = COALESCE($6, price_range), \
             social_media = COALESCE($7, social_media), \
             updated_at   = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(patch.email.as_deref())
    .bind(patch.phone.as_deref())
    .bind(patch.website.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.price_range.as_deref())
    .bind(social_media)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
