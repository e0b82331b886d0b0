//! Database operations for the canonical taxonomy tables.

use sqlx::PgPool;

use vendir_core::{CanonicalCategory, CanonicalCity, CityAliases};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `canonical_cities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CityRow {
    pub id: i64,
    pub name: String,
    pub alias_en: Option<String>,
    pub alias_de: Option<String>,
    pub alias_tr: Option<String>,
}

impl From<CityRow> for CanonicalCity {
    fn from(row: CityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            aliases: CityAliases {
                en: row.alias_en,
                de: row.alias_de,
                tr: row.alias_tr,
            },
        }
    }
}

/// A row from the `canonical_categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub label_key: String,
}

impl From<CategoryRow> for CanonicalCategory {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            label_key: row.label_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all canonical cities, ordered by id so the first-writer-wins index
/// build stays deterministic.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_canonical_cities(pool: &PgPool) -> Result<Vec<CityRow>, DbError> {
    let rows = sqlx::query_as::<_, CityRow>(
        "SELECT id, name, alias_en, alias_de, alias_tr \
         FROM canonical_cities \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all canonical categories, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_canonical_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, label_key \
         FROM canonical_categories \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
