//! Import records and materialized vendors.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an [`ImportRecord`].
///
/// `Pending` is the only state the reconciliation sweep touches. The other
/// three are terminal for this pipeline; `Duplicate` can still leave via a
/// merge (which rejects the import) or an independent manual approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Duplicate,
    Rejected,
    Approved,
}

impl ImportStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Duplicate => "duplicate",
            ImportStatus::Rejected => "rejected",
            ImportStatus::Approved => "approved",
        }
    }

    /// All statuses, for dashboard-style per-status counting.
    #[must_use]
    pub fn all() -> [ImportStatus; 4] {
        [
            ImportStatus::Pending,
            ImportStatus::Duplicate,
            ImportStatus::Rejected,
            ImportStatus::Approved,
        ]
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportStatus::Pending),
            "duplicate" => Ok(ImportStatus::Duplicate),
            "rejected" => Ok(ImportStatus::Rejected),
            "approved" => Ok(ImportStatus::Approved),
            other => Err(format!("unknown import status: {other}")),
        }
    }
}

/// Social media links attached to a listing.
///
/// Known platforms get named fields so merge/diff logic can reason about them
/// by name; anything else the scraper picked up lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinterest: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl SocialMedia {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facebook.is_none()
            && self.instagram.is_none()
            && self.twitter.is_none()
            && self.youtube.is_none()
            && self.pinterest.is_none()
            && self.extra.is_empty()
    }
}

/// A scraped candidate listing awaiting reconciliation.
///
/// Raw fields are immutable inputs from the scraper. The sweep only ever
/// writes the resolved fields (`city_raw` rewrite, `city_id`, `category_id`);
/// lifecycle fields change through the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: Uuid,

    // Raw scraper output.
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
    pub social_media: SocialMedia,

    // Upstream duplicate heuristic, 0-100. Read-only here.
    pub duplicate_score: i16,

    // Resolved by the matcher.
    pub city_id: Option<i64>,
    pub category_id: Option<i64>,

    // Lifecycle.
    pub status: ImportStatus,
    pub status_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_vendor_id: Option<Uuid>,
    /// Vendor this import was merged into, when rejected via merge.
    pub merged_into: Option<Uuid>,
}

/// A live directory entry, materialized from an approved import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub business_name: String,
    /// Denormalized category name, not an id.
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
    pub social_media: SocialMedia,
}

/// Payload for materializing a vendor on approval.
///
/// The id is generated by the lifecycle engine before the store call so the
/// import record can reference it even if the store is not transactional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVendor {
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
    pub social_media: SocialMedia,
}
