//! Offline unit tests for vendir-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use uuid::Uuid;
use vendir_core::{AppConfig, ImportStatus};
use vendir_db::{CityRow, ImportRow, PoolConfig, VendorRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        log_level: "info".to_string(),
        suggest_api_url: None,
        suggest_api_key: None,
        suggest_model: "gpt-4o-mini".to_string(),
        suggest_timeout_secs: 30,
        city_suggest_delay_ms: 1200,
        category_suggest_delay_ms: 800,
        suggest_cooldown_ms: 5000,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        sweep_progress_every: 25,
        delete_token_ttl_secs: 300,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn import_row(status: &str, social: serde_json::Value) -> ImportRow {
    ImportRow {
        id: Uuid::from_u128(1),
        business_name: "Test Venue".to_string(),
        city_raw: "AT-3021 Pressbaum".to_string(),
        category_raw: "Catering".to_string(),
        email: None,
        phone: None,
        website: None,
        description: None,
        price_range: None,
        source_url: None,
        source_name: None,
        social_media: social,
        duplicate_score: 40,
        city_id: None,
        category_id: None,
        status: status.to_string(),
        status_reason: None,
        processed_at: None,
        created_vendor_id: None,
        merged_into: None,
    }
}

#[test]
fn import_row_converts_to_record() {
    let social = serde_json::json!({
        "instagram": "https://ig.example/venue",
        "extra": { "tiktok": "https://t.example/venue" }
    });
    let record = vendir_core::ImportRecord::try_from(import_row("pending", social)).unwrap();

    assert_eq!(record.status, ImportStatus::Pending);
    assert_eq!(record.duplicate_score, 40);
    assert_eq!(
        record.social_media.instagram.as_deref(),
        Some("https://ig.example/venue")
    );
    assert_eq!(
        record.social_media.extra.get("tiktok").map(String::as_str),
        Some("https://t.example/venue")
    );
}

#[test]
fn import_row_with_unknown_status_is_malformed() {
    let row = import_row("archived", serde_json::json!({}));
    assert!(vendir_core::ImportRecord::try_from(row).is_err());
}

#[test]
fn import_row_with_bad_social_payload_is_malformed() {
    let row = import_row("pending", serde_json::json!({ "facebook": 42 }));
    assert!(vendir_core::ImportRecord::try_from(row).is_err());
}

#[test]
fn vendor_row_converts_to_vendor() {
    let row = VendorRow {
        id: Uuid::from_u128(10),
        business_name: "Existing Vendor".to_string(),
        category: "Catering".to_string(),
        city: "Wien (Vienna)".to_string(),
        zip: Some("1010".to_string()),
        state: Some("Wien".to_string()),
        country: Some("AT".to_string()),
        description: None,
        price_range: None,
        email: Some("a@x.com".to_string()),
        phone: None,
        website: None,
        source_url: None,
        source_name: None,
        social_media: serde_json::json!({}),
    };

    let vendor = vendir_core::Vendor::try_from(row).unwrap();
    assert_eq!(vendor.city, "Wien (Vienna)");
    assert_eq!(vendor.country.as_deref(), Some("AT"));
    assert!(vendor.social_media.is_empty());
}

#[test]
fn city_row_converts_with_aliases() {
    let row = CityRow {
        id: 1,
        name: "Wien (Vienna)".to_string(),
        alias_en: Some("Vienna".to_string()),
        alias_de: None,
        alias_tr: Some("Viyana".to_string()),
    };
    let city = vendir_core::CanonicalCity::from(row);
    let aliases: Vec<&str> = city.aliases.iter().collect();
    assert_eq!(aliases, vec!["Vienna", "Viyana"]);
}
