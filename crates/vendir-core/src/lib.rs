//! Shared domain types and contracts for the vendir reconciliation pipeline.
//!
//! Everything the matching engine, the sweep orchestrator, and the storage
//! backends agree on lives here: the [`ImportRecord`] data model, the
//! canonical taxonomy types, the [`ImportStore`]/[`CanonicalSource`] storage
//! contracts, and the [`SuggestionService`] oracle contract.

pub mod app_config;
pub mod canonical;
pub mod records;
pub mod store;
pub mod suggest;

pub use app_config::AppConfig;
pub use canonical::{CanonicalCategory, CanonicalCity, CityAliases, CountryHint};
pub use records::{ImportRecord, ImportStatus, NewVendor, SocialMedia, Vendor};
pub use store::{
    CanonicalSource, ImportFilter, ImportStore, ImportUpdate, StoreError, VendorPatch,
};
pub use suggest::{SuggestError, SuggestionService};
