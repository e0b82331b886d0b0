//! Status command handler.

use vendir_core::{ImportFilter, ImportStatus, ImportStore};
use vendir_db::PgStore;

/// Prints per-status queue counts plus how much of the pending queue still
/// needs resolution.
pub(crate) async fn run_status(store: &PgStore) -> anyhow::Result<()> {
    println!("import queue:");
    for status in ImportStatus::all() {
        let count = store.count_by_status(status).await?;
        println!("  {:<10} {count}", status.as_str());
    }

    let unresolved_cities = store
        .list_imports(&ImportFilter {
            city_resolved: Some(false),
            ..ImportFilter::pending()
        })
        .await?
        .len();
    let unresolved_categories = store
        .list_imports(&ImportFilter {
            category_resolved: Some(false),
            ..ImportFilter::pending()
        })
        .await?
        .len();
    println!(
        "pending with unresolved city: {unresolved_cities}, unresolved category: {unresolved_categories}"
    );

    Ok(())
}
