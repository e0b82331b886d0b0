//! Sweep command handler.

use vendir_core::{AppConfig, SuggestionService};
use vendir_db::PgStore;
use vendir_engine::{run_sweep, CancelToken, SweepOptions};
use vendir_suggest::SuggestClient;

/// Runs one reconciliation sweep, with Ctrl-C finishing the current record
/// and stopping cleanly.
///
/// # Errors
///
/// Returns an error if the suggestion client is misconfigured (URL without a
/// key) or the initial store reads fail. Per-record failures are counted in
/// the summary, not propagated.
pub(crate) async fn run_sweep_command(
    store: &PgStore,
    config: &AppConfig,
    dry_run: bool,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let client = SuggestClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("suggestion client: {e}"))?;
    if client.is_none() {
        tracing::info!("no suggestion provider configured; AI fallback disabled");
    }
    let ai: Option<&dyn SuggestionService> =
        client.as_ref().map(|c| c as &dyn SuggestionService);

    let cancel = CancelToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current record");
            cancel_on_signal.cancel();
        }
    });

    let options = SweepOptions {
        limit,
        dry_run,
        progress_every: config.sweep_progress_every,
    };
    let summary = run_sweep(store, store, ai, &options, &cancel).await?;

    if summary.dry_run {
        println!("dry-run: no changes were written");
    }
    println!(
        "scanned {} records: {} cities resolved, {} categories resolved, {} updated, {} unchanged",
        summary.scanned,
        summary.cities_resolved,
        summary.categories_resolved,
        summary.updated,
        summary.unchanged
    );
    println!(
        "match sources: {} zip-region, {} AI city, {} AI category",
        summary.zip_matches, summary.ai_city_matches, summary.ai_category_matches
    );
    if summary.failed > 0 {
        println!("{} records failed and were skipped", summary.failed);
    }
    if summary.rate_limited > 0 {
        println!(
            "{} records skipped while the suggestion provider was rate limited",
            summary.rate_limited
        );
    }
    for orphan in &summary.orphans {
        println!(
            "orphan {}: import {} matched '{}' but the canonical table has no entry",
            orphan.kind, orphan.import_id, orphan.name
        );
    }
    if summary.cancelled {
        println!("sweep cancelled after {} records", summary.scanned);
    }

    Ok(())
}
