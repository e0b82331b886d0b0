//! Batch reconciliation sweep over pending import records.
//!
//! One pass loads the canonical snapshot, walks every pending record, runs
//! the city and category cascades where they are still needed, and writes
//! back only when something actually changed. Already-resolved fields are
//! skipped so a re-run never spends AI budget twice, which also makes a
//! second sweep over clean data a zero-write no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use vendir_core::{
    CanonicalSource, CountryHint, ImportFilter, ImportRecord, ImportStore, ImportUpdate,
    SuggestError, SuggestionService,
};
use vendir_match::{
    needs_category_resolution, parse_location, resolve_category, resolve_city, LookupIndex,
    MatchMethod, ParsedLocation,
};

use crate::error::EngineError;

/// Cooperative cancellation handle, checked between records.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Cap on how many pending records to load. `None` means all.
    pub limit: Option<i64>,
    /// Resolve but never write.
    pub dry_run: bool,
    /// Progress log cadence, in records.
    pub progress_every: u64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            limit: None,
            dry_run: false,
            progress_every: 25,
        }
    }
}

/// A name-level match whose id is missing from the canonical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanMatch {
    pub import_id: Uuid,
    /// `"city"` or `"category"`.
    pub kind: &'static str,
    pub name: String,
}

/// Counters for one sweep pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: u64,
    pub cities_resolved: u64,
    pub categories_resolved: u64,
    /// Cities resolved through postal geography alone.
    pub zip_matches: u64,
    /// Cities that needed (and spent) a suggestion call.
    pub ai_city_matches: u64,
    /// Categories that needed a suggestion call.
    pub ai_category_matches: u64,
    /// Records written back (or that would be, under dry-run).
    pub updated: u64,
    /// Records walked without any change.
    pub unchanged: u64,
    /// Records skipped because of a non-rate-limit resolution or store error.
    pub failed: u64,
    /// Records skipped because the suggestion provider is rate limited.
    pub rate_limited: u64,
    pub orphans: Vec<OrphanMatch>,
    pub cancelled: bool,
    pub dry_run: bool,
}

/// What resolving one record produced. A `Resolved` outcome carries the
/// match method per stage so the summary can break hits down by source.
enum RecordOutcome {
    Resolved {
        update: ImportUpdate,
        city_method: Option<MatchMethod>,
        category_method: Option<MatchMethod>,
    },
    RateLimited,
    Failed(SuggestError),
}

/// Runs one reconciliation sweep.
///
/// Per-record failures are tolerated: a bad record is counted and skipped,
/// never aborting the pass. Only store-level failures on the initial load
/// abort the sweep.
///
/// # Errors
///
/// [`EngineError::Store`] when loading the canonical snapshot or the pending
/// queue fails.
pub async fn run_sweep(
    store: &dyn ImportStore,
    canonical: &dyn CanonicalSource,
    ai: Option<&dyn SuggestionService>,
    options: &SweepOptions,
    cancel: &CancelToken,
) -> Result<SweepSummary, EngineError> {
    let cities = canonical.list_cities().await?;
    let categories = canonical.list_categories().await?;
    let index = LookupIndex::build(&cities, &categories);

    let filter = ImportFilter {
        limit: options.limit,
        ..ImportFilter::pending()
    };
    let records = store.list_imports(&filter).await?;

    tracing::info!(
        pending = records.len(),
        cities = cities.len(),
        categories = categories.len(),
        dry_run = options.dry_run,
        "sweep started"
    );

    let mut summary = SweepSummary {
        dry_run: options.dry_run,
        ..SweepSummary::default()
    };

    for record in &records {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            tracing::warn!(scanned = summary.scanned, "sweep cancelled");
            break;
        }
        summary.scanned += 1;

        match resolve_record(record, &index, ai, &mut summary.orphans).await {
            RecordOutcome::Resolved {
                update,
                city_method,
                category_method,
            } => {
                if let Some(method) = city_method {
                    summary.cities_resolved += 1;
                    match method {
                        MatchMethod::ZipRegion => summary.zip_matches += 1,
                        MatchMethod::Ai => summary.ai_city_matches += 1,
                        _ => {}
                    }
                }
                if let Some(method) = category_method {
                    summary.categories_resolved += 1;
                    if method == MatchMethod::Ai {
                        summary.ai_category_matches += 1;
                    }
                }

                if update.is_empty() {
                    summary.unchanged += 1;
                } else if options.dry_run {
                    summary.updated += 1;
                    tracing::debug!(import_id = %record.id, ?update, "dry-run: would update");
                } else {
                    match store.update_import(record.id, &update).await {
                        Ok(()) => summary.updated += 1,
                        Err(err) => {
                            summary.failed += 1;
                            tracing::error!(import_id = %record.id, error = %err, "write-back failed");
                        }
                    }
                }
            }
            RecordOutcome::RateLimited => {
                summary.rate_limited += 1;
                tracing::debug!(import_id = %record.id, "skipped: provider rate limited");
            }
            RecordOutcome::Failed(err) => {
                summary.failed += 1;
                tracing::error!(import_id = %record.id, error = %err, "record resolution failed");
            }
        }

        if options.progress_every > 0 && summary.scanned % options.progress_every == 0 {
            tracing::info!(
                scanned = summary.scanned,
                total = records.len(),
                updated = summary.updated,
                zip_matches = summary.zip_matches,
                ai_city_matches = summary.ai_city_matches,
                ai_category_matches = summary.ai_category_matches,
                failed = summary.failed,
                "sweep progress"
            );
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        cities = summary.cities_resolved,
        categories = summary.categories_resolved,
        zip_matches = summary.zip_matches,
        ai_city_matches = summary.ai_city_matches,
        ai_category_matches = summary.ai_category_matches,
        updated = summary.updated,
        unchanged = summary.unchanged,
        failed = summary.failed,
        rate_limited = summary.rate_limited,
        orphans = summary.orphans.len(),
        "sweep finished"
    );
    Ok(summary)
}

/// Runs both cascades for one record and assembles its partial update.
async fn resolve_record(
    record: &ImportRecord,
    index: &LookupIndex,
    ai: Option<&dyn SuggestionService>,
    orphans: &mut Vec<OrphanMatch>,
) -> RecordOutcome {
    let mut update = ImportUpdate::default();
    let mut city_method = None;
    let mut category_method = None;

    // City stage, skipped when the record already carries a valid id.
    let city_settled = record.city_id.is_some_and(|id| index.has_city_id(id));
    if !city_settled {
        let parsed = parse_location(&record.city_raw);
        let resolution = match resolve_city(&parsed, index, ai).await {
            Ok(resolution) => resolution,
            Err(SuggestError::RateLimited { .. }) => return RecordOutcome::RateLimited,
            Err(err) => return RecordOutcome::Failed(err),
        };

        if resolution.method.is_resolved() {
            city_method = Some(resolution.method);
            if resolution.orphan {
                orphans.push(OrphanMatch {
                    import_id: record.id,
                    kind: "city",
                    name: resolution
                        .canonical_name
                        .clone()
                        .unwrap_or_else(|| resolution.city.clone()),
                });
            }
            if resolution.city_id != record.city_id {
                update.city_id = resolution.city_id;
            }

            // Write-back keeps the structured form so re-parsing yields the
            // same zip and hint.
            let rewritten = ParsedLocation {
                city: resolution.city.clone(),
                zip: resolution.zip.clone(),
                country_hint: parsed.country_hint.or_else(|| {
                    resolution
                        .country
                        .as_deref()
                        .and_then(CountryHint::from_prefix)
                }),
            }
            .recombine();
            if rewritten != record.city_raw {
                update.city_raw = Some(rewritten);
            }
        } else if resolution.method == MatchMethod::None {
            tracing::debug!(
                import_id = %record.id,
                city_raw = %record.city_raw,
                "city unresolved"
            );
        }
    }

    // Category stage.
    if needs_category_resolution(&record.category_raw, record.category_id, index) {
        let resolution = match resolve_category(&record.category_raw, index, ai).await {
            Ok(resolution) => resolution,
            Err(SuggestError::RateLimited { .. }) => return RecordOutcome::RateLimited,
            Err(err) => return RecordOutcome::Failed(err),
        };

        if resolution.method.is_resolved() {
            category_method = Some(resolution.method);
            if resolution.orphan {
                orphans.push(OrphanMatch {
                    import_id: record.id,
                    kind: "category",
                    name: resolution.name.clone().unwrap_or_default(),
                });
            }
            if resolution.category_id != record.category_id {
                update.category_id = resolution.category_id;
            }
        }
    }

    RecordOutcome::Resolved {
        update,
        city_method,
        category_method,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::approve;
    use crate::testutil::{
        import_record, import_with_city, test_canonical, test_index, MemoryStore, ScriptedAi,
    };
    use vendir_core::ImportStatus;

    fn options() -> SweepOptions {
        SweepOptions {
            progress_every: 0,
            ..SweepOptions::default()
        }
    }

    #[tokio::test]
    async fn sweep_resolves_and_rewrites_pending_records() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "AT-3021 Pressbaum"));

        let summary = run_sweep(&store, &canonical, None, &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.cities_resolved, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 0);

        let record = store.imports()[0].clone();
        assert_eq!(record.city_id, Some(1));
        assert_eq!(record.city_raw, "AT-3021 Wien (Vienna) [eski: Pressbaum]");
    }

    #[tokio::test]
    async fn second_sweep_is_a_zero_write_no_op() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        let mut record = import_with_city(1, "AT-3021 Pressbaum");
        record.category_raw = "Catering".to_owned();
        store.insert_import(record);

        let first = run_sweep(&store, &canonical, None, &options(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(first.updated, 1);

        let writes_after_first = store.update_calls();
        let second = run_sweep(&store, &canonical, None, &options(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(store.update_calls(), writes_after_first);
    }

    #[tokio::test]
    async fn resolved_records_never_hit_the_ai_again() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        let mut record = import_with_city(1, "Totally Unmatchable Place");
        record.city_id = Some(1);
        record.category_raw = "Catering".to_owned();
        record.category_id = Some(2);
        store.insert_import(record);

        let ai = ScriptedAi::answering(Some("Wien (Vienna)"), Some("Catering"));
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.unchanged, 1);
        assert_eq!(ai.total_calls(), 0);
    }

    #[tokio::test]
    async fn per_record_failures_do_not_abort_the_pass() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        // Ten unresolvable-by-table records; the AI fails on the fifth.
        for i in 0..10 {
            store.insert_import(import_with_city(i, &format!("Mysteryville{i}")));
        }

        let ai = ScriptedAi::failing_on_call(5, Some("Wien (Vienna)"));
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.scanned, 10);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cities_resolved, 9);
    }

    #[tokio::test]
    async fn rate_limited_records_are_counted_separately() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "Mysteryville"));
        store.insert_import(import_with_city(2, "Otherville"));

        let ai = ScriptedAi::always_rate_limited();
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.rate_limited, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.updated, 0);
    }

    #[tokio::test]
    async fn dry_run_resolves_without_writing() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "AT-3021 Pressbaum"));

        let opts = SweepOptions {
            dry_run: true,
            ..options()
        };
        let summary = run_sweep(&store, &canonical, None, &opts, &CancelToken::new())
            .await
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.updated, 1);
        assert_eq!(store.update_calls(), 0);
        assert_eq!(store.imports()[0].city_id, None);
    }

    #[tokio::test]
    async fn cancellation_stops_between_records() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        for i in 0..5 {
            store.insert_import(import_with_city(i, "AT-3021 Pressbaum"));
        }

        let cancel = CancelToken::new();
        cancel.cancel();
        let summary = run_sweep(&store, &canonical, None, &options(), &cancel)
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.scanned, 0);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn orphan_matches_surface_in_the_summary() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "Mysteryville"));

        // The oracle answers with a name absent from the canonical table.
        let ai = ScriptedAi::answering(Some("Atlantis"), None);
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.orphans.len(), 1);
        assert_eq!(summary.orphans[0].kind, "city");
        assert_eq!(summary.orphans[0].name, "Atlantis");
        // Name matched, id missing: the id write never happens.
        assert_eq!(store.imports()[0].city_id, None);
    }

    #[tokio::test]
    async fn limit_caps_the_pending_queue() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        for i in 0..4 {
            store.insert_import(import_with_city(i, "AT-3021 Pressbaum"));
        }

        let opts = SweepOptions {
            limit: Some(2),
            ..options()
        };
        let summary = run_sweep(&store, &canonical, None, &opts, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(summary.scanned, 2);
    }

    #[tokio::test]
    async fn non_pending_records_are_ignored() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        let mut record = import_with_city(1, "AT-3021 Pressbaum");
        record.status = ImportStatus::Rejected;
        store.insert_import(record);

        let summary = run_sweep(&store, &canonical, None, &options(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(summary.scanned, 0);
    }

    #[tokio::test]
    async fn ai_city_answer_gets_the_ai_audit_tag() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "Mysteryville"));

        let ai = ScriptedAi::answering(Some("Wien (Vienna)"), None);
        run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        let record = store.imports()[0].clone();
        assert_eq!(record.city_raw, "Wien (Vienna) [AI: Mysteryville]");
        assert_eq!(record.city_id, Some(1));
    }

    #[tokio::test]
    async fn summary_breaks_matches_down_by_source() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        store.insert_import(import_with_city(1, "AT-3021 Pressbaum"));
        store.insert_import(import_with_city(2, "10115 Mysteryville"));
        store.insert_import(import_with_city(3, "Mysteryville"));

        let ai = ScriptedAi::answering(Some("Wien (Vienna)"), None);
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(summary.cities_resolved, 3);
        assert_eq!(summary.zip_matches, 1);
        assert_eq!(summary.ai_city_matches, 1);
        assert_eq!(summary.ai_category_matches, 0);
        assert_eq!(ai.total_calls(), 1);
    }

    #[tokio::test]
    async fn sweep_then_approve_yields_the_final_vendor() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        let mut record = import_with_city(1, "A-3021 Pressbaum");
        record.category_raw = "Hochzeitsfotograf".to_owned();
        store.insert_import(record.clone());

        let ai = ScriptedAi::answering(None, Some("Wedding Photography"));
        let summary = run_sweep(&store, &canonical, Some(&ai), &options(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(summary.cities_resolved, 1);
        assert_eq!(summary.categories_resolved, 1);
        assert_eq!(summary.ai_category_matches, 1);
        // The alias hit resolves the city without spending a suggestion call.
        assert_eq!(summary.ai_city_matches, 0);
        assert_eq!(ai.total_calls(), 1);

        let vendor_id = approve(&store, &test_index(), record.id).await.unwrap();
        let created = store.get_vendor(vendor_id).await.unwrap().unwrap();
        assert_eq!(created.city, "Wien (Vienna)");
        assert_eq!(created.country.as_deref(), Some("AT"));
        assert_eq!(created.category, "Wedding Photography");
        assert_eq!(created.zip.as_deref(), Some("3021"));
    }

    #[tokio::test]
    async fn category_sentinel_is_resolved_even_with_an_existing_id() {
        let store = MemoryStore::new();
        let canonical = test_canonical();
        let mut record = import_record(1);
        record.city_id = Some(1);
        record.category_raw = "Catering".to_owned();
        record.category_id = Some(999); // stale id, absent from the table
        store.insert_import(record);

        let summary = run_sweep(&store, &canonical, None, &options(), &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(summary.categories_resolved, 1);
        assert_eq!(store.imports()[0].category_id, Some(2));
    }
}
