//! Review command handlers: approve, reject, duplicate, merge, delete.

use std::time::Duration;

use uuid::Uuid;

use vendir_core::{AppConfig, ImportStore};
use vendir_db::PgStore;
use vendir_engine::{
    apply_merge, bulk_approve, bulk_reject, mark_duplicate, DeleteGate, MergeField, MergePlan,
};
use vendir_match::LookupIndex;

async fn build_index(store: &PgStore) -> anyhow::Result<LookupIndex> {
    use vendir_core::CanonicalSource;

    let cities = store.list_cities().await?;
    let categories = store.list_categories().await?;
    Ok(LookupIndex::build(&cities, &categories))
}

/// Approves each id independently; one bad id does not abort the rest.
pub(crate) async fn run_approve(store: &PgStore, ids: &[Uuid]) -> anyhow::Result<()> {
    let index = build_index(store).await?;
    let outcome = bulk_approve(store, &index, ids).await?;

    for id in &outcome.succeeded {
        let vendor_id = store
            .get_import(*id)
            .await?
            .and_then(|r| r.created_vendor_id);
        match vendor_id {
            Some(vendor_id) => println!("approved {id} -> vendor {vendor_id}"),
            None => println!("approved {id}"),
        }
    }
    for (id, reason) in &outcome.failed {
        eprintln!("error: could not approve {id}: {reason}");
    }
    println!(
        "{} approved, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    );
    Ok(())
}

pub(crate) async fn run_reject(
    store: &PgStore,
    ids: &[Uuid],
    reason: Option<&str>,
) -> anyhow::Result<()> {
    let outcome = bulk_reject(store, ids, reason).await?;
    for (id, reason) in &outcome.failed {
        eprintln!("error: could not reject {id}: {reason}");
    }
    println!(
        "{} rejected, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    );
    Ok(())
}

pub(crate) async fn run_duplicate(
    store: &PgStore,
    import_id: Uuid,
    vendor_id: Uuid,
) -> anyhow::Result<()> {
    mark_duplicate(store, import_id, vendor_id).await?;
    println!("flagged {import_id} as duplicate of vendor {vendor_id}");
    Ok(())
}

/// Builds the merge plan, prints every decision, and applies it unless
/// `dry_run` is set.
pub(crate) async fn run_merge(
    store: &PgStore,
    import_id: Uuid,
    vendor_id: Uuid,
    select: &[MergeField],
    deselect: &[MergeField],
    dry_run: bool,
) -> anyhow::Result<()> {
    let record = store
        .get_import(import_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("import '{import_id}' not found"))?;
    let vendor = store
        .get_vendor(vendor_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("vendor '{vendor_id}' not found"))?;

    let mut plan = MergePlan::auto_fill(&record, &vendor);
    for &field in select {
        plan.set_selected(field, true);
    }
    for &field in deselect {
        plan.set_selected(field, false);
    }

    println!(
        "merging import '{}' into vendor '{}':",
        record.business_name, vendor.business_name
    );
    for decision in &plan.decisions {
        let mark = if decision.selected { "x" } else { " " };
        println!(
            "  [{mark}] {:<12} import: {:<30} vendor: {}",
            decision.field.as_str(),
            decision.incoming.as_deref().unwrap_or("-"),
            decision.existing.as_deref().unwrap_or("-"),
        );
    }

    if dry_run {
        println!("dry-run: nothing applied");
        return Ok(());
    }

    apply_merge(store, &plan).await?;
    println!(
        "merged {} fields; import {import_id} rejected with reference to vendor {vendor_id}",
        plan.selected_count()
    );
    Ok(())
}

/// Two-phase delete. Without `--yes` the command only previews the records;
/// with it, the request and confirmation run back to back in-process.
pub(crate) async fn run_delete(
    store: &PgStore,
    config: &AppConfig,
    ids: &[Uuid],
    yes: bool,
) -> anyhow::Result<()> {
    for id in ids {
        match store.get_import(*id).await? {
            Some(record) => println!(
                "would delete {id}: '{}' ({}, {})",
                record.business_name, record.status, record.city_raw
            ),
            None => println!("would delete {id}: not found"),
        }
    }

    if !yes {
        println!(
            "{} records selected; re-run with --yes to delete permanently",
            ids.len()
        );
        return Ok(());
    }

    let gate = DeleteGate::new(Duration::from_secs(config.delete_token_ttl_secs));
    let token = gate.request(ids).await;
    let deleted = gate.confirm(store, token).await?;
    println!("deleted {deleted} of {} records", ids.len());
    Ok(())
}
