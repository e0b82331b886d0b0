//! Reconciliation engine: duplicate merging, the import lifecycle state
//! machine, and the batch sweep orchestrator.
//!
//! Everything here is generic over the [`vendir_core::ImportStore`] and
//! [`vendir_core::SuggestionService`] contracts; the engine never talks to
//! Postgres or HTTP directly.

pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::EngineError;
pub use lifecycle::{
    approve, bulk_approve, bulk_reject, mark_duplicate, reject, BulkOutcome, DeleteGate,
};
pub use merge::{apply_merge, MergeDecision, MergeField, MergePlan};
pub use sweep::{run_sweep, CancelToken, OrphanMatch, SweepOptions, SweepSummary};
