use thiserror::Error;
use uuid::Uuid;

use vendir_core::{ImportStatus, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Merge apply with nothing selected. Rejected at the boundary instead
    /// of being committed as a vacuous vendor update.
    #[error("no fields selected for merge")]
    EmptySelection,

    #[error("invalid status transition for import {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: ImportStatus,
        to: ImportStatus,
    },

    #[error("import record not found: {id}")]
    ImportNotFound { id: Uuid },

    #[error("vendor not found: {id}")]
    VendorNotFound { id: Uuid },

    #[error("unknown delete confirmation token")]
    UnknownDeleteToken,

    #[error("delete confirmation token expired")]
    ExpiredDeleteToken,

    #[error(transparent)]
    Store(#[from] StoreError),
}
