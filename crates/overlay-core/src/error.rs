//! The engine's error type.
//!
//! Reference: spec.md §7 ERROR HANDLING DESIGN. Variants the table marks
//! "swallowed" never appear here — they are logged at the point they occur
//! (see `engine.rs`) and folded into an empty STEAK entry or simply
//! dropped. Only the "surfaced" rows get a variant.

use thiserror::Error;

use crate::beef::BeefError;
use overlay_storage::StorageError;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("SPV verification failed for {txid}")]
    SpvInvalid { txid: String },

    #[error("unknown lookup service: {0}")]
    UnknownService(String),

    #[error("no outputs found for txid {0}")]
    NoMatchingOutputs(String),

    #[error("history rehydration failed: {0}")]
    HistoryRehydrationFailed(String),

    #[error("stale coin prune failed: {0}")]
    StalePruneFailed(String),

    #[error("service error: {0}")]
    Service(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Codec(#[from] BeefError),

    #[error(transparent)]
    Transaction(#[from] crate::transaction::TransactionError),
}

pub type OverlayResult<T> = Result<T, OverlayError>;
