//! Storage error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("output not found: {txid}:{output_index} topic={topic}")]
    OutputNotFound {
        txid: String,
        output_index: u32,
        topic: String,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
