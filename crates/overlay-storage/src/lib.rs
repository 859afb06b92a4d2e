//! Storage contract for the overlay services engine's topic-scoped UTXO graph.
//!
//! Reference: spec.md §6 "Storage contract". Concrete engines plug in an
//! implementation of [`Storage`] (see `overlay-storage-sqlite`); the engine
//! itself (`overlay-core`) only ever talks to this trait.

pub mod error;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use types::{AppliedTransaction, Coin, Output};

use async_trait::async_trait;

/// Optional predicate narrowing [`Storage::find_output`] to unspent outputs.
pub type SpentFilter = Option<bool>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a single output. When `topic` is `None`, matches across all
    /// topics (returning any one match). When `spent` is `Some(false)`,
    /// spent outputs are excluded.
    async fn find_output(
        &self,
        txid: &str,
        output_index: u32,
        topic: Option<&str>,
        spent: SpentFilter,
    ) -> StorageResult<Option<Output>>;

    /// All outputs created by `txid`, across every topic it was admitted
    /// under.
    async fn find_outputs_for_transaction(&self, txid: &str) -> StorageResult<Vec<Output>>;

    async fn insert_output(&self, output: Output) -> StorageResult<()>;

    async fn delete_output(&self, txid: &str, output_index: u32, topic: &str) -> StorageResult<()>;

    async fn mark_utxo_as_spent(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
    ) -> StorageResult<()>;

    /// Replace `consumed_by` wholesale with `new_set` (already deduplicated
    /// by the caller).
    async fn update_consumed_by(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        new_set: std::collections::BTreeSet<Coin>,
    ) -> StorageResult<()>;

    async fn update_output_beef(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        beef: Vec<u8>,
    ) -> StorageResult<()>;

    async fn does_applied_transaction_exist(
        &self,
        txid: &str,
        topic: &str,
    ) -> StorageResult<bool>;

    async fn insert_applied_transaction(&self, applied: AppliedTransaction) -> StorageResult<()>;
}
