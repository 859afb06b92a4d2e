//! SQLite-backed implementation of [`overlay_storage::Storage`].
//!
//! Reference: spec.md §6 "Storage contract". Mirrors the teacher's
//! `StorageSqlite` shape (an `Arc<Mutex<Connection>>` plus per-concern
//! `*_ops` modules), applied to the topic-scoped UTXO graph instead of a
//! wallet's entity tables.

mod migrations;
mod output_ops;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use overlay_storage::{AppliedTransaction, Coin, Output, SpentFilter, Storage, StorageError, StorageResult};

pub struct StorageSqlite {
    conn: Arc<Mutex<Connection>>,
}

impl StorageSqlite {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::Backend(format!("failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Backend(format!("failed to create in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Backend(format!("failed to enable foreign keys: {e}")))?;
        if !migrations::is_initialized(&conn)? {
            migrations::apply_initial_migration(&conn)?;
        }
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }
}

#[async_trait]
impl Storage for StorageSqlite {
    async fn find_output(
        &self,
        txid: &str,
        output_index: u32,
        topic: Option<&str>,
        spent: SpentFilter,
    ) -> StorageResult<Option<Output>> {
        output_ops::find_output(&self.conn, txid, output_index, topic, spent)
    }

    async fn find_outputs_for_transaction(&self, txid: &str) -> StorageResult<Vec<Output>> {
        output_ops::find_outputs_for_transaction(&self.conn, txid)
    }

    async fn insert_output(&self, output: Output) -> StorageResult<()> {
        output_ops::insert_output(&self.conn, output)
    }

    async fn delete_output(&self, txid: &str, output_index: u32, topic: &str) -> StorageResult<()> {
        output_ops::delete_output(&self.conn, txid, output_index, topic)
    }

    async fn mark_utxo_as_spent(&self, txid: &str, output_index: u32, topic: &str) -> StorageResult<()> {
        output_ops::mark_utxo_as_spent(&self.conn, txid, output_index, topic)
    }

    async fn update_consumed_by(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        new_set: std::collections::BTreeSet<Coin>,
    ) -> StorageResult<()> {
        output_ops::update_consumed_by(&self.conn, txid, output_index, topic, new_set)
    }

    async fn update_output_beef(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        beef: Vec<u8>,
    ) -> StorageResult<()> {
        output_ops::update_output_beef(&self.conn, txid, output_index, topic, beef)
    }

    async fn does_applied_transaction_exist(&self, txid: &str, topic: &str) -> StorageResult<bool> {
        output_ops::does_applied_transaction_exist(&self.conn, txid, topic)
    }

    async fn insert_applied_transaction(&self, applied: AppliedTransaction) -> StorageResult<()> {
        output_ops::insert_applied_transaction(&self.conn, &applied.txid, &applied.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(txid: &str, output_index: u32) -> Coin {
        Coin::new(txid, output_index)
    }

    #[tokio::test]
    async fn inserts_and_finds_an_output() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let output = Output::new("a".repeat(64), 0, "t", vec![0x51], 1_000, vec![1, 2, 3]);

        storage.insert_output(output.clone()).await.unwrap();

        let found = storage
            .find_output(&"a".repeat(64), 0, Some("t"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.satoshis, 1_000);
        assert!(!found.spent);
    }

    #[tokio::test]
    async fn marks_spent_and_filters_by_spent_state() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let txid = "b".repeat(64);
        storage
            .insert_output(Output::new(txid.clone(), 0, "t", vec![], 500, vec![]))
            .await
            .unwrap();

        storage.mark_utxo_as_spent(&txid, 0, "t").await.unwrap();

        assert!(storage.find_output(&txid, 0, Some("t"), Some(false)).await.unwrap().is_none());
        assert!(storage.find_output(&txid, 0, Some("t"), Some(true)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn tracks_outputs_consumed_and_consumed_by() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let parent_txid = "c".repeat(64);
        let child_txid = "d".repeat(64);

        storage
            .insert_output(Output::new(parent_txid.clone(), 0, "t", vec![], 1_000, vec![]))
            .await
            .unwrap();

        let mut child = Output::new(child_txid.clone(), 0, "t", vec![], 900, vec![]);
        child.outputs_consumed = vec![coin(&parent_txid, 0)];
        storage.insert_output(child).await.unwrap();

        let mut consumed_by = std::collections::BTreeSet::new();
        consumed_by.insert(coin(&child_txid, 0));
        storage.update_consumed_by(&parent_txid, 0, "t", consumed_by.clone()).await.unwrap();

        let parent = storage.find_output(&parent_txid, 0, Some("t"), None).await.unwrap().unwrap();
        assert_eq!(parent.consumed_by, consumed_by);

        let child = storage.find_output(&child_txid, 0, Some("t"), None).await.unwrap().unwrap();
        assert_eq!(child.outputs_consumed, vec![coin(&parent_txid, 0)]);
    }

    #[tokio::test]
    async fn deletes_an_output() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let txid = "e".repeat(64);
        storage.insert_output(Output::new(txid.clone(), 0, "t", vec![], 1, vec![])).await.unwrap();

        storage.delete_output(&txid, 0, "t").await.unwrap();

        assert!(storage.find_output(&txid, 0, Some("t"), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tracks_applied_transactions_per_topic() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let txid = "f".repeat(64);

        assert!(!storage.does_applied_transaction_exist(&txid, "t").await.unwrap());

        storage
            .insert_applied_transaction(AppliedTransaction::new(txid.clone(), "t"))
            .await
            .unwrap();

        assert!(storage.does_applied_transaction_exist(&txid, "t").await.unwrap());
        assert!(!storage.does_applied_transaction_exist(&txid, "other").await.unwrap());
    }

    #[tokio::test]
    async fn update_output_beef_overwrites_the_stored_envelope() {
        let storage = StorageSqlite::new_in_memory().unwrap();
        let txid = "1".repeat(64);
        storage.insert_output(Output::new(txid.clone(), 0, "t", vec![], 1, vec![1])).await.unwrap();

        storage.update_output_beef(&txid, 0, "t", vec![9, 9, 9]).await.unwrap();

        let found = storage.find_output(&txid, 0, Some("t"), None).await.unwrap().unwrap();
        assert_eq!(found.beef, vec![9, 9, 9]);
    }
}
