//! Database schema for the topic-scoped UTXO graph.
//!
//! Reference: spec.md §6 "Storage contract" indicative schema.

use rusqlite::Connection;

use overlay_storage::StorageError;

pub const INITIAL_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS outputs (
    txid TEXT NOT NULL,
    output_index INTEGER NOT NULL,
    topic TEXT NOT NULL,
    output_script BLOB NOT NULL,
    satoshis INTEGER NOT NULL,
    beef BLOB NOT NULL,
    spent INTEGER NOT NULL DEFAULT 0,
    outputs_consumed TEXT NOT NULL DEFAULT '[]',
    consumed_by TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (txid, output_index, topic)
);

CREATE INDEX IF NOT EXISTS idx_outputs_txid ON outputs(txid);
CREATE INDEX IF NOT EXISTS idx_outputs_topic_spent ON outputs(topic, spent);

CREATE TABLE IF NOT EXISTS applied_transactions (
    txid TEXT NOT NULL,
    topic TEXT NOT NULL,
    PRIMARY KEY (txid, topic)
);
"#;

pub fn apply_initial_migration(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(INITIAL_MIGRATION)
        .map_err(|e| StorageError::Backend(format!("migration failed: {e}")))?;
    Ok(())
}

pub fn is_initialized(conn: &Connection) -> Result<bool, StorageError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='outputs'",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StorageError::Backend(format!("failed to check initialization: {e}")))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_the_outputs_and_applied_transactions_tables() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!is_initialized(&conn).unwrap());

        apply_initial_migration(&conn).unwrap();
        assert!(is_initialized(&conn).unwrap());

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"outputs".to_string()));
        assert!(tables.contains(&"applied_transactions".to_string()));
    }
}
