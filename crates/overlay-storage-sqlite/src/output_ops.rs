//! Row <-> [`Output`] mapping and the queries `StorageSqlite` delegates to.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use overlay_storage::{Coin, Output, SpentFilter, StorageError, StorageResult};

fn db_err(context: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(format!("{context}: {e}"))
}

fn row_to_output(row: &rusqlite::Row) -> rusqlite::Result<Output> {
    let outputs_consumed_json: String = row.get(6)?;
    let consumed_by_json: String = row.get(7)?;

    let outputs_consumed: Vec<Coin> = serde_json::from_str(&outputs_consumed_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;
    let consumed_by: BTreeSet<Coin> = serde_json::from_str(&consumed_by_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Output {
        txid: row.get(0)?,
        output_index: row.get(1)?,
        topic: row.get(2)?,
        output_script: row.get(3)?,
        satoshis: row.get::<_, i64>(4)? as u64,
        beef: row.get(5)?,
        spent: row.get::<_, i64>(8)? != 0,
        outputs_consumed,
        consumed_by,
    })
}

const SELECT_COLUMNS: &str =
    "txid, output_index, topic, output_script, satoshis, beef, outputs_consumed, consumed_by, spent";

pub fn find_output(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    output_index: u32,
    topic: Option<&str>,
    spent: SpentFilter,
) -> StorageResult<Option<Output>> {
    let conn = conn.lock().expect("connection lock poisoned");

    let output = match (topic, spent) {
        (Some(topic), Some(want_spent)) => conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM outputs WHERE txid = ?1 AND output_index = ?2 AND topic = ?3 AND spent = ?4"
                ),
                params![txid, output_index, topic, want_spent as i64],
                row_to_output,
            )
            .optional(),
        (Some(topic), None) => conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM outputs WHERE txid = ?1 AND output_index = ?2 AND topic = ?3"
                ),
                params![txid, output_index, topic],
                row_to_output,
            )
            .optional(),
        (None, Some(want_spent)) => conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM outputs WHERE txid = ?1 AND output_index = ?2 AND spent = ?3 LIMIT 1"
                ),
                params![txid, output_index, want_spent as i64],
                row_to_output,
            )
            .optional(),
        (None, None) => conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM outputs WHERE txid = ?1 AND output_index = ?2 LIMIT 1"
                ),
                params![txid, output_index],
                row_to_output,
            )
            .optional(),
    };

    output.map_err(|e| db_err("find_output", e))
}

pub fn find_outputs_for_transaction(conn: &Arc<Mutex<Connection>>, txid: &str) -> StorageResult<Vec<Output>> {
    let conn = conn.lock().expect("connection lock poisoned");
    let mut stmt = conn
        .prepare(&format!("SELECT {SELECT_COLUMNS} FROM outputs WHERE txid = ?1"))
        .map_err(|e| db_err("find_outputs_for_transaction (prepare)", e))?;
    let rows = stmt
        .query_map(params![txid], row_to_output)
        .map_err(|e| db_err("find_outputs_for_transaction (query)", e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| db_err("find_outputs_for_transaction (collect)", e))
}

pub fn insert_output(conn: &Arc<Mutex<Connection>>, output: Output) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    let outputs_consumed_json = serde_json::to_string(&output.outputs_consumed)?;
    let consumed_by_json = serde_json::to_string(&output.consumed_by)?;

    conn.execute(
        "INSERT INTO outputs
            (txid, output_index, topic, output_script, satoshis, beef, outputs_consumed, consumed_by, spent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(txid, output_index, topic) DO UPDATE SET
            output_script = excluded.output_script,
            satoshis = excluded.satoshis,
            beef = excluded.beef,
            outputs_consumed = excluded.outputs_consumed,
            consumed_by = excluded.consumed_by,
            spent = excluded.spent",
        params![
            output.txid,
            output.output_index,
            output.topic,
            output.output_script,
            output.satoshis as i64,
            output.beef,
            outputs_consumed_json,
            consumed_by_json,
            output.spent as i64,
        ],
    )
    .map_err(|e| db_err("insert_output", e))?;
    Ok(())
}

pub fn delete_output(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    output_index: u32,
    topic: &str,
) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    conn.execute(
        "DELETE FROM outputs WHERE txid = ?1 AND output_index = ?2 AND topic = ?3",
        params![txid, output_index, topic],
    )
    .map_err(|e| db_err("delete_output", e))?;
    Ok(())
}

pub fn mark_utxo_as_spent(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    output_index: u32,
    topic: &str,
) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    conn.execute(
        "UPDATE outputs SET spent = 1 WHERE txid = ?1 AND output_index = ?2 AND topic = ?3",
        params![txid, output_index, topic],
    )
    .map_err(|e| db_err("mark_utxo_as_spent", e))?;
    Ok(())
}

pub fn update_consumed_by(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    output_index: u32,
    topic: &str,
    new_set: BTreeSet<Coin>,
) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    let consumed_by_json = serde_json::to_string(&new_set)?;
    conn.execute(
        "UPDATE outputs SET consumed_by = ?1 WHERE txid = ?2 AND output_index = ?3 AND topic = ?4",
        params![consumed_by_json, txid, output_index, topic],
    )
    .map_err(|e| db_err("update_consumed_by", e))?;
    Ok(())
}

pub fn update_output_beef(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    output_index: u32,
    topic: &str,
    beef: Vec<u8>,
) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    conn.execute(
        "UPDATE outputs SET beef = ?1 WHERE txid = ?2 AND output_index = ?3 AND topic = ?4",
        params![beef, txid, output_index, topic],
    )
    .map_err(|e| db_err("update_output_beef", e))?;
    Ok(())
}

pub fn does_applied_transaction_exist(
    conn: &Arc<Mutex<Connection>>,
    txid: &str,
    topic: &str,
) -> StorageResult<bool> {
    let conn = conn.lock().expect("connection lock poisoned");
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM applied_transactions WHERE txid = ?1 AND topic = ?2",
            params![txid, topic],
            |row| row.get(0),
        )
        .map_err(|e| db_err("does_applied_transaction_exist", e))?;
    Ok(count > 0)
}

pub fn insert_applied_transaction(conn: &Arc<Mutex<Connection>>, txid: &str, topic: &str) -> StorageResult<()> {
    let conn = conn.lock().expect("connection lock poisoned");
    conn.execute(
        "INSERT OR IGNORE INTO applied_transactions (txid, topic) VALUES (?1, ?2)",
        params![txid, topic],
    )
    .map_err(|e| db_err("insert_applied_transaction", e))?;
    Ok(())
}
