//! In-memory fakes for exercising [`crate::engine::Engine`] without a real
//! storage backend or network.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use overlay_storage::{AppliedTransaction, Coin, Output, SpentFilter, Storage, StorageResult};

use crate::error::OverlayResult;
use crate::traits::{ChainTracker, LookupService, TopicManager};
use crate::transaction::Transaction;
use crate::types::{AdmittanceInstructions, LookupAnswer, LookupFormula, LookupOutcome, LookupQuestion};

type Key = (String, u32, String);

fn key(txid: &str, output_index: u32, topic: &str) -> Key {
    (txid.to_string(), output_index, topic.to_string())
}

#[derive(Default)]
pub struct InMemoryStorage {
    outputs: Mutex<HashMap<Key, Output>>,
    applied: Mutex<HashSet<(String, String)>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn find_output(
        &self,
        txid: &str,
        output_index: u32,
        topic: Option<&str>,
        spent: SpentFilter,
    ) -> StorageResult<Option<Output>> {
        let outputs = self.outputs.lock().await;
        let found = match topic {
            Some(topic) => outputs.get(&key(txid, output_index, topic)).cloned(),
            None => outputs
                .values()
                .find(|o| o.txid == txid && o.output_index == output_index)
                .cloned(),
        };
        Ok(found.filter(|o| match spent {
            Some(want_spent) => o.spent == want_spent,
            None => true,
        }))
    }

    async fn find_outputs_for_transaction(&self, txid: &str) -> StorageResult<Vec<Output>> {
        let outputs = self.outputs.lock().await;
        Ok(outputs.values().filter(|o| o.txid == txid).cloned().collect())
    }

    async fn insert_output(&self, output: Output) -> StorageResult<()> {
        let mut outputs = self.outputs.lock().await;
        outputs.insert(key(&output.txid, output.output_index, &output.topic), output);
        Ok(())
    }

    async fn delete_output(&self, txid: &str, output_index: u32, topic: &str) -> StorageResult<()> {
        let mut outputs = self.outputs.lock().await;
        outputs.remove(&key(txid, output_index, topic));
        Ok(())
    }

    async fn mark_utxo_as_spent(&self, txid: &str, output_index: u32, topic: &str) -> StorageResult<()> {
        let mut outputs = self.outputs.lock().await;
        if let Some(output) = outputs.get_mut(&key(txid, output_index, topic)) {
            output.spent = true;
        }
        Ok(())
    }

    async fn update_consumed_by(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        new_set: BTreeSet<Coin>,
    ) -> StorageResult<()> {
        let mut outputs = self.outputs.lock().await;
        if let Some(output) = outputs.get_mut(&key(txid, output_index, topic)) {
            output.consumed_by = new_set;
        }
        Ok(())
    }

    async fn update_output_beef(
        &self,
        txid: &str,
        output_index: u32,
        topic: &str,
        beef: Vec<u8>,
    ) -> StorageResult<()> {
        let mut outputs = self.outputs.lock().await;
        if let Some(output) = outputs.get_mut(&key(txid, output_index, topic)) {
            output.beef = beef;
        }
        Ok(())
    }

    async fn does_applied_transaction_exist(&self, txid: &str, topic: &str) -> StorageResult<bool> {
        let applied = self.applied.lock().await;
        Ok(applied.contains(&(txid.to_string(), topic.to_string())))
    }

    async fn insert_applied_transaction(&self, applied: AppliedTransaction) -> StorageResult<()> {
        let mut set = self.applied.lock().await;
        set.insert((applied.txid, applied.topic));
        Ok(())
    }
}

/// A chain tracker that accepts every transaction. SPV verification itself
/// is out of scope (spec.md §1/§2 "assumed external collaborators").
pub struct AlwaysValidChainTracker;

#[async_trait]
impl ChainTracker for AlwaysValidChainTracker {
    async fn is_valid_root_for_height(&self, _root: &str, _height: u32) -> OverlayResult<bool> {
        Ok(true)
    }

    async fn verify(&self, _tx: &Transaction) -> OverlayResult<bool> {
        Ok(true)
    }
}

/// A [`TopicManager`] whose admission policy is a plain closure, so each
/// test can express exactly the admission rule it wants to exercise.
pub struct FnTopicManager<F>
where
    F: Fn(&[u8], &[u32]) -> OverlayResult<AdmittanceInstructions> + Send + Sync,
{
    f: F,
}

impl<F> FnTopicManager<F>
where
    F: Fn(&[u8], &[u32]) -> OverlayResult<AdmittanceInstructions> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> TopicManager for FnTopicManager<F>
where
    F: Fn(&[u8], &[u32]) -> OverlayResult<AdmittanceInstructions> + Send + Sync,
{
    async fn identify_admissible_outputs(
        &self,
        beef: &[u8],
        previous_coins: &[u32],
    ) -> OverlayResult<AdmittanceInstructions> {
        (self.f)(beef, previous_coins)
    }
}

/// A [`LookupService`] that records every notification it receives (in
/// `"event:topic:outputIndex"` form) and answers with whatever
/// [`LookupFormula`] was last set via [`RecordingLookupService::set_formula`],
/// or an empty output list otherwise.
#[derive(Default)]
pub struct RecordingLookupService {
    events: std::sync::Mutex<Vec<String>>,
    formula: std::sync::Mutex<Option<LookupFormula>>,
}

impl RecordingLookupService {
    pub async fn set_formula(&self, formula: LookupFormula) {
        *self.formula.lock().expect("lock poisoned") = Some(formula);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl LookupService for RecordingLookupService {
    async fn lookup(&self, _question: &LookupQuestion) -> OverlayResult<LookupOutcome> {
        let formula = self.formula.lock().expect("lock poisoned").clone();
        match formula {
            Some(formula) => Ok(LookupOutcome::Formula(formula)),
            None => Ok(LookupOutcome::Answer(LookupAnswer::OutputList { outputs: Vec::new() })),
        }
    }

    async fn output_added(&self, _txid: &str, output_index: u32, _locking_script: &[u8], topic: &str) {
        self.events.lock().expect("lock poisoned").push(format!("added:{topic}:{output_index}"));
    }

    async fn output_spent(&self, _txid: &str, output_index: u32, topic: &str) {
        self.events.lock().expect("lock poisoned").push(format!("spent:{topic}:{output_index}"));
    }

    async fn output_deleted(&self, _txid: &str, output_index: u32, topic: &str) {
        self.events.lock().expect("lock poisoned").push(format!("deleted:{topic}:{output_index}"));
    }
}
