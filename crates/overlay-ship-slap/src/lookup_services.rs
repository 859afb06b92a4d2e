//! The reserved `ls_ship`/`ls_slap` lookup services.
//!
//! Reference: spec.md §4.1 ("query the SHIP lookup service
//! `{service: "ls_ship", query: {topic: T}}`") and the component table's
//! description of a `LookupService` as an indexer hook: it is *not* the
//! engine's storage, it is a narrow index built entirely from the
//! `outputAdded`/`outputSpent`/`outputDeleted` notifications the engine
//! fires, the same separation the teacher keeps between its wallet tables
//! and its services layer. The current BEEF for an indexed advertisement
//! is fetched from the shared [`Storage`] lazily, at answer time, rather
//! than duplicated into the index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use overlay_core::error::OverlayResult;
use overlay_core::traits::LookupService;
use overlay_core::types::{Advertisement, LookupAnswer, LookupOutcome, LookupOutput, LookupQuestion};
use overlay_storage::{Coin, Storage};

/// Shared indexing/answering logic for `ls_ship` and `ls_slap`: both index
/// admissions under one reserved engine topic, keyed by the advertised
/// name embedded in the advertisement script (the SHIP `topic` or the SLAP
/// `service`), and both answer with the output-list of currently admitted
/// advertisements, optionally filtered to one advertised name.
struct AdvertisementIndex {
    storage: Arc<dyn Storage>,
    engine_topic: &'static str,
    /// advertised name -> coins currently admitted under it.
    by_name: Mutex<HashMap<String, HashSet<Coin>>>,
    /// reverse index so a spend/delete notification (which only carries
    /// the coin, not the advertised name) can find its bucket.
    coin_to_name: Mutex<HashMap<Coin, String>>,
}

impl AdvertisementIndex {
    fn new(storage: Arc<dyn Storage>, engine_topic: &'static str) -> Self {
        Self {
            storage,
            engine_topic,
            by_name: Mutex::new(HashMap::new()),
            coin_to_name: Mutex::new(HashMap::new()),
        }
    }

    async fn index(&self, txid: &str, output_index: u32, topic: &str, advertised_name: String) {
        if topic != self.engine_topic {
            return;
        }
        let coin = Coin::new(txid, output_index);
        self.by_name.lock().await.entry(advertised_name.clone()).or_default().insert(coin.clone());
        self.coin_to_name.lock().await.insert(coin, advertised_name);
    }

    async fn unindex(&self, txid: &str, output_index: u32, topic: &str) {
        if topic != self.engine_topic {
            return;
        }
        let coin = Coin::new(txid, output_index);
        if let Some(name) = self.coin_to_name.lock().await.remove(&coin) {
            if let Some(coins) = self.by_name.lock().await.get_mut(&name) {
                coins.remove(&coin);
            }
        }
    }

    async fn answer(&self, filter_name: Option<&str>) -> OverlayResult<LookupAnswer> {
        let by_name = self.by_name.lock().await;
        let coins: Vec<Coin> = match filter_name {
            Some(name) => by_name.get(name).cloned().unwrap_or_default().into_iter().collect(),
            None => by_name.values().flatten().cloned().collect(),
        };
        drop(by_name);

        let mut outputs = Vec::with_capacity(coins.len());
        for coin in coins {
            if let Some(output) = self
                .storage
                .find_output(&coin.txid, coin.output_index, Some(self.engine_topic), Some(false))
                .await?
            {
                outputs.push(LookupOutput { beef: output.beef, output_index: output.output_index });
            }
        }
        Ok(LookupAnswer::OutputList { outputs })
    }
}

fn string_field(query: &serde_json::Value, field: &str) -> Option<String> {
    query.get(field).and_then(|v| v.as_str()).map(str::to_string)
}

/// Indexes admitted `tm_ship` outputs by the SHIP `topic` they advertise.
pub struct ShipLookupService {
    index: AdvertisementIndex,
}

impl ShipLookupService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { index: AdvertisementIndex::new(storage, overlay_core::types::TM_SHIP) }
    }
}

#[async_trait]
impl LookupService for ShipLookupService {
    async fn lookup(&self, question: &LookupQuestion) -> OverlayResult<LookupOutcome> {
        let topic = string_field(&question.query, "topic");
        Ok(LookupOutcome::Answer(self.index.answer(topic.as_deref()).await?))
    }

    async fn output_added(&self, txid: &str, output_index: u32, locking_script: &[u8], topic: &str) {
        if let Ok(Advertisement::Ship(ad)) = serde_json::from_slice(locking_script) {
            self.index.index(txid, output_index, topic, ad.topic).await;
        }
    }

    async fn output_spent(&self, txid: &str, output_index: u32, topic: &str) {
        self.index.unindex(txid, output_index, topic).await;
    }

    async fn output_deleted(&self, txid: &str, output_index: u32, topic: &str) {
        self.index.unindex(txid, output_index, topic).await;
    }
}

/// Indexes admitted `tm_slap` outputs by the lookup service name they
/// advertise.
pub struct SlapLookupService {
    index: AdvertisementIndex,
}

impl SlapLookupService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { index: AdvertisementIndex::new(storage, overlay_core::types::TM_SLAP) }
    }
}

#[async_trait]
impl LookupService for SlapLookupService {
    async fn lookup(&self, question: &LookupQuestion) -> OverlayResult<LookupOutcome> {
        let service = string_field(&question.query, "service");
        Ok(LookupOutcome::Answer(self.index.answer(service.as_deref()).await?))
    }

    async fn output_added(&self, txid: &str, output_index: u32, locking_script: &[u8], topic: &str) {
        if let Ok(Advertisement::Slap(ad)) = serde_json::from_slice(locking_script) {
            self.index.index(txid, output_index, topic, ad.service).await;
        }
    }

    async fn output_spent(&self, txid: &str, output_index: u32, topic: &str) {
        self.index.unindex(txid, output_index, topic).await;
    }

    async fn output_deleted(&self, txid: &str, output_index: u32, topic: &str) {
        self.index.unindex(txid, output_index, topic).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::beef::encode_beef;
    use overlay_core::transaction::{Transaction, TxOutput};
    use overlay_core::types::ShipAdvertisement;
    use overlay_storage::Output;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStorage {
        outputs: StdMutex<HashMap<(String, u32), Output>>,
    }

    #[async_trait]
    impl Storage for FakeStorage {
        async fn find_output(
            &self,
            txid: &str,
            output_index: u32,
            _topic: Option<&str>,
            _spent: Option<bool>,
        ) -> overlay_storage::StorageResult<Option<Output>> {
            Ok(self.outputs.lock().unwrap().get(&(txid.to_string(), output_index)).cloned())
        }
        async fn find_outputs_for_transaction(&self, _txid: &str) -> overlay_storage::StorageResult<Vec<Output>> {
            Ok(Vec::new())
        }
        async fn insert_output(&self, output: Output) -> overlay_storage::StorageResult<()> {
            self.outputs.lock().unwrap().insert((output.txid.clone(), output.output_index), output);
            Ok(())
        }
        async fn delete_output(&self, txid: &str, output_index: u32, _topic: &str) -> overlay_storage::StorageResult<()> {
            self.outputs.lock().unwrap().remove(&(txid.to_string(), output_index));
            Ok(())
        }
        async fn mark_utxo_as_spent(&self, _txid: &str, _output_index: u32, _topic: &str) -> overlay_storage::StorageResult<()> {
            Ok(())
        }
        async fn update_consumed_by(
            &self,
            _txid: &str,
            _output_index: u32,
            _topic: &str,
            _new_set: std::collections::BTreeSet<Coin>,
        ) -> overlay_storage::StorageResult<()> {
            Ok(())
        }
        async fn update_output_beef(&self, _txid: &str, _output_index: u32, _topic: &str, _beef: Vec<u8>) -> overlay_storage::StorageResult<()> {
            Ok(())
        }
        async fn does_applied_transaction_exist(&self, _txid: &str, _topic: &str) -> overlay_storage::StorageResult<bool> {
            Ok(false)
        }
        async fn insert_applied_transaction(&self, _applied: overlay_storage::AppliedTransaction) -> overlay_storage::StorageResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn indexes_and_answers_by_advertised_topic() {
        let storage = Arc::new(FakeStorage::default());
        let mut tx = Transaction::new();
        let ad = Advertisement::Ship(ShipAdvertisement { domain: "https://a.example".into(), topic: "tm_foo".into() });
        tx.add_output(TxOutput::new(0, serde_json::to_vec(&ad).unwrap()));
        let beef = encode_beef(&tx).unwrap();
        let txid = tx.txid().unwrap();
        storage
            .insert_output(Output::new(txid.clone(), 0, overlay_core::types::TM_SHIP, vec![], 0, beef))
            .await
            .unwrap();

        let service = ShipLookupService::new(storage.clone());
        let script = serde_json::to_vec(&ad).unwrap();
        service.output_added(&txid, 0, &script, overlay_core::types::TM_SHIP).await;

        let question = LookupQuestion { service: "ls_ship".into(), query: serde_json::json!({"topic": "tm_foo"}) };
        let LookupOutcome::Answer(LookupAnswer::OutputList { outputs }) = service.lookup(&question).await.unwrap() else {
            panic!("expected output-list");
        };
        assert_eq!(outputs.len(), 1);

        service.output_spent(&txid, 0, overlay_core::types::TM_SHIP).await;
        let LookupOutcome::Answer(LookupAnswer::OutputList { outputs }) = service.lookup(&question).await.unwrap() else {
            panic!("expected output-list");
        };
        assert!(outputs.is_empty());
    }
}
