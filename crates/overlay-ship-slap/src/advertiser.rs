//! Default [`Advertiser`]: mints, revokes, and parses SHIP/SLAP
//! advertisements for this node's own hosting domain.
//!
//! Reference: spec.md §6 ("Advertiser: mint/revoke/parse SHIP/SLAP
//! advertisements"), §4.6 `syncAdvertisements`. There is no teacher
//! analogue for this capability (`wallet-toolbox-rs` has no peer
//! advertisement concept), so the shape is enriched from `panon-btc-cory`'s
//! habit of keeping a thin adapter struct around the capability it fronts
//! (`rpc::HttpRpcClient`) rather than a deep inheritance hierarchy, per
//! spec.md §9 "Plug-in polymorphism".

use std::sync::Arc;

use async_trait::async_trait;

use overlay_core::beef::{decode_beef, encode_beef};
use overlay_core::error::{OverlayError, OverlayResult};
use overlay_core::traits::{Advertiser, LookupService};
use overlay_core::transaction::{OutPoint, Transaction, TxInput, TxOutput};
use overlay_core::types::{
    Advertisement, LookupAnswer, LookupOutcome, LookupQuestion, ShipAdvertisement, SlapAdvertisement,
    TaggedBeef, LS_SHIP, LS_SLAP, TM_SHIP, TM_SLAP,
};

/// Mints advertisements tagged with this node's own `domain`, and revokes
/// them by looking up the live advertisement output through `ls_ship`/
/// `ls_slap` and spending it without re-admitting anything.
pub struct ShipSlapAdvertiser {
    domain: String,
    ls_ship: Arc<dyn LookupService>,
    ls_slap: Arc<dyn LookupService>,
}

impl ShipSlapAdvertiser {
    pub fn new(domain: impl Into<String>, ls_ship: Arc<dyn LookupService>, ls_slap: Arc<dyn LookupService>) -> Self {
        Self { domain: domain.into(), ls_ship, ls_slap }
    }

    fn mint(&self, script: Vec<u8>, engine_topic: &str) -> OverlayResult<TaggedBeef> {
        let mut tx = Transaction::new();
        tx.add_output(TxOutput::new(0, script));
        Ok(TaggedBeef { beef: encode_beef(&tx)?, topics: vec![engine_topic.to_string()] })
    }

    async fn find_live_advertisement(
        &self,
        lookup: &Arc<dyn LookupService>,
        query: serde_json::Value,
        matches: impl Fn(&Advertisement) -> bool,
    ) -> OverlayResult<Option<(String, u32)>> {
        let question = LookupQuestion { service: String::new(), query };
        let LookupOutcome::Answer(LookupAnswer::OutputList { outputs }) = lookup.lookup(&question).await? else {
            return Ok(None);
        };
        for output in outputs {
            let tx = decode_beef(&output.beef)?;
            let Some(tx_output) = tx.outputs.get(output.output_index as usize) else { continue };
            let Ok(ad) = serde_json::from_slice::<Advertisement>(&tx_output.script_pubkey) else { continue };
            if matches(&ad) {
                return Ok(Some((tx.txid()?, output.output_index)));
            }
        }
        Ok(None)
    }

    fn revoke_spend(&self, txid: String, vout: u32, engine_topic: &str) -> OverlayResult<TaggedBeef> {
        let mut tx = Transaction::new();
        tx.add_input(TxInput::new(OutPoint::new(txid, vout)));
        Ok(TaggedBeef { beef: encode_beef(&tx)?, topics: vec![engine_topic.to_string()] })
    }
}

#[async_trait]
impl Advertiser for ShipSlapAdvertiser {
    async fn find_all_ship_advertisements(&self) -> OverlayResult<Vec<ShipAdvertisement>> {
        let question = LookupQuestion { service: LS_SHIP.to_string(), query: serde_json::json!({}) };
        let LookupOutcome::Answer(LookupAnswer::OutputList { outputs }) = self.ls_ship.lookup(&question).await? else {
            return Ok(Vec::new());
        };
        let mut ads = Vec::new();
        for output in outputs {
            let tx = decode_beef(&output.beef)?;
            let Some(tx_output) = tx.outputs.get(output.output_index as usize) else { continue };
            if let Ok(Advertisement::Ship(ad)) = serde_json::from_slice(&tx_output.script_pubkey) {
                ads.push(ad);
            }
        }
        Ok(ads)
    }

    async fn find_all_slap_advertisements(&self) -> OverlayResult<Vec<SlapAdvertisement>> {
        let question = LookupQuestion { service: LS_SLAP.to_string(), query: serde_json::json!({}) };
        let LookupOutcome::Answer(LookupAnswer::OutputList { outputs }) = self.ls_slap.lookup(&question).await? else {
            return Ok(Vec::new());
        };
        let mut ads = Vec::new();
        for output in outputs {
            let tx = decode_beef(&output.beef)?;
            let Some(tx_output) = tx.outputs.get(output.output_index as usize) else { continue };
            if let Ok(Advertisement::Slap(ad)) = serde_json::from_slice(&tx_output.script_pubkey) {
                ads.push(ad);
            }
        }
        Ok(ads)
    }

    async fn create_ship_advertisement(&self, topic: &str) -> OverlayResult<TaggedBeef> {
        let ad = Advertisement::Ship(ShipAdvertisement { domain: self.domain.clone(), topic: topic.to_string() });
        self.mint(serde_json::to_vec(&ad).map_err(|e| OverlayError::Service(e.to_string()))?, TM_SHIP)
    }

    async fn create_slap_advertisement(&self, service: &str) -> OverlayResult<TaggedBeef> {
        let ad = Advertisement::Slap(SlapAdvertisement { domain: self.domain.clone(), service: service.to_string() });
        self.mint(serde_json::to_vec(&ad).map_err(|e| OverlayError::Service(e.to_string()))?, TM_SLAP)
    }

    async fn revoke_advertisement(&self, ad: &Advertisement) -> OverlayResult<TaggedBeef> {
        match ad {
            Advertisement::Ship(target) => {
                let domain = self.domain.clone();
                let found = self
                    .find_live_advertisement(&self.ls_ship, serde_json::json!({ "topic": target.topic }), |found| {
                        matches!(found, Advertisement::Ship(s) if s.domain == domain && s.topic == target.topic)
                    })
                    .await?;
                let (txid, vout) = found
                    .ok_or_else(|| OverlayError::Service(format!("no live SHIP advertisement for topic {}", target.topic)))?;
                self.revoke_spend(txid, vout, TM_SHIP)
            }
            Advertisement::Slap(target) => {
                let domain = self.domain.clone();
                let found = self
                    .find_live_advertisement(&self.ls_slap, serde_json::json!({ "service": target.service }), |found| {
                        matches!(found, Advertisement::Slap(s) if s.domain == domain && s.service == target.service)
                    })
                    .await?;
                let (txid, vout) = found.ok_or_else(|| {
                    OverlayError::Service(format!("no live SLAP advertisement for service {}", target.service))
                })?;
                self.revoke_spend(txid, vout, TM_SLAP)
            }
        }
    }

    fn parse_advertisement(&self, script: &[u8]) -> Option<Advertisement> {
        serde_json::from_slice(script).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_ship_advertisement_script() {
        let advertiser = ShipSlapAdvertiser::new(
            "https://overlay.example",
            Arc::new(crate::lookup_services::ShipLookupService::new(Arc::new(NoopStorage))),
            Arc::new(crate::lookup_services::SlapLookupService::new(Arc::new(NoopStorage))),
        );
        let ad = Advertisement::Ship(ShipAdvertisement { domain: "https://overlay.example".into(), topic: "tm_foo".into() });
        let script = serde_json::to_vec(&ad).unwrap();

        assert_eq!(advertiser.parse_advertisement(&script), Some(ad));
        assert_eq!(advertiser.parse_advertisement(b"not an advertisement"), None);
    }

    struct NoopStorage;

    #[async_trait::async_trait]
    impl overlay_storage::Storage for NoopStorage {
        async fn find_output(
            &self,
            _txid: &str,
            _output_index: u32,
            _topic: Option<&str>,
            _spent: Option<bool>,
        ) -> overlay_storage::StorageResult<Option<overlay_storage::Output>> {
            Ok(None)
        }
        async fn find_outputs_for_transaction(&self, _txid: &str) -> overlay_storage::StorageResult<Vec<overlay_storage::Output>> {
            Ok(Vec::new())
        }
        async fn insert_output(&self, _output: overlay_storage::Output) -> overlay_storage::StorageResult<()> {
            Ok(())
        }
        async fn delete_output(&self, _txid: &str, _output_index: u32, _topic: &str) -> overlay_storage::StorageResult<()> {
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
            _new_set: std::collections::BTreeSet<overlay_storage::Coin>,
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
}
