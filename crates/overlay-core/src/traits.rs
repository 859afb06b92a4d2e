//! Plug-in contracts: the capability sets concrete deployments implement.
//!
//! Reference: spec.md §6 EXTERNAL INTERFACES, §9 "Plug-in polymorphism" —
//! narrow interface abstractions with well-named methods, optional hooks
//! modeled as default trait methods rather than `Option<fn>` fields (the
//! same shape the teacher uses for `StorageReader`/`StorageWriter`).

use async_trait::async_trait;

use crate::error::OverlayResult;
use crate::transaction::Transaction;
use crate::types::{
    Advertisement, AdmittanceInstructions, LookupOutcome, LookupQuestion, ShipAdvertisement,
    SlapAdvertisement, TaggedBeef,
};

/// Per-topic admission policy.
#[async_trait]
pub trait TopicManager: Send + Sync {
    /// Decide which of `tx`'s own outputs to admit and which of the
    /// already-discovered `previous_coins` (input indices that spent a
    /// prior topic-UTXO) to retain.
    ///
    /// Reference: spec.md §4.1 step 3. A failure here is caught by the
    /// engine and folded into an empty STEAK entry for this topic — it
    /// must never abort the submission as a whole.
    async fn identify_admissible_outputs(
        &self,
        beef: &[u8],
        previous_coins: &[u32],
    ) -> OverlayResult<AdmittanceInstructions>;

    fn get_documentation(&self) -> Option<String> {
        None
    }
}

/// Indexer hook: receives admission/spend/deletion events and answers
/// `LookupQuestion`s.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, question: &LookupQuestion) -> OverlayResult<LookupOutcome>;

    async fn output_added(
        &self,
        _txid: &str,
        _output_index: u32,
        _locking_script: &[u8],
        _topic: &str,
    ) {
    }

    async fn output_spent(&self, _txid: &str, _output_index: u32, _topic: &str) {}

    async fn output_deleted(&self, _txid: &str, _output_index: u32, _topic: &str) {}

    fn get_documentation(&self) -> Option<String> {
        None
    }
}

/// Mints, revokes, and parses SHIP/SLAP advertisements.
#[async_trait]
pub trait Advertiser: Send + Sync {
    async fn find_all_ship_advertisements(&self) -> OverlayResult<Vec<ShipAdvertisement>>;

    async fn find_all_slap_advertisements(&self) -> OverlayResult<Vec<SlapAdvertisement>>;

    async fn create_ship_advertisement(&self, topic: &str) -> OverlayResult<TaggedBeef>;

    async fn create_slap_advertisement(&self, service: &str) -> OverlayResult<TaggedBeef>;

    async fn revoke_advertisement(&self, ad: &Advertisement) -> OverlayResult<TaggedBeef>;

    /// Parse a candidate output's locking script into an advertisement,
    /// or `None` if it isn't one.
    fn parse_advertisement(&self, script: &[u8]) -> Option<Advertisement>;
}

/// SPV oracle: the chain tracker an admission's validity is checked
/// against.
#[async_trait]
pub trait ChainTracker: Send + Sync {
    async fn is_valid_root_for_height(&self, root: &str, height: u32) -> OverlayResult<bool>;

    /// Whether `tx` (and its embedded BEEF ancestry) verifies under SPV.
    async fn verify(&self, tx: &Transaction) -> OverlayResult<bool>;
}

/// Transaction broadcaster — the base network, not the overlay peers.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, tx: &Transaction) -> OverlayResult<()>;
}

/// Peer fan-out client: POSTs a `TaggedBeef` to another overlay node's
/// `/submit` endpoint.
#[async_trait]
pub trait Gossiper: Send + Sync {
    async fn post_tagged_beef(&self, domain: &str, beef: &TaggedBeef) -> OverlayResult<()>;
}
