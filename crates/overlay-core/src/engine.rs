//! The submission pipeline and topic-scoped UTXO graph.
//!
//! Reference: spec.md §4 COMPONENT DESIGN. This is the 30%+25%+7%+5% of the
//! implementation budget spec.md §2 allocates to the admission pipeline,
//! the UTXO graph operations, peer propagation, and advertisement sync.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use overlay_storage::{AppliedTransaction, Coin, Output, Storage};

use crate::beef::{decode_beef, encode_beef, MerklePath};
use crate::error::{OverlayError, OverlayResult};
use crate::traits::{Advertiser, Broadcaster, ChainTracker, Gossiper, LookupService, TopicManager};
use crate::types::{
    AdmittanceInstructions, Advertisement, HistorySelector, LookupAnswer, LookupOutcome,
    LookupOutput, LookupQuestion, Steak, TaggedBeef, LS_SHIP, NO_DOCUMENTATION, TM_SHIP, TM_SLAP,
};

/// The overlay services engine.
///
/// Holds its plug-in capabilities behind `Arc<dyn Trait>` so the engine
/// itself is cheaply `Clone`-able and can be shared across an HTTP server's
/// request handlers without a lock (invariants on shared mutable state are
/// the storage implementation's job, per spec.md §5).
#[derive(Clone)]
pub struct Engine {
    storage: Arc<dyn Storage>,
    chain_tracker: Arc<dyn ChainTracker>,
    managers: Arc<HashMap<String, Arc<dyn TopicManager>>>,
    lookup_services: Arc<HashMap<String, Arc<dyn LookupService>>>,
    advertiser: Option<Arc<dyn Advertiser>>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    gossiper: Option<Arc<dyn Gossiper>>,
    hosting_url: Option<String>,
    ship_trackers: Arc<Vec<String>>,
    slap_trackers: Arc<Vec<String>>,
}

impl Engine {
    pub fn new(storage: Arc<dyn Storage>, chain_tracker: Arc<dyn ChainTracker>) -> Self {
        Self {
            storage,
            chain_tracker,
            managers: Arc::new(HashMap::new()),
            lookup_services: Arc::new(HashMap::new()),
            advertiser: None,
            broadcaster: None,
            gossiper: None,
            hosting_url: None,
            ship_trackers: Arc::new(Vec::new()),
            slap_trackers: Arc::new(Vec::new()),
        }
    }

    pub fn with_topic_manager(mut self, name: impl Into<String>, manager: Arc<dyn TopicManager>) -> Self {
        Arc::make_mut(&mut self.managers).insert(name.into(), manager);
        self
    }

    pub fn with_lookup_service(mut self, name: impl Into<String>, service: Arc<dyn LookupService>) -> Self {
        Arc::make_mut(&mut self.lookup_services).insert(name.into(), service);
        self
    }

    pub fn with_advertiser(mut self, advertiser: Arc<dyn Advertiser>) -> Self {
        self.advertiser = Some(advertiser);
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn with_gossiper(mut self, gossiper: Arc<dyn Gossiper>) -> Self {
        self.gossiper = Some(gossiper);
        self
    }

    pub fn with_hosting_url(mut self, hosting_url: impl Into<String>) -> Self {
        self.hosting_url = Some(hosting_url.into());
        self
    }

    pub fn with_ship_trackers(mut self, trackers: Vec<String>) -> Self {
        self.ship_trackers = Arc::new(trackers);
        self
    }

    pub fn with_slap_trackers(mut self, trackers: Vec<String>) -> Self {
        self.slap_trackers = Arc::new(trackers);
        self
    }

    // ---- §4.1 submission pipeline ------------------------------------

    /// `submit(taggedBEEF, onAck?)`. Reference: spec.md §4.1.
    pub async fn submit(
        &self,
        tagged: TaggedBeef,
        on_ack: Option<Box<dyn FnOnce(&Steak) + Send>>,
    ) -> OverlayResult<Steak> {
        for topic in &tagged.topics {
            if !self.managers.contains_key(topic) {
                return Err(OverlayError::UnknownTopic(topic.clone()));
            }
        }

        let tx = decode_beef(&tagged.beef)?;
        let txid = tx.txid()?;

        if !self.chain_tracker.verify(&tx).await? {
            return Err(OverlayError::SpvInvalid { txid });
        }

        let mut steak = Steak::new();

        for topic in &tagged.topics {
            let instructions = self.process_topic(topic, &tagged.beef, &tx, &txid).await;
            steak.insert(topic.clone(), instructions);
        }

        if let Some(cb) = on_ack {
            cb(&steak);
        }

        let admitted_anything = steak.values().any(|i| !i.outputs_to_admit.is_empty());
        if admitted_anything {
            if let Some(broadcaster) = &self.broadcaster {
                if let Err(err) = broadcaster.broadcast(&tx).await {
                    tracing::warn!(%txid, error = %err, "broadcast failed");
                }
            }
        }

        self.propagate_to_peers(&tagged, &steak).await;

        Ok(steak)
    }

    /// One topic's worth of steps 1–8. Never returns an error: a failure in
    /// any swallowed-error path (dedup aside) degrades to an empty
    /// [`AdmittanceInstructions`] for this topic, per spec.md §7's topic
    /// isolation rationale.
    async fn process_topic(
        &self,
        topic: &str,
        beef: &[u8],
        tx: &crate::transaction::Transaction,
        txid: &str,
    ) -> AdmittanceInstructions {
        match self.process_topic_inner(topic, beef, tx, txid).await {
            Ok(instructions) => instructions,
            Err(err) => {
                tracing::warn!(topic, %txid, error = %err, "topic processing failed, yielding empty STEAK entry");
                AdmittanceInstructions::default()
            }
        }
    }

    async fn process_topic_inner(
        &self,
        topic: &str,
        beef: &[u8],
        tx: &crate::transaction::Transaction,
        txid: &str,
    ) -> OverlayResult<AdmittanceInstructions> {
        // 1. Dedup.
        if self.storage.does_applied_transaction_exist(txid, topic).await? {
            tracing::debug!(topic, %txid, "duplicate submission, skipping");
            return Ok(AdmittanceInstructions::default());
        }

        // 2. Previous-coin discovery.
        let mut previous_coins = Vec::new();
        for (i, input) in tx.inputs.iter().enumerate() {
            let prev_txid = &input.prev_out.txid;
            let prev_vout = input.prev_out.vout;
            if self
                .storage
                .find_output(prev_txid, prev_vout, Some(topic), None)
                .await?
                .is_some()
            {
                previous_coins.push(i as u32);
                self.storage.mark_utxo_as_spent(prev_txid, prev_vout, topic).await?;
                self.notify_output_spent(prev_txid, prev_vout, topic).await;
            }
        }

        // 3. Admissibility. A manager failure is non-fatal: spends already
        // recorded above stand, but nothing new is admitted or retained.
        let manager = self
            .managers
            .get(topic)
            .expect("topic presence checked in submit's preflight");
        let instructions = match manager.identify_admissible_outputs(beef, &previous_coins).await {
            Ok(instructions) => instructions,
            Err(err) => {
                tracing::warn!(topic, %txid, error = %err, "topic manager failed");
                return Ok(AdmittanceInstructions::default());
            }
        };

        // 4. Partition previous coins into retained / stale.
        let mut retained = Vec::new();
        let mut stale = Vec::new();
        for &i in &previous_coins {
            let input = &tx.inputs[i as usize];
            let coin = Coin::new(input.prev_out.txid.clone(), input.prev_out.vout);
            if instructions.coins_to_retain.contains(&i) {
                retained.push(coin);
            } else {
                stale.push(coin);
            }
        }

        // 5. Admit. Runs before stale-pruning so `outputAdded` precedes the
        // `outputDeleted` events stale ancestors fire (spec.md §5 ordering;
        // admitted outputs only ever reference `retained`, never `stale`,
        // so deleting stale coins afterward is graph-safe).
        let mut admitted_coins = Vec::new();
        for &vout in &instructions.outputs_to_admit {
            let Some(tx_output) = tx.outputs.get(vout as usize) else {
                continue;
            };
            let mut new_output = Output::new(
                txid,
                vout,
                topic,
                tx_output.script_pubkey.clone(),
                tx_output.value.max(0) as u64,
                beef.to_vec(),
            );
            new_output.outputs_consumed = retained.clone();
            self.storage.insert_output(new_output).await?;
            admitted_coins.push(Coin::new(txid.to_string(), vout));
            self.notify_output_added(txid, vout, &tx_output.script_pubkey, topic).await;
        }

        // 6. Link descendants: retained ancestors gain the newly admitted
        // outputs in their `consumed_by` set.
        for ancestor in &retained {
            if let Some(ancestor_output) = self
                .storage
                .find_output(&ancestor.txid, ancestor.output_index, Some(topic), None)
                .await?
            {
                let mut consumed_by = ancestor_output.consumed_by;
                consumed_by.extend(admitted_coins.iter().cloned());
                self.storage
                    .update_consumed_by(&ancestor.txid, ancestor.output_index, topic, consumed_by)
                    .await?;
            }
        }

        // Stale coins are pruned after admission (see note on step 5).
        for coin in &stale {
            if let Some(stale_output) = self
                .storage
                .find_output(&coin.txid, coin.output_index, Some(topic), None)
                .await?
            {
                self.delete_utxo_deep(stale_output)
                    .await
                    .map_err(|err| OverlayError::StalePruneFailed(err.to_string()))?;
            }
        }

        // 7. Mark applied.
        self.storage
            .insert_applied_transaction(AppliedTransaction::new(txid, topic))
            .await?;

        // 8. STEAK entry.
        Ok(instructions)
    }

    async fn notify_output_added(&self, txid: &str, output_index: u32, script: &[u8], topic: &str) {
        for service in self.lookup_services.values() {
            service.output_added(txid, output_index, script, topic).await;
        }
    }

    async fn notify_output_spent(&self, txid: &str, output_index: u32, topic: &str) {
        for service in self.lookup_services.values() {
            service.output_spent(txid, output_index, topic).await;
        }
    }

    async fn notify_output_deleted(&self, txid: &str, output_index: u32, topic: &str) {
        for service in self.lookup_services.values() {
            service.output_deleted(txid, output_index, topic).await;
        }
    }

    // ---- §4.2 deleteUTXODeep -------------------------------------------

    /// Recursively prune a stale coin and any of its ancestors left
    /// unreferenced by the deletion, per spec.md §4.2.
    ///
    /// Resolved ambiguity: the literal spec text reads as unconditionally
    /// severing `output`'s link from every ancestor's `consumed_by` even
    /// when `output` itself is *not* deleted (because some other
    /// descendant still pins it) — doing so would violate invariant 1
    /// (an ancestor whose `consumed_by` no longer lists a live descendant
    /// that legitimately still references it). This implementation only
    /// severs and recurses past a node once that node has actually been
    /// deleted, matching §9's closing remark that recursion "terminates
    /// at ancestors whose `consumedBy` is still non-empty after removal".
    pub fn delete_utxo_deep<'a>(
        &'a self,
        output: Output,
    ) -> Pin<Box<dyn Future<Output = OverlayResult<()>> + Send + 'a>> {
        Box::pin(async move {
            if !output.consumed_by.is_empty() {
                return Ok(());
            }

            self.storage
                .delete_output(&output.txid, output.output_index, &output.topic)
                .await?;
            self.notify_output_deleted(&output.txid, output.output_index, &output.topic)
                .await;

            let self_coin = output.coin();
            for ancestor_coin in &output.outputs_consumed {
                let ancestor = self
                    .storage
                    .find_output(&ancestor_coin.txid, ancestor_coin.output_index, Some(&output.topic), None)
                    .await?;
                let Some(mut ancestor) = ancestor else {
                    continue;
                };
                ancestor.consumed_by.remove(&self_coin);
                self.storage
                    .update_consumed_by(
                        &ancestor.txid,
                        ancestor.output_index,
                        &ancestor.topic,
                        ancestor.consumed_by.clone(),
                    )
                    .await?;
                self.delete_utxo_deep(ancestor).await?;
            }

            Ok(())
        })
    }

    // ---- §4.3 getUTXOHistory --------------------------------------------

    /// Rehydrate `output`'s BEEF with embedded ancestors down to the depth
    /// `selector` permits. Reference: spec.md §4.3.
    pub fn get_utxo_history<'a>(
        &'a self,
        output: Output,
        selector: &'a HistorySelector,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = OverlayResult<Output>> + Send + 'a>> {
        Box::pin(async move {
            if matches!(selector, HistorySelector::None) {
                return Ok(output);
            }
            if !selector.should_descend(&output.beef, output.output_index, depth) {
                return Ok(output);
            }
            if output.outputs_consumed.is_empty() {
                return Ok(output);
            }

            let mut tx = decode_beef(&output.beef)
                .map_err(|err| OverlayError::HistoryRehydrationFailed(err.to_string()))?;

            for ancestor_coin in output.outputs_consumed.clone() {
                let ancestor = self
                    .storage
                    .find_output(&ancestor_coin.txid, ancestor_coin.output_index, None, None)
                    .await
                    .map_err(|err| OverlayError::HistoryRehydrationFailed(err.to_string()))?;
                let Some(ancestor) = ancestor else {
                    // Per-ancestor lookup misses are tolerated: that branch
                    // simply isn't embedded.
                    continue;
                };

                let hydrated = self.get_utxo_history(ancestor, selector, depth + 1).await?;
                let child_tx = decode_beef(&hydrated.beef)
                    .map_err(|err| OverlayError::HistoryRehydrationFailed(err.to_string()))?;

                for input in tx.inputs.iter_mut() {
                    if input.prev_out.txid == ancestor_coin.txid
                        && input.prev_out.vout == ancestor_coin.output_index
                    {
                        input.source_transaction = Some(Box::new(child_tx));
                        break;
                    }
                }
            }

            let beef = encode_beef(&tx)
                .map_err(|err| OverlayError::HistoryRehydrationFailed(err.to_string()))?;
            Ok(Output { beef, ..output })
        })
    }

    // ---- §4.4 updateMerkleProof / handleNewMerkleProof ------------------

    /// Embed `proof` into every stored `Output` whose BEEF transitively
    /// contains `txid`. Reference: spec.md §4.4.
    ///
    /// Resolved ambiguity: the literal recursion-path/"crumb" walk spec.md
    /// describes collapses to a no-op past the first hop (each descendant
    /// call resets the path to `[self]`, making the base-case check
    /// `output.txid == path[0].txid` trivially true every time, so the
    /// multi-hop "descend through tx.inputs" branch is never reached).
    /// This implementation instead searches each output's own decoded BEEF
    /// tree directly for the transaction matching `txid` — recursing into
    /// `source_transaction`s wherever they're embedded — which is exactly
    /// invariant 6's completeness property and handles embeddings at any
    /// depth, not just one hop.
    pub async fn handle_new_merkle_proof(&self, txid: &str, proof: &MerklePath) -> OverlayResult<()> {
        let outputs = self.storage.find_outputs_for_transaction(txid).await?;
        if outputs.is_empty() {
            return Err(OverlayError::NoMatchingOutputs(txid.to_string()));
        }
        for output in outputs {
            self.update_merkle_proof(output, txid, proof).await?;
        }
        Ok(())
    }

    fn update_merkle_proof<'a>(
        &'a self,
        output: Output,
        target_txid: &'a str,
        proof: &'a MerklePath,
    ) -> Pin<Box<dyn Future<Output = OverlayResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut tx = decode_beef(&output.beef)?;
            embed_merkle_path(&mut tx, target_txid, proof)?;
            let beef = encode_beef(&tx)?;
            self.storage
                .update_output_beef(&output.txid, output.output_index, &output.topic, beef)
                .await?;

            for descendant_coin in output.consumed_by.iter() {
                let descendants = self
                    .storage
                    .find_outputs_for_transaction(&descendant_coin.txid)
                    .await?;
                for descendant in descendants {
                    self.update_merkle_proof(descendant, target_txid, proof).await?;
                }
            }

            Ok(())
        })
    }

    // ---- §4.5 lookup -----------------------------------------------------

    pub async fn lookup(&self, question: LookupQuestion) -> OverlayResult<LookupAnswer> {
        let service = self
            .lookup_services
            .get(&question.service)
            .ok_or_else(|| OverlayError::UnknownService(question.service.clone()))?;

        match service.lookup(&question).await? {
            LookupOutcome::Answer(answer) => Ok(answer),
            LookupOutcome::Formula(formula) => {
                let mut outputs = Vec::new();
                for item in formula {
                    let found = self
                        .storage
                        .find_output(&item.txid, item.output_index, None, Some(false))
                        .await?;
                    let Some(found) = found else { continue };
                    let selector = item.history.unwrap_or(HistorySelector::None);
                    let hydrated = self.get_utxo_history(found, &selector, 0).await?;
                    outputs.push(LookupOutput {
                        beef: hydrated.beef,
                        output_index: hydrated.output_index,
                    });
                }
                Ok(LookupAnswer::OutputList { outputs })
            }
        }
    }

    // ---- §4.1 peer propagation -------------------------------------------

    async fn propagate_to_peers(&self, tagged: &TaggedBeef, steak: &Steak) {
        let (Some(advertiser), Some(gossiper)) = (&self.advertiser, &self.gossiper) else {
            return;
        };

        let relevant_topics: Vec<&str> = steak
            .iter()
            .filter(|(_, instructions)| !instructions.outputs_to_admit.is_empty())
            .map(|(topic, _)| topic.as_str())
            .collect();
        if relevant_topics.is_empty() {
            return;
        }

        let mut domain_to_topics: HashMap<String, HashSet<String>> = HashMap::new();

        if let Some(ls_ship) = self.lookup_services.get(LS_SHIP) {
            for topic in &relevant_topics {
                let question = LookupQuestion {
                    service: LS_SHIP.to_string(),
                    query: serde_json::json!({ "topic": topic }),
                };
                let answer = match ls_ship.lookup(&question).await {
                    Ok(LookupOutcome::Answer(answer)) => answer,
                    Ok(LookupOutcome::Formula(_)) => continue,
                    Err(err) => {
                        tracing::warn!(topic, error = %err, "ls_ship lookup failed during peer propagation");
                        continue;
                    }
                };
                let LookupAnswer::OutputList { outputs } = answer else {
                    continue;
                };
                for output in outputs {
                    let Ok(ship_tx) = decode_beef(&output.beef) else {
                        tracing::warn!(topic, "failed to parse SHIP advertisement output");
                        continue;
                    };
                    let Some(tx_output) = ship_tx.outputs.get(output.output_index as usize) else {
                        continue;
                    };
                    match advertiser.parse_advertisement(&tx_output.script_pubkey) {
                        Some(Advertisement::Ship(ad)) => {
                            domain_to_topics.entry(ad.domain).or_default().insert(topic.to_string());
                        }
                        Some(Advertisement::Slap(_)) | None => {}
                    }
                }
            }
        }

        if relevant_topics.contains(&TM_SHIP) {
            for domain in self.ship_trackers.iter() {
                domain_to_topics.entry(domain.clone()).or_default().insert(TM_SHIP.to_string());
            }
        }
        if relevant_topics.contains(&TM_SLAP) {
            for domain in self.slap_trackers.iter() {
                domain_to_topics.entry(domain.clone()).or_default().insert(TM_SLAP.to_string());
            }
        }

        if let Some(host) = &self.hosting_url {
            domain_to_topics.remove(host);
        }

        for (domain, topics) in domain_to_topics {
            let payload = TaggedBeef {
                beef: tagged.beef.clone(),
                topics: topics.into_iter().collect(),
            };
            if let Err(err) = gossiper.post_tagged_beef(&domain, &payload).await {
                tracing::warn!(domain, error = %err, "peer gossip failed");
            }
        }
    }

    // ---- §4.6 syncAdvertisements ------------------------------------------

    pub async fn sync_advertisements(&self) {
        let Some(advertiser) = self.advertiser.clone() else {
            return;
        };

        let required_topics: HashSet<String> = self.managers.keys().cloned().collect();
        match advertiser.find_all_ship_advertisements().await {
            Ok(existing) => {
                let existing_topics: HashSet<String> =
                    existing.iter().map(|ad| ad.topic.clone()).collect();
                for topic in required_topics.difference(&existing_topics) {
                    if let Err(err) = self.mint_and_submit_advertisement(
                        advertiser.create_ship_advertisement(topic).await,
                    )
                    .await
                    {
                        tracing::warn!(topic, error = %err, "failed to create SHIP advertisement");
                    }
                }
                for ad in existing.into_iter().filter(|ad| !required_topics.contains(&ad.topic)) {
                    let revoke = advertiser.revoke_advertisement(&Advertisement::Ship(ad.clone())).await;
                    if let Err(err) = self.mint_and_submit_advertisement(revoke).await {
                        tracing::warn!(domain = %ad.domain, topic = %ad.topic, error = %err, "failed to revoke SHIP advertisement");
                    }
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to list SHIP advertisements"),
        }

        let required_services: HashSet<String> = self.lookup_services.keys().cloned().collect();
        match advertiser.find_all_slap_advertisements().await {
            Ok(existing) => {
                let existing_services: HashSet<String> =
                    existing.iter().map(|ad| ad.service.clone()).collect();
                for service in required_services.difference(&existing_services) {
                    if let Err(err) = self.mint_and_submit_advertisement(
                        advertiser.create_slap_advertisement(service).await,
                    )
                    .await
                    {
                        tracing::warn!(service, error = %err, "failed to create SLAP advertisement");
                    }
                }
                for ad in existing.into_iter().filter(|ad| !required_services.contains(&ad.service)) {
                    let revoke = advertiser.revoke_advertisement(&Advertisement::Slap(ad.clone())).await;
                    if let Err(err) = self.mint_and_submit_advertisement(revoke).await {
                        tracing::warn!(domain = %ad.domain, service = %ad.service, error = %err, "failed to revoke SLAP advertisement");
                    }
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to list SLAP advertisements"),
        }
    }

    async fn mint_and_submit_advertisement(&self, minted: OverlayResult<TaggedBeef>) -> OverlayResult<()> {
        let tagged = minted?;
        self.submit(tagged, None).await?;
        Ok(())
    }

    // ---- §6 auxiliary read endpoints --------------------------------------

    pub fn list_topic_managers(&self) -> Vec<String> {
        self.managers.keys().cloned().collect()
    }

    pub fn list_lookup_services(&self) -> Vec<String> {
        self.lookup_services.keys().cloned().collect()
    }

    pub fn get_topic_manager_documentation(&self, name: &str) -> String {
        self.managers
            .get(name)
            .and_then(|manager| manager.get_documentation())
            .unwrap_or_else(|| NO_DOCUMENTATION.to_string())
    }

    pub fn get_lookup_service_documentation(&self, name: &str) -> String {
        self.lookup_services
            .get(name)
            .and_then(|service| service.get_documentation())
            .unwrap_or_else(|| NO_DOCUMENTATION.to_string())
    }
}

/// Search `tx`'s embedded ancestor tree for the transaction matching
/// `target_txid` and set its merkle path. Returns whether a match was
/// found; a miss is not an error (the proof may target a transaction not
/// embedded in this particular BEEF).
fn embed_merkle_path(
    tx: &mut crate::transaction::Transaction,
    target_txid: &str,
    proof: &MerklePath,
) -> OverlayResult<bool> {
    if tx.txid()? == target_txid {
        tx.merkle_path = Some(proof.clone());
        return Ok(true);
    }
    for input in tx.inputs.iter_mut() {
        if let Some(source) = input.source_transaction.as_deref_mut() {
            if embed_merkle_path(source, target_txid, proof)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
