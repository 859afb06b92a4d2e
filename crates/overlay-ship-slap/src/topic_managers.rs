//! The reserved `tm_ship`/`tm_slap` topic managers.
//!
//! Reference: spec.md §6 "Reserved topic / service names" and §4.1 (the
//! peer-propagation step queries `ls_ship`, which only has something to
//! answer once `tm_ship` has admitted SHIP advertisement outputs). Mint and
//! revoke are both ordinary submissions: minting is a zero-input
//! transaction with one advertisement output; revoking is a transaction
//! that spends a prior advertisement output and admits nothing, so the
//! engine's own stale-prune path (`deleteUTXODeep`) removes it.

use async_trait::async_trait;

use overlay_core::beef::decode_beef;
use overlay_core::error::OverlayResult;
use overlay_core::traits::TopicManager;
use overlay_core::types::{AdmittanceInstructions, Advertisement};

fn admit_well_formed_advertisements(
    beef: &[u8],
    is_match: impl Fn(&Advertisement) -> bool,
) -> OverlayResult<AdmittanceInstructions> {
    let tx = decode_beef(beef)?;
    let outputs_to_admit = tx
        .outputs
        .iter()
        .enumerate()
        .filter_map(|(i, output)| {
            let ad: Advertisement = serde_json::from_slice(&output.script_pubkey).ok()?;
            is_match(&ad).then_some(i as u32)
        })
        .collect();
    // Never retain: a mint has no previous coins, and a revocation's sole
    // purpose is to let the spent advertisement fall out of the topic.
    Ok(AdmittanceInstructions { outputs_to_admit, coins_to_retain: Vec::new() })
}

/// Admits well-formed SHIP (Service Host Interconnect Protocol)
/// advertisement outputs.
pub struct ShipTopicManager;

#[async_trait]
impl TopicManager for ShipTopicManager {
    async fn identify_admissible_outputs(
        &self,
        beef: &[u8],
        _previous_coins: &[u32],
    ) -> OverlayResult<AdmittanceInstructions> {
        admit_well_formed_advertisements(beef, |ad| {
            matches!(ad, Advertisement::Ship(ship) if !ship.domain.is_empty() && !ship.topic.is_empty())
        })
    }

    fn get_documentation(&self) -> Option<String> {
        Some(
            "Admits outputs carrying a well-formed SHIP advertisement (a domain/topic pair). \
             Retains no previous coins: spending a prior SHIP output without re-admitting it \
             revokes that advertisement."
                .to_string(),
        )
    }
}

/// Admits well-formed SLAP (Service Lookup Advertisement Protocol)
/// advertisement outputs.
pub struct SlapTopicManager;

#[async_trait]
impl TopicManager for SlapTopicManager {
    async fn identify_admissible_outputs(
        &self,
        beef: &[u8],
        _previous_coins: &[u32],
    ) -> OverlayResult<AdmittanceInstructions> {
        admit_well_formed_advertisements(beef, |ad| {
            matches!(ad, Advertisement::Slap(slap) if !slap.domain.is_empty() && !slap.service.is_empty())
        })
    }

    fn get_documentation(&self) -> Option<String> {
        Some(
            "Admits outputs carrying a well-formed SLAP advertisement (a domain/service pair). \
             Retains no previous coins, mirroring tm_ship's revoke-by-spend semantics."
                .to_string(),
        )
    }
}
