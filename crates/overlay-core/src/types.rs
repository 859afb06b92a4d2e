//! Submission, acknowledgement, and lookup protocol types.
//!
//! Reference: spec.md §3 DATA MODEL (the protocol shapes, not the graph
//! node — that's `overlay_storage::Output`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// `{ beef, topics }` — a submission unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedBeef {
    pub beef: Vec<u8>,
    pub topics: Vec<String>,
}

/// What a topic manager decided for one transaction: which of its own
/// output indices to admit, and which of the previously-discovered input
/// indices (coins) to retain rather than prune as stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmittanceInstructions {
    pub outputs_to_admit: Vec<u32>,
    pub coins_to_retain: Vec<u32>,
}

/// Submitted Transaction Execution Acknowledgement: one
/// [`AdmittanceInstructions`] per topic the submission targeted.
pub type Steak = HashMap<String, AdmittanceInstructions>;

/// `{ service, query }` sent to [`crate::traits::LookupService::lookup`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupQuestion {
    pub service: String,
    pub query: serde_json::Value,
}

/// One item of a materialized output-list lookup answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupOutput {
    pub beef: Vec<u8>,
    pub output_index: u32,
}

/// What a [`crate::traits::LookupService`] hands back: either a fully
/// formed answer, or a formula the engine must hydrate (see
/// [`LookupFormula`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LookupAnswer {
    Freeform { data: serde_json::Value },
    OutputList { outputs: Vec<LookupOutput> },
}

/// One entry of a [`LookupFormula`]: an unspent output to hydrate, with an
/// optional history-rehydration depth/predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupFormulaItem {
    pub txid: String,
    pub output_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistorySelector>,
}

pub type LookupFormula = Vec<LookupFormulaItem>;

/// Either a ready answer or a formula to hydrate; what
/// `LookupService::lookup` actually returns before `Engine::lookup`
/// normalizes it.
pub enum LookupOutcome {
    Answer(LookupAnswer),
    Formula(LookupFormula),
}

/// `getUTXOHistory`'s depth control (spec.md §4.3, §9 "Selector
/// polymorphism" — a tagged sum, not an untyped union).
#[derive(Clone)]
pub enum HistorySelector {
    /// No recursion: return the output unchanged.
    None,
    /// Descend while `depth <= n`.
    Depth(u32),
    /// Descend iff the predicate holds for `(beef, output_index, depth)`.
    Predicate(Arc<dyn Fn(&[u8], u32, u32) -> bool + Send + Sync>),
}

impl fmt::Debug for HistorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistorySelector::None => write!(f, "HistorySelector::None"),
            HistorySelector::Depth(n) => write!(f, "HistorySelector::Depth({n})"),
            HistorySelector::Predicate(_) => write!(f, "HistorySelector::Predicate(..)"),
        }
    }
}

impl Serialize for HistorySelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HistorySelector::None => serializer.serialize_none(),
            HistorySelector::Depth(n) => serializer.serialize_some(n),
            HistorySelector::Predicate(_) => {
                Err(serde::ser::Error::custom("a predicate history selector cannot be serialized"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for HistorySelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value: Option<u32> = Deserialize::deserialize(deserializer)?;
        Ok(match value {
            Some(n) => HistorySelector::Depth(n),
            None => HistorySelector::None,
        })
    }
}

impl HistorySelector {
    /// Whether to descend into `outputs_consumed` from this node.
    pub fn should_descend(&self, beef: &[u8], output_index: u32, depth: u32) -> bool {
        match self {
            HistorySelector::None => false,
            HistorySelector::Depth(n) => depth <= *n,
            HistorySelector::Predicate(p) => p(beef, output_index, depth),
        }
    }
}

/// Asserts that `domain` hosts `topic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipAdvertisement {
    pub domain: String,
    pub topic: String,
}

/// Asserts that `domain` hosts a lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlapAdvertisement {
    pub domain: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol")]
pub enum Advertisement {
    #[serde(rename = "SHIP")]
    Ship(ShipAdvertisement),
    #[serde(rename = "SLAP")]
    Slap(SlapAdvertisement),
}

/// Reserved topic manager / lookup service names the engine's bootstrap
/// logic depends on (spec.md §6).
pub const TM_SHIP: &str = "tm_ship";
pub const TM_SLAP: &str = "tm_slap";
pub const LS_SHIP: &str = "ls_ship";
pub const LS_SLAP: &str = "ls_slap";

/// Documentation fallback for the auxiliary read endpoints (spec.md §6).
pub const NO_DOCUMENTATION: &str = "No documentation found!";

/// Which network a deployment's bootstrap trackers and chain tracker talk
/// to. SHIP/SLAP bootstrap domains are chain-scoped, so a hosting node
/// needs to know which one it's on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Main,
    Test,
}

impl Default for Chain {
    fn default() -> Self {
        Chain::Main
    }
}
