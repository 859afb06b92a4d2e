//! The topic-scoped UTXO graph's node type and its supporting records.
//!
//! Reference: spec.md §3 DATA MODEL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A reference to a specific output `(txid, outputIndex)`.
///
/// Used both as an ancestor pointer (`outputsConsumed`) and a descendant
/// pointer (`consumedBy`); ordering on the pair gives `consumedBy` its set
/// semantics without pulling in a hasher.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub txid: String,
    pub output_index: u32,
}

impl Coin {
    pub fn new(txid: impl Into<String>, output_index: u32) -> Self {
        Self {
            txid: txid.into(),
            output_index,
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.output_index)
    }
}

/// A topic-scoped unspent transaction output: the central graph node.
///
/// Identity is the triple `(txid, output_index, topic)`. `outputs_consumed`
/// is the ancestor edge set (the prior topic-UTXOs this output's creating
/// transaction spent and retained); `consumed_by` is the descendant edge
/// set, deduplicated as a set per invariant 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub txid: String,
    pub output_index: u32,
    pub topic: String,
    pub output_script: Vec<u8>,
    pub satoshis: u64,
    /// BEEF envelope for the creating transaction, possibly enlarged by
    /// history rehydration or a merkle-proof back-fill.
    pub beef: Vec<u8>,
    pub spent: bool,
    pub outputs_consumed: Vec<Coin>,
    pub consumed_by: BTreeSet<Coin>,
}

impl Output {
    pub fn new(
        txid: impl Into<String>,
        output_index: u32,
        topic: impl Into<String>,
        output_script: Vec<u8>,
        satoshis: u64,
        beef: Vec<u8>,
    ) -> Self {
        Self {
            txid: txid.into(),
            output_index,
            topic: topic.into(),
            output_script,
            satoshis,
            beef,
            spent: false,
            outputs_consumed: Vec::new(),
            consumed_by: BTreeSet::new(),
        }
    }

    pub fn coin(&self) -> Coin {
        Coin::new(self.txid.clone(), self.output_index)
    }
}

/// Marker recording that `(txid, topic)` has already been processed by
/// `submit`; its presence short-circuits re-admission (invariant 4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub txid: String,
    pub topic: String,
}

impl AppliedTransaction {
    pub fn new(txid: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            txid: txid.into(),
            topic: topic.into(),
        }
    }
}
