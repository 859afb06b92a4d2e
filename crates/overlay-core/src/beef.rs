//! A minimal stand-in for the BEEF (Background Evaluation Extended Format) codec.
//!
//! The real transaction/BEEF codec and script/signature validation are assumed
//! external collaborators (see the crate root docs): a production deployment
//! would decode/encode BRC-62 binary envelopes via the BSV SDK. This module
//! gives the admission engine and UTXO graph something concrete to decode,
//! mutate (attach `sourceTransaction`s, back-fill `MerklePath`s) and re-encode
//! so every operation in the spec is exercisable without a full consensus
//! codec: a `Transaction` tree is serialized with `serde_json` rather than
//! the BRC-62 binary layout.

use crate::transaction::Transaction;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeefError {
    #[error("malformed BEEF envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type BeefResult<T> = Result<T, BeefError>;

/// Proof that a transaction is included in a block.
///
/// Reference: BRC-74 BUMP (BSV Unified Merkle Path).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MerklePath {
    pub block_height: u32,
    pub path: Vec<Vec<MerklePathNode>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MerklePathNode {
    pub hash: String,
    pub offset: Option<u32>,
}

/// Decode a BEEF envelope into its root transaction.
///
/// Ancestor transactions embedded during history rehydration or merkle-proof
/// back-fill are recovered as `source_transaction` on the matching input.
pub fn decode_beef(beef: &[u8]) -> BeefResult<Transaction> {
    Ok(serde_json::from_slice(beef)?)
}

/// Re-encode a transaction tree (with any embedded ancestors) into bytes.
pub fn encode_beef(tx: &Transaction) -> BeefResult<Vec<u8>> {
    Ok(serde_json::to_vec(tx)?)
}
