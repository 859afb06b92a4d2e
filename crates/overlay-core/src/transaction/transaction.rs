//! Bitcoin Transaction
//!
//! Core transaction structure with serialization and txid calculation.
//!
//! **Reference**: TypeScript bsv-sdk Transaction class

use super::{TxInput, TxOutput, OutPoint, TransactionError, TransactionResult};
use crate::beef::MerklePath;
use sha2::{Sha256, Digest};
use serde::{Deserialize, Serialize};

/// Bitcoin transaction
///
/// Contains all data needed for a valid Bitcoin transaction:
/// - Version
/// - Inputs (spending previous outputs)
/// - Outputs (creating new outputs)
/// - Lock time (for timelocks)
///
/// **Reference**: TypeScript `Transaction` class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction version (typically 1 or 2)
    pub version: u32,

    /// Transaction inputs
    pub inputs: Vec<TxInput>,

    /// Transaction outputs
    pub outputs: Vec<TxOutput>,

    /// Lock time (0 = no timelock)
    #[serde(rename = "lockTime")]
    pub lock_time: u32,

    /// SPV inclusion proof, present once this transaction has been mined
    /// and a proof has been back-filled via `updateMerkleProof`.
    #[serde(rename = "merklePath", default, skip_serializing_if = "Option::is_none")]
    pub merkle_path: Option<MerklePath>,
}

impl Transaction {
    /// Create a new empty transaction
    ///
    /// **Reference**: TypeScript `new Transaction()`
    pub fn new() -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            merkle_path: None,
        }
    }

    /// Create a transaction with specific parameters
    ///
    /// **Reference**: TypeScript `new Transaction(version, inputs, outputs, lockTime)`
    pub fn with_params(version: u32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>, lock_time: u32) -> Self {
        Self {
            version,
            inputs,
            outputs,
            lock_time,
            merkle_path: None,
        }
    }

    /// The `(txid, outputIndex)` pair an input spends.
    pub fn input_source(input: &TxInput) -> (&str, u32) {
        (&input.prev_out.txid, input.prev_out.vout)
    }
    
    /// Add an input to the transaction
    ///
    /// **Reference**: TypeScript `tx.addInput(input)`
    pub fn add_input(&mut self, input: TxInput) {
        self.inputs.push(input);
    }
    
    /// Add an output to the transaction
    ///
    /// **Reference**: TypeScript `tx.addOutput(output)`
    pub fn add_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }
    
    /// Serialize transaction to bytes
    ///
    /// Format:
    /// - Version (4 bytes, little-endian)
    /// - Input count (varint)
    /// - Inputs
    /// - Output count (varint)
    /// - Outputs
    /// - Lock time (4 bytes, little-endian)
    ///
    /// **Reference**: TypeScript `tx.serialize()`
    pub fn serialize(&self) -> TransactionResult<Vec<u8>> {
        let mut buffer = Vec::new();
        
        // Version (4 bytes, little-endian)
        buffer.extend_from_slice(&self.version.to_le_bytes());
        
        // Input count (varint)
        buffer.extend_from_slice(&encode_varint(self.inputs.len() as u64));
        
        // Inputs
        for input in &self.inputs {
            buffer.extend_from_slice(&input.serialize()
                .map_err(|e| TransactionError::Serialization(e.to_string()))?);
        }
        
        // Output count (varint)
        buffer.extend_from_slice(&encode_varint(self.outputs.len() as u64));
        
        // Outputs
        for output in &self.outputs {
            buffer.extend_from_slice(&output.serialize());
        }
        
        // Lock time (4 bytes, little-endian)
        buffer.extend_from_slice(&self.lock_time.to_le_bytes());
        
        Ok(buffer)
    }
    
    /// Calculate transaction ID (txid)
    ///
    /// Txid is double SHA-256 of serialized transaction, reversed.
    ///
    /// **Reference**: TypeScript `tx.id('hex')` or `tx.hash`
    pub fn txid(&self) -> TransactionResult<String> {
        let serialized = self.serialize()?;
        
        // Double SHA-256
        let hash1 = Sha256::digest(&serialized);
        let hash2 = Sha256::digest(&hash1);
        
        // Reverse bytes for display (Bitcoin convention)
        let reversed: Vec<u8> = hash2.into_iter().rev().collect();
        
        Ok(hex::encode(reversed))
    }
    
    /// Calculate transaction hash (same as txid but not reversed)
    ///
    /// Used internally for sighash calculation
    pub fn hash(&self) -> TransactionResult<Vec<u8>> {
        let serialized = self.serialize()?;
        
        // Double SHA-256
        let hash1 = Sha256::digest(&serialized);
        let hash2 = Sha256::digest(&hash1);
        
        Ok(hash2.to_vec())
    }
    
    /// Get transaction size in bytes
    ///
    /// **Reference**: TypeScript `tx.size()`
    pub fn size(&self) -> TransactionResult<usize> {
        Ok(self.serialize()?.len())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode variable-length integer (varint)
fn encode_varint(n: u64) -> Vec<u8> {
    if n < 0xFD {
        vec![n as u8]
    } else if n <= 0xFFFF {
        let mut buf = vec![0xFD];
        buf.extend_from_slice(&(n as u16).to_le_bytes());
        buf
    } else if n <= 0xFFFFFFFF {
        let mut buf = vec![0xFE];
        buf.extend_from_slice(&(n as u32).to_le_bytes());
        buf
    } else {
        let mut buf = vec![0xFF];
        buf.extend_from_slice(&n.to_le_bytes());
        buf
    }
}
