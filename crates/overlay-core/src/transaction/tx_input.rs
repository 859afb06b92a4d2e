//! Transaction input.
//!
//! Spends a previous output by reference. `source_transaction` is the BEEF
//! envelope's mechanism for embedding an ancestor transaction directly on
//! the input that spends it — populated during history rehydration
//! (`getUTXOHistory`) and merkle-proof back-fill (`updateMerkleProof`).

use super::{OutPoint, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_out: OutPoint,

    #[serde(rename = "scriptSig", default)]
    pub script_sig: Vec<u8>,

    pub sequence: u32,

    /// The ancestor transaction this input spends, embedded inline. Present
    /// only when the BEEF envelope carries it (i.e. not every input of
    /// every transaction has its ancestor embedded).
    #[serde(rename = "sourceTransaction", default, skip_serializing_if = "Option::is_none")]
    pub source_transaction: Option<Box<Transaction>>,
}

impl TxInput {
    pub fn new(prev_out: OutPoint) -> Self {
        Self {
            prev_out,
            script_sig: Vec::new(),
            sequence: 0xFFFFFFFF,
            source_transaction: None,
        }
    }

    pub fn with_sequence(prev_out: OutPoint, sequence: u32) -> Self {
        Self {
            prev_out,
            script_sig: Vec::new(),
            sequence,
            source_transaction: None,
        }
    }

    pub fn set_script(&mut self, script: Vec<u8>) {
        self.script_sig = script;
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }

    pub fn serialize(&self) -> Result<Vec<u8>, hex::FromHexError> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&self.prev_out.serialize()?);
        buffer.extend_from_slice(&encode_varint(self.script_sig.len() as u64));
        buffer.extend_from_slice(&self.script_sig);
        buffer.extend_from_slice(&self.sequence.to_le_bytes());
        Ok(buffer)
    }
}

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
