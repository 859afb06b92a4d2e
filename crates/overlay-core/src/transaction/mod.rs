//! A minimal Bitcoin-family transaction model.
//!
//! The real transaction/BEEF codec and script/signature validation are
//! assumed external collaborators (see spec.md §1/§2 "Out of scope"); this
//! module gives the admission engine and UTXO graph enough of a
//! transaction shape — inputs, outputs, an embeddable ancestor per input,
//! and a slot for a merkle path — to exercise every operation in §4
//! without a full consensus codec.

pub mod outpoint;
pub mod transaction;
pub mod tx_input;
pub mod tx_output;

pub use outpoint::OutPoint;
pub use transaction::Transaction;
pub use tx_input::TxInput;
pub use tx_output::TxOutput;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("invalid transaction format: {0}")]
    InvalidFormat(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type TransactionResult<T> = Result<T, TransactionError>;
