//! The overlay services engine: admission pipeline, topic-scoped UTXO
//! graph, history rehydration, and peer propagation.
//!
//! This crate is transport- and storage-agnostic. It defines the plug-in
//! contracts ([`traits`]) concrete deployments implement, and drives them
//! from [`engine::Engine`]. `overlay-storage-sqlite` supplies a [`Storage`]
//! implementation; `overlay-services` supplies [`ChainTracker`],
//! [`Broadcaster`], and [`Gossiper`]; `overlay-ship-slap` supplies the
//! reserved `tm_ship`/`tm_slap`/`ls_ship`/`ls_slap` plug-ins.
//!
//! [`Storage`]: overlay_storage::Storage
//! [`ChainTracker`]: traits::ChainTracker
//! [`Broadcaster`]: traits::Broadcaster
//! [`Gossiper`]: traits::Gossiper

pub mod beef;
pub mod engine;
pub mod error;
pub mod traits;
pub mod transaction;
pub mod types;

#[cfg(test)]
mod testutil;

pub use engine::Engine;
pub use error::{OverlayError, OverlayResult};
pub use traits::{Advertiser, Broadcaster, ChainTracker, Gossiper, LookupService, TopicManager};
pub use types::{
    AdmittanceInstructions, Advertisement, Chain, HistorySelector, LookupAnswer, LookupFormula,
    LookupFormulaItem, LookupOutcome, LookupOutput, LookupQuestion, ShipAdvertisement,
    SlapAdvertisement, Steak, TaggedBeef, LS_SHIP, LS_SLAP, NO_DOCUMENTATION, TM_SHIP, TM_SLAP,
};
