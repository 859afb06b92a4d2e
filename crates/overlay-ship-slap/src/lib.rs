//! Concrete implementations of the four plug-in names spec.md §6 reserves
//! but never defines: the `tm_ship`/`tm_slap` topic managers, the
//! `ls_ship`/`ls_slap` lookup services, and a default [`Advertiser`] tying
//! them together.
//!
//! Without this crate the peer-propagation step of `overlay-core`'s
//! `submit` pipeline has nothing to query: it looks up `ls_ship` to find
//! which domains host a topic, and `ls_ship` only has answers once
//! `tm_ship` has admitted some SHIP advertisement outputs.

mod advertiser;
mod lookup_services;
mod topic_managers;

pub use advertiser::ShipSlapAdvertiser;
pub use lookup_services::{ShipLookupService, SlapLookupService};
pub use topic_managers::{ShipTopicManager, SlapTopicManager};
