//! Thin HTTP-backed implementations of the engine's outward-facing plug-in
//! traits: [`ChainTracker`], [`Broadcaster`], and [`Gossiper`].
//!
//! Reference: spec.md §6 EXTERNAL INTERFACES. `overlay-core` defines the
//! contracts; this crate supplies the network clients a hosting node
//! actually wires in, grounded on the teacher's `chaintracker`/ARC HTTP
//! client shape.
//!
//! [`ChainTracker`]: overlay_core::traits::ChainTracker
//! [`Broadcaster`]: overlay_core::traits::Broadcaster
//! [`Gossiper`]: overlay_core::traits::Gossiper

pub mod broadcaster;
pub mod chain_tracker;
pub mod error;
pub mod gossiper;

pub use broadcaster::ArcBroadcaster;
pub use chain_tracker::HttpChainTracker;
pub use error::{ServiceError, ServiceResult};
pub use gossiper::HttpGossiper;
