//! `axum` HTTP host for the overlay services engine.
//!
//! Reference: SPEC_FULL.md §6, spec.md §6 EXTERNAL INTERFACES. Wiring
//! follows `panon-btc-cory/crates/cory/src/server/mod.rs`'s split between a
//! `build_router` function and a thin `main.rs` that assembles the
//! concrete plug-ins and calls it.

pub mod config;
pub mod error;
pub mod routes;

pub use config::{Cli, Config, ConfigError};
pub use routes::{build_router, AppState};
