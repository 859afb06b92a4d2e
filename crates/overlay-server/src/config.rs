//! Server configuration: an optional TOML file plus CLI overrides.
//!
//! Reference: SPEC_FULL.md §7 "Configuration" — `serde` + `toml` pairing,
//! grounded on `mimblewimble-grin/config/src/config.rs`'s
//! `toml::from_str` loading (the teacher workspace has no config crate of
//! its own). CLI parsing is `clap`'s derive API, grounded on
//! `panon-btc-cory/crates/cory/src/cli.rs`.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use overlay_core::Chain;

/// Overlay node configuration. Every field has a sensible default so the
/// server can start with no config file at all; a TOML file (via
/// `--config`) supplies the rest, and individual CLI flags override
/// whatever the file sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// This node's own advertised domain, used to mint SHIP/SLAP
    /// advertisements and to exclude itself from peer fan-out.
    pub hosting_url: String,

    /// Address the HTTP server binds to.
    pub listen_addr: String,

    /// Path to the SQLite database file.
    pub sqlite_path: PathBuf,

    /// Which network this node tracks.
    pub chain: Chain,

    /// Bootstrap SHIP-tracker domains unioned into peer fan-out whenever
    /// `tm_ship` itself admits an output (spec.md §4.1).
    pub ship_trackers: Vec<String>,

    /// Bootstrap SLAP-tracker domains, mirroring `ship_trackers`.
    pub slap_trackers: Vec<String>,

    /// Base URL of an ARC-compatible transaction processor used to
    /// broadcast admitted transactions.
    pub arc_url: String,

    /// Base URL of the chain-tracking service SPV verification is checked
    /// against.
    pub chain_tracker_url: String,

    /// How often to run `syncAdvertisements` in the background, in
    /// seconds. `0` disables the background task (the `/requestSyncResponse`
    /// endpoint remains available either way).
    pub sync_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosting_url: "http://localhost:8080".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            sqlite_path: PathBuf::from("overlay.sqlite"),
            chain: Chain::Main,
            ship_trackers: Vec::new(),
            slap_trackers: Vec::new(),
            arc_url: "https://arc.taal.com".to_string(),
            chain_tracker_url: "https://headers.example".to_string(),
            sync_interval_secs: 0,
        }
    }
}

impl Config {
    /// Load a TOML config file, falling back to all-defaults when absent.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else { return Ok(Self::default()) };
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Read { path: path.to_path_buf(), source: err })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse { path: path.to_path_buf(), source: err })
    }

    /// Apply CLI overrides on top of whatever the config file set.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.hosting_url {
            self.hosting_url = v.clone();
        }
        if let Some(v) = &cli.listen_addr {
            self.listen_addr = v.clone();
        }
        if let Some(v) = &cli.sqlite_path {
            self.sqlite_path = v.clone();
        }
        if let Some(v) = cli.chain {
            self.chain = v;
        }
        if let Some(v) = &cli.arc_url {
            self.arc_url = v.clone();
        }
        if let Some(v) = &cli.chain_tracker_url {
            self.chain_tracker_url = v.clone();
        }
        if let Some(v) = cli.sync_interval_secs {
            self.sync_interval_secs = v;
        }
    }
}

fn parse_chain(s: &str) -> Result<Chain, String> {
    match s {
        "main" => Ok(Chain::Main),
        "test" => Ok(Chain::Test),
        other => Err(format!("unknown chain `{other}`, expected `main` or `test`")),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Overlay Services Engine — submits, admits, and serves topic-scoped
/// UTXO lookups.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override `hosting_url`.
    #[arg(long)]
    pub hosting_url: Option<String>,

    /// Override `listen_addr`.
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Override `sqlite_path`.
    #[arg(long)]
    pub sqlite_path: Option<PathBuf>,

    /// Override `chain` (`main` or `test`).
    #[arg(long, value_parser = parse_chain)]
    pub chain: Option<Chain>,

    /// Override `arc_url`.
    #[arg(long)]
    pub arc_url: Option<String>,

    /// Override `chain_tracker_url`.
    #[arg(long)]
    pub chain_tracker_url: Option<String>,

    /// Override `sync_interval_secs`.
    #[arg(long)]
    pub sync_interval_secs: Option<u64>,
}
