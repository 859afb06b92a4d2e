//! Peer fan-out client: forwards admitted submissions to other overlay
//! nodes' `/submit` endpoints.
//!
//! Reference: spec.md §4.1 "Peer propagation", §6 EXTERNAL INTERFACES.

use async_trait::async_trait;
use reqwest::Client;

use overlay_core::error::OverlayResult;
use overlay_core::traits::Gossiper;
use overlay_core::types::TaggedBeef;

use crate::error::ServiceError;

pub struct HttpGossiper {
    client: Client,
}

impl HttpGossiper {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for HttpGossiper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gossiper for HttpGossiper {
    async fn post_tagged_beef(&self, domain: &str, beef: &TaggedBeef) -> OverlayResult<()> {
        let topics_header = serde_json::to_string(&beef.topics)
            .map_err(|err| ServiceError::InvalidResponse { service: domain.to_string(), message: err.to_string() })?;
        let response = self
            .client
            .post(format!("{domain}/submit"))
            .header("Content-Type", "application/octet-stream")
            .header("X-Topics", topics_header)
            .body(beef.beef.clone())
            .send()
            .await
            .map_err(ServiceError::from)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::InvalidResponse {
                service: domain.to_string(),
                message: format!("peer returned status {}", response.status()),
            }
            .into())
        }
    }
}
