//! Broadcasts admitted transactions to the base network.
//!
//! Reference: spec.md §6 EXTERNAL INTERFACES. Grounded on the teacher's
//! ARC broadcaster client — a thin HTTP POST of the raw transaction hex,
//! with the service's own success/failure folded into an engine error
//! rather than a rich per-provider result type (the overlay only needs to
//! know whether broadcast succeeded).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use overlay_core::error::{OverlayError, OverlayResult};
use overlay_core::traits::Broadcaster;
use overlay_core::transaction::Transaction;

use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
struct ArcResponse {
    #[serde(rename = "txStatus")]
    tx_status: Option<String>,
    title: Option<String>,
}

impl ArcResponse {
    fn is_success(&self) -> bool {
        matches!(
            self.tx_status.as_deref(),
            Some("SEEN_ON_NETWORK") | Some("ACCEPTED") | Some("STORED") | Some("MINED")
        )
    }
}

/// Posts raw transaction hex to an ARC-compatible transaction processor.
pub struct ArcBroadcaster {
    url: String,
    client: Client,
}

impl ArcBroadcaster {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: Client::new() }
    }

    async fn post_raw_tx(&self, raw_tx_hex: &str) -> Result<ArcResponse, ServiceError> {
        let response = self
            .client
            .post(format!("{}/v1/tx", self.url))
            .json(&serde_json::json!({ "rawTx": raw_tx_hex }))
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Broadcaster for ArcBroadcaster {
    async fn broadcast(&self, tx: &Transaction) -> OverlayResult<()> {
        let raw_tx_hex = hex::encode(
            tx.serialize()
                .map_err(|err| OverlayError::Service(format!("failed to serialize transaction: {err}")))?,
        );
        let response = self.post_raw_tx(&raw_tx_hex).await.map_err(ServiceError::from)?;
        if response.is_success() {
            Ok(())
        } else {
            Err(OverlayError::Service(
                response.title.unwrap_or_else(|| "ARC rejected the transaction".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_response_recognizes_accepted_statuses() {
        let accepted = ArcResponse { tx_status: Some("SEEN_ON_NETWORK".to_string()), title: None };
        assert!(accepted.is_success());

        let rejected = ArcResponse { tx_status: Some("REJECTED".to_string()), title: Some("bad tx".into()) };
        assert!(!rejected.is_success());
    }
}
