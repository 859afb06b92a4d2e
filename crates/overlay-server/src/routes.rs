//! HTTP routes hosting the engine over the shape spec.md §6 describes.
//!
//! Reference: spec.md §6 EXTERNAL INTERFACES, SPEC_FULL.md §6. Router
//! wiring follows `panon-btc-cory/crates/cory/src/server/mod.rs`'s
//! `build_router` shape: a plain `axum::Router` over `Arc<AppState>`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use overlay_core::types::{LookupQuestion, Steak, TaggedBeef};
use overlay_core::Engine;

use crate::error::AppError;

pub struct AppState {
    pub engine: Engine,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/lookup", post(lookup))
        .route("/listTopicManagers", get(list_topic_managers))
        .route("/listLookupServices", get(list_lookup_services))
        .route("/getDocumentationForTopicManager/{name}", get(topic_manager_docs))
        .route("/getDocumentationForLookupService/{name}", get(lookup_service_docs))
        .route("/requestSyncResponse", post(request_sync_response))
        .with_state(state)
}

fn parse_topics_header(headers: &HeaderMap) -> Result<Vec<String>, AppError> {
    let raw = headers
        .get("X-Topics")
        .ok_or_else(|| AppError(overlay_core::OverlayError::Service("missing X-Topics header".to_string())))?;
    let raw = raw
        .to_str()
        .map_err(|_| AppError(overlay_core::OverlayError::Service("X-Topics header is not valid UTF-8".to_string())))?;
    serde_json::from_str(raw)
        .map_err(|err| AppError(overlay_core::OverlayError::Service(format!("X-Topics header is not a JSON array: {err}"))))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<Steak>, AppError> {
    let topics = parse_topics_header(&headers)?;
    let tagged = TaggedBeef { beef: body.to_vec(), topics };
    let steak = state.engine.submit(tagged, None).await?;
    Ok(Json(steak))
}

async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(question): Json<LookupQuestion>,
) -> Result<Json<overlay_core::types::LookupAnswer>, AppError> {
    let answer = state.engine.lookup(question).await?;
    Ok(Json(answer))
}

async fn list_topic_managers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.list_topic_managers())
}

async fn list_lookup_services(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.list_lookup_services())
}

async fn topic_manager_docs(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> String {
    state.engine.get_topic_manager_documentation(&name)
}

async fn lookup_service_docs(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> String {
    state.engine.get_lookup_service_documentation(&name)
}

async fn request_sync_response(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.engine.sync_advertisements().await;
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use overlay_core::types::AdmittanceInstructions;
    use overlay_core::OverlayResult;
    use overlay_services::chain_tracker::HttpChainTracker;
    use overlay_storage_sqlite::StorageSqlite;
    use tower::ServiceExt;

    struct NoopTopicManager;

    #[async_trait]
    impl overlay_core::TopicManager for NoopTopicManager {
        async fn identify_admissible_outputs(
            &self,
            _beef: &[u8],
            _previous_coins: &[u32],
        ) -> OverlayResult<AdmittanceInstructions> {
            Ok(AdmittanceInstructions::default())
        }
    }

    fn test_state() -> Arc<AppState> {
        let storage = std::sync::Arc::new(StorageSqlite::new_in_memory().unwrap());
        let chain_tracker = std::sync::Arc::new(HttpChainTracker::new("http://localhost:0"));
        let engine = Engine::new(storage, chain_tracker)
            .with_topic_manager("t", std::sync::Arc::new(NoopTopicManager));
        Arc::new(AppState { engine })
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_topic_managers_returns_registered_names() {
        let router = build_router(test_state());
        let response = router
            .oneshot(Request::builder().uri("/listTopicManagers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(["t"]));
    }

    #[tokio::test]
    async fn documentation_falls_back_to_the_literal_when_absent() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/getDocumentationForTopicManager/t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        assert_eq!(bytes, "No documentation found!".as_bytes());
    }

    #[tokio::test]
    async fn submit_without_x_topics_header_is_a_bad_request() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit")
                    .body(Body::from(vec![1, 2, 3]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
