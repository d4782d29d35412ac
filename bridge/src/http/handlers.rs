/*
 *   Copyright (c) 2023-2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::body::Bytes;
use serde::Deserialize;

use super::AppState;
use crate::config::PAD_MESSAGE_LEN;
use crate::engine::DequeueOutcome;
use crate::error::BridgeError;
use jupyter_bridge_schema::Direction;

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    channel: Option<String>,
    #[serde(default)]
    reset: bool,
}

pub async fn ping() -> impl IntoResponse {
    format!("pong {}", crate::config::JUPYTER_BRIDGE_VERSION)
}

pub async fn stats(State(state): State<AppState>) -> Result<Response, BridgeError> {
    let csv = state.engine.stats().render_csv().await?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

fn require_channel(query: &ChannelQuery) -> Result<&str, BridgeError> {
    query.channel.as_deref().filter(|c| !c.is_empty()).ok_or(BridgeError::MissingChannel)
}

fn require_media_type(headers: &HeaderMap, expected: &'static str) -> Result<(), BridgeError> {
    let actual = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if actual.split(';').next().unwrap_or_default().trim() == expected {
        Ok(())
    } else {
        Err(BridgeError::WrongMediaType { expected })
    }
}

/// §4.3 — before queuing a new request, sweep any stranded reply left by a prior,
/// abandoned transaction on the same channel.
async fn sweep_stranded_reply(state: &AppState, txn: u64, channel: &str) -> Result<(), BridgeError> {
    let deleted = state.engine.clear_message(channel, Direction::Reply).await?;
    if deleted {
        tracing::warn!(txn, channel, "swept stranded reply before queuing new request");
    }
    Ok(())
}

pub async fn queue_request(
    State(state): State<AppState>,
    Query(query): Query<ChannelQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BridgeError> {
    let txn = state.txn.next_id();
    tracing::debug!(txn, "into queue_request");

    let result = async {
        require_media_type(&headers, "application/json")?;
        let channel = require_channel(&query)?;
        sweep_stranded_reply(&state, txn, channel).await?;
        state.engine.enqueue(txn, Direction::Request, channel, body.to_vec()).await?;
        Ok(StatusCode::OK.into_response())
    }
    .await;

    tracing::debug!(txn, ok = result.is_ok(), "out of queue_request");
    result
}

pub async fn queue_reply(
    State(state): State<AppState>,
    Query(query): Query<ChannelQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BridgeError> {
    let txn = state.txn.next_id();
    tracing::debug!(txn, "into queue_reply");

    let result = async {
        require_media_type(&headers, "text/plain")?;
        let channel = require_channel(&query)?;
        state.engine.enqueue(txn, Direction::Reply, channel, body.to_vec()).await?;
        Ok(StatusCode::OK.into_response())
    }
    .await;

    tracing::debug!(txn, ok = result.is_ok(), "out of queue_reply");
    result
}

async fn dequeue(state: AppState, query: ChannelQuery, direction: Direction) -> Result<Response, BridgeError> {
    let txn = state.txn.next_id();
    tracing::debug!(txn, direction = %direction, "into dequeue_handler");

    let result = async {
        let channel = require_channel(&query)?.to_string();
        let outcome = state.engine.dequeue(txn, direction, &channel, query.reset).await?;
        match outcome {
            DequeueOutcome::Delivered(mut payload) => {
                if state.config.padding_enabled() {
                    payload.extend(std::iter::repeat_n(b' ', PAD_MESSAGE_LEN));
                }
                Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], payload).into_response())
            }
            DequeueOutcome::TimedOut => Err(BridgeError::Timeout {
                channel,
                direction: direction.as_key_suffix(),
            }),
            DequeueOutcome::Redundant => Err(BridgeError::RedundantReader {
                channel,
                direction: direction.as_key_suffix(),
            }),
        }
    }
    .await;

    tracing::debug!(txn, ok = result.is_ok(), "out of dequeue_handler");
    result
}

pub async fn dequeue_request(
    State(state): State<AppState>,
    Query(query): Query<ChannelQuery>,
) -> Result<Response, BridgeError> {
    dequeue(state, query, Direction::Request).await
}

pub async fn dequeue_reply(
    State(state): State<AppState>,
    Query(query): Query<ChannelQuery>,
) -> Result<Response, BridgeError> {
    dequeue(state, query, Direction::Reply).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use clap::Parser as _;
    use http_body_util::BodyExt as _;
    use jupyter_bridge_schema::Direction;
    use tower::ServiceExt as _;

    use super::super::{router, AppState};
    use crate::config::{Config, PAD_MESSAGE_LEN};
    use crate::engine::Engine;
    use crate::store::memory::MemoryStore;
    use crate::txn::TransactionCounter;

    fn test_state() -> AppState {
        let config = Arc::new(Config::parse_from(["jupyter-bridge"]));
        let store = Arc::new(MemoryStore::new());
        AppState {
            engine: Arc::new(Engine::new(store, config.clone())),
            txn: Arc::new(TransactionCounter::new()),
            config,
        }
    }

    #[tokio::test]
    async fn ping_reports_version() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8(body.to_vec()).unwrap().starts_with("pong "));
    }

    #[tokio::test]
    async fn queue_request_rejects_wrong_media_type() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue_request?channel=c1")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn queue_request_missing_channel_fails() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue_request")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn happy_request_reply_round_trip() {
        let state = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue_request?channel=c1")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"op":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dequeue_request?channel=c1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.starts_with(br#"{"op":"ping"}"#));
        assert_eq!(body.len(), r#"{"op":"ping"}"#.len() + PAD_MESSAGE_LEN);
    }

    #[tokio::test]
    async fn stranded_reply_is_swept_before_new_request() {
        let state = test_state();
        let app = router(state.clone());

        state.engine.enqueue(0, Direction::Reply, "c2", b"stale".to_vec()).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue_request?channel=c2")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let reply_message = state
            .engine
            .clear_message("c2", Direction::Reply)
            .await
            .unwrap();
        assert!(!reply_message, "stranded reply should already have been swept");
    }

    #[tokio::test]
    async fn slot_occupied_maps_to_500() {
        let state = test_state();
        state.engine.enqueue(0, Direction::Reply, "c5", b"A".to_vec()).await.unwrap();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue_reply?channel=c5")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("B"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
