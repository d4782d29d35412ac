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

//! §4.3 — the thin axum adapter over [`crate::engine::Engine`]: media-type checks,
//! `channel` query extraction, the stranded-reply sweep, and CORS.

mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::engine::Engine;
use crate::txn::TransactionCounter;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub txn: Arc<TransactionCounter>,
    pub config: Arc<Config>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Builds the full router: the five rendezvous endpoints plus `/ping` and `/stats`,
/// wrapped in a permissive CORS layer (§7: `Access-Control-Allow-Origin: *`
/// unconditionally) and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/stats", get(handlers::stats))
        .route("/queue_request", post(handlers::queue_request))
        .route("/queue_reply", post(handlers::queue_reply))
        .route("/dequeue_request", get(handlers::dequeue_request))
        .route("/dequeue_reply", get(handlers::dequeue_reply))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
