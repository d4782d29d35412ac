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

use std::sync::Arc;

use jupyter_bridge::http::{router, AppState};
use jupyter_bridge::store::redis_store::RedisStore;
use jupyter_bridge::store::Store;
use jupyter_bridge::{startup, Config, Engine, TransactionCounter};
use miette::IntoDiagnostic as _;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let config = Config::try_load()?;
    let _logging_guard = jupyter_bridge::logging::init(config.log_file.as_deref());

    tracing::info!(version = jupyter_bridge::config::JUPYTER_BRIDGE_VERSION, "starting jupyter-bridge");

    let store: Arc<dyn Store> = Arc::new(RedisStore::connect(&config.store_url).await.into_diagnostic()?);
    startup::scrub_stale_slots(store.as_ref()).await.into_diagnostic()?;

    let config = Arc::new(config);
    let state = AppState {
        engine: Arc::new(Engine::new(store, config.clone())),
        txn: Arc::new(TransactionCounter::new()),
        config: config.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.into_diagnostic()?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, router(state)).await.into_diagnostic()?;

    Ok(())
}
