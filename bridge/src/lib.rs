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

//! `jupyter-bridge` — a rendezvous relay between a remote Jupyter kernel and a
//! browser-based client. See `SPEC_FULL.md` at the workspace root for the full
//! protocol description.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod logging;
pub mod stats;
pub mod startup;
pub mod store;
pub mod txn;

pub use config::Config;
pub use engine::Engine;
pub use error::{BridgeError, BridgeResult};
pub use txn::TransactionCounter;
