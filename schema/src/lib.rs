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

//! # jupyter-bridge-schema
//!
//! This crate is a shared dependency of `jupyter-bridge` and whatever talks to its
//! store directly (tooling, migrations, inspection scripts). It describes the record
//! shapes persisted in the shared store: per-channel slot records and per-day
//! statistics records. Keeping these types in their own crate means the wire format
//! can be versioned and depended on without pulling in the HTTP surface or the
//! rendezvous engine.

// Attach.
pub mod slot;
pub mod stats;

// Re-export.
pub use slot::*;
pub use stats::*;
