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

//! A thin facade over a shared key/value service. [`Store`] is the only collaborator
//! the rendezvous engine talks to; it never touches Redis (or whatever backs
//! production) directly. This keeps the engine's concurrency semantics (§4.2 of
//! `SPEC_FULL.md`) testable against [`memory::MemoryStore`] without a running server.

pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BridgeResult;

/// A single hash-field value as stored: either a UTF-8 string (timestamps, counters,
/// status flags) or raw bytes (the `message` field, which is an opaque payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FieldValue::Text(s) => s.as_bytes(),
            FieldValue::Bytes(b) => b,
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FieldValue::Text(s) => s.into_bytes(),
            FieldValue::Bytes(b) => b,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Bytes(b) => std::str::from_utf8(b).ok(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

/// The store contract every backend (and the in-memory test double) must honour:
/// atomic per-field writes, absence-vs-empty distinction, and key-level TTL that resets
/// on every write that calls [`Store::expire`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Upserts the named fields atomically within `key`.
    async fn set_fields(&self, key: &str, fields: &[(&str, FieldValue)]) -> BridgeResult<()>;

    /// Reads a single field. `None` means the field (or the key) is absent.
    async fn get_field(&self, key: &str, field: &str) -> BridgeResult<Option<FieldValue>>;

    /// Reads every field of `key`. Empty if the key doesn't exist.
    async fn get_all(&self, key: &str) -> BridgeResult<Vec<(String, FieldValue)>>;

    /// Deletes a single field. Returns whether it existed.
    async fn delete_field(&self, key: &str, field: &str) -> BridgeResult<bool>;

    /// Deletes the whole key.
    async fn delete_key(&self, key: &str) -> BridgeResult<()>;

    /// Sets (or refreshes) the idle TTL on `key`. Failing to set a TTL on a key that
    /// exists is a store fault, not a soft error.
    async fn expire(&self, key: &str, ttl: Duration) -> BridgeResult<()>;

    /// Atomically adds `n` to an integer field, creating it at `n` if absent.
    async fn increment_field(&self, key: &str, field: &str, n: i64) -> BridgeResult<i64>;

    /// Enumerates keys matching a shell-style glob. Used only at startup (the scrub)
    /// and by the stats projection — never on the request hot path.
    async fn scan(&self, pattern: &str) -> BridgeResult<Vec<String>>;
}
