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

//! A single-process, in-memory [`Store`] implementation. Used by tests; preserves the
//! same semantics (atomic per-field writes, absence-vs-empty, TTL-on-write) the
//! production Redis-backed store must honour, so engine tests don't need a running
//! Redis.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{FieldValue, Store};
use crate::error::BridgeResult;

#[derive(Debug, Default)]
struct Record {
    fields: HashMap<String, FieldValue>,
    expires_at: Option<Instant>,
}

impl Record {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Holds all keys behind a single mutex. This is deliberately simple: the engine never
/// holds the store lock across an `.await` on anything else, so a single mutex doesn't
/// become a bottleneck for the scale this relay runs at.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn glob_match(pattern: &str, candidate: &str) -> bool {
    // Only the `*` wildcards this relay actually uses (`*:request`, `*:reply`,
    // `stat:*`) need supporting; no need for a general glob engine.
    match pattern.split_once('*') {
        None => pattern == candidate,
        Some((prefix, suffix)) => {
            candidate.len() >= prefix.len() + suffix.len()
                && candidate.starts_with(prefix)
                && candidate.ends_with(suffix)
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set_fields(&self, key: &str, fields: &[(&str, FieldValue)]) -> BridgeResult<()> {
        let mut keys = self.keys.lock().await;
        let record = keys.entry(key.to_string()).or_default();
        if record.is_expired() {
            record.fields.clear();
        }
        for (field, value) in fields {
            record.fields.insert((*field).to_string(), value.clone());
        }
        Ok(())
    }

    async fn get_field(&self, key: &str, field: &str) -> BridgeResult<Option<FieldValue>> {
        let mut keys = self.keys.lock().await;
        let Some(record) = keys.get(key) else { return Ok(None) };
        if record.is_expired() {
            keys.remove(key);
            return Ok(None);
        }
        Ok(record.fields.get(field).cloned())
    }

    async fn get_all(&self, key: &str) -> BridgeResult<Vec<(String, FieldValue)>> {
        let mut keys = self.keys.lock().await;
        let Some(record) = keys.get(key) else { return Ok(Vec::new()) };
        if record.is_expired() {
            keys.remove(key);
            return Ok(Vec::new());
        }
        Ok(record
            .fields
            .iter()
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect())
    }

    async fn delete_field(&self, key: &str, field: &str) -> BridgeResult<bool> {
        let mut keys = self.keys.lock().await;
        Ok(keys
            .get_mut(key)
            .is_some_and(|record| record.fields.remove(field).is_some()))
    }

    async fn delete_key(&self, key: &str) -> BridgeResult<()> {
        let mut keys = self.keys.lock().await;
        keys.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BridgeResult<()> {
        let mut keys = self.keys.lock().await;
        match keys.get_mut(key) {
            Some(record) => {
                record.expires_at = Some(Instant::now() + ttl);
                Ok(())
            }
            None => Err(crate::error::BridgeError::StoreFailure(format!(
                "cannot expire missing key {key}"
            ))),
        }
    }

    async fn increment_field(&self, key: &str, field: &str, n: i64) -> BridgeResult<i64> {
        let mut keys = self.keys.lock().await;
        let record = keys.entry(key.to_string()).or_default();
        if record.is_expired() {
            record.fields.clear();
        }
        let current = record
            .fields
            .get(field)
            .and_then(|v| v.as_text())
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        let updated = current + n;
        record
            .fields
            .insert(field.to_string(), FieldValue::Text(updated.to_string()));
        Ok(updated)
    }

    async fn scan(&self, pattern: &str) -> BridgeResult<Vec<String>> {
        let mut keys = self.keys.lock().await;
        keys.retain(|_, record| !record.is_expired());
        Ok(keys
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_field_distinguishes_absent_from_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.get_field("c1:request", "message").await.unwrap(), None);

        store
            .set_fields("c1:request", &[("message", FieldValue::Bytes(Vec::new()))])
            .await
            .unwrap();
        assert_eq!(
            store.get_field("c1:request", "message").await.unwrap(),
            Some(FieldValue::Bytes(Vec::new()))
        );
    }

    #[tokio::test]
    async fn expire_fails_on_missing_key() {
        let store = MemoryStore::new();
        assert!(store.expire("missing", Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn scan_matches_suffix_and_prefix_globs() {
        let store = MemoryStore::new();
        store.set_fields("c1:request", &[("message", "x".into())]).await.unwrap();
        store.set_fields("c1:reply", &[("message", "y".into())]).await.unwrap();
        store.set_fields("stat:2024-01-01", &[("count:request", "1".into())]).await.unwrap();

        let mut requests = store.scan("*:request").await.unwrap();
        requests.sort();
        assert_eq!(requests, vec!["c1:request".to_string()]);

        let stats = store.scan("stat:*").await.unwrap();
        assert_eq!(stats, vec!["stat:2024-01-01".to_string()]);
    }

    #[tokio::test]
    async fn increment_field_accumulates() {
        let store = MemoryStore::new();
        assert_eq!(store.increment_field("stat:today", "count:request", 1).await.unwrap(), 1);
        assert_eq!(store.increment_field("stat:today", "count:request", 2).await.unwrap(), 3);
    }
}
