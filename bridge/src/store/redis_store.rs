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

//! The production [`Store`] backend: a Redis-compatible server reachable over the
//! network, so multiple relay processes can cooperate against the same channel state.
//! Redis hashes map directly onto slot/stat records; `HSET`/`HGET`/`HDEL`/`EXPIRE`/
//! `HINCRBY`/`KEYS` give us exactly the atomic per-field semantics §4.1 requires.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands as _;

use super::{FieldValue, Store};
use crate::error::{BridgeError, BridgeResult};

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to `url` (eg `redis://127.0.0.1:6379`) and wraps the connection in a
    /// [`ConnectionManager`], which reconnects transparently if the store restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL can't be parsed or the initial connection fails.
    pub async fn connect(url: &str) -> BridgeResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| BridgeError::StoreFailure(format!("invalid store url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| BridgeError::StoreFailure(format!("failed connecting to store: {e}")))?;
        Ok(Self { conn })
    }

    fn fault(context: &str, e: redis::RedisError) -> BridgeError {
        BridgeError::StoreFailure(format!("{context}: {e}"))
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set_fields(&self, key: &str, fields: &[(&str, FieldValue)]) -> BridgeResult<()> {
        let mut conn = self.conn.clone();
        let pairs: Vec<(&str, Vec<u8>)> = fields
            .iter()
            .map(|(f, v)| (*f, v.as_bytes().to_vec()))
            .collect();
        let () = conn
            .hset_multiple(key, &pairs)
            .await
            .map_err(|e| Self::fault("set_fields", e))?;
        Ok(())
    }

    async fn get_field(&self, key: &str, field: &str) -> BridgeResult<Option<FieldValue>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .hget(key, field)
            .await
            .map_err(|e| Self::fault("get_field", e))?;
        Ok(value.map(FieldValue::Bytes))
    }

    async fn get_all(&self, key: &str) -> BridgeResult<Vec<(String, FieldValue)>> {
        let mut conn = self.conn.clone();
        let pairs: Vec<(String, Vec<u8>)> = conn
            .hgetall(key)
            .await
            .map_err(|e| Self::fault("get_all", e))?;
        Ok(pairs
            .into_iter()
            .map(|(f, v)| (f, FieldValue::Bytes(v)))
            .collect())
    }

    async fn delete_field(&self, key: &str, field: &str) -> BridgeResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn
            .hdel(key, field)
            .await
            .map_err(|e| Self::fault("delete_field", e))?;
        Ok(deleted == 1)
    }

    async fn delete_key(&self, key: &str) -> BridgeResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await.map_err(|e| Self::fault("delete_key", e))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BridgeResult<()> {
        let mut conn = self.conn.clone();
        let set: bool = conn
            .expire(key, i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
            .await
            .map_err(|e| Self::fault("expire", e))?;
        if set {
            Ok(())
        } else {
            Err(BridgeError::StoreFailure(format!("store failed expiring {key}")))
        }
    }

    async fn increment_field(&self, key: &str, field: &str, n: i64) -> BridgeResult<i64> {
        let mut conn = self.conn.clone();
        conn.hincr(key, field, n)
            .await
            .map_err(|e| Self::fault("increment_field", e))
    }

    async fn scan(&self, pattern: &str) -> BridgeResult<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.keys(pattern).await.map_err(|e| Self::fault("scan", e))
    }
}
