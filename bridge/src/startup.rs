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

//! §4.4 — on process start, clears out any `*:request` and `*:reply` keys left by a
//! prior instance before the listener binds. Counter keys (`stat:*`) are untouched.

use crate::error::BridgeResult;
use crate::store::Store;

/// Runs once, synchronously, before the HTTP listener binds.
///
/// # Errors
///
/// Returns [`crate::error::BridgeError::StoreFailure`] if the scan or a delete fails.
pub async fn scrub_stale_slots(store: &dyn Store) -> BridgeResult<()> {
    for pattern in ["*:reply", "*:request"] {
        for key in store.scan(pattern).await? {
            store.delete_key(&key).await?;
            tracing::debug!(key = %key, "deleted stale slot key");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jupyter_bridge_schema::{slot_field, stat_key};

    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::FieldValue;

    #[tokio::test]
    async fn scrub_deletes_only_slot_keys() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_fields("c1:request", &[(slot_field::MESSAGE, FieldValue::Bytes(b"x".to_vec()))])
            .await
            .unwrap();
        store
            .set_fields("c1:reply", &[(slot_field::MESSAGE, FieldValue::Bytes(b"y".to_vec()))])
            .await
            .unwrap();
        let stat = stat_key("2024-01-01");
        store.set_fields(&stat, &[("count:request", "3".into())]).await.unwrap();

        scrub_stale_slots(store.as_ref()).await.unwrap();

        assert!(store.scan("*:request").await.unwrap().is_empty());
        assert!(store.scan("*:reply").await.unwrap().is_empty());
        assert_eq!(store.scan("stat:*").await.unwrap(), vec![stat]);
    }
}
