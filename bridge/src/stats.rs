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

//! §4.4 — per-day counters of message counts and cumulative payload bytes per
//! direction, plus the read-only CSV projection exposed at `/stats`.

use std::sync::Arc;

use chrono::Utc;
use jupyter_bridge_schema::{stat_field, stat_key, DailyStats, Direction, STATS_CSV_HEADER};

use crate::error::BridgeResult;
use crate::store::Store;

pub struct StatsRecorder {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for StatsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsRecorder").finish_non_exhaustive()
    }
}

impl StatsRecorder {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Increments today's `count:<direction>` by 1 and `<direction>` (cumulative
    /// bytes) by `payload_len`. Called once per successful enqueue.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::StoreFailure`] if the underlying
    /// increments fail.
    pub async fn record_enqueue(&self, direction: Direction, payload_len: usize) -> BridgeResult<()> {
        let key = stat_key(&Utc::now().format("%Y-%m-%d").to_string());
        self.store.increment_field(&key, &stat_field::count(direction), 1).await?;
        self.store
            .increment_field(&key, stat_field::bytes(direction), i64::try_from(payload_len).unwrap_or(i64::MAX))
            .await?;
        Ok(())
    }

    /// Enumerates all `stat:*` records, decodes their four fields (absent fields
    /// render as empty CSV cells), sorts by date ascending, and renders the fixed CSV
    /// header followed by one line per day.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::StoreFailure`] if the underlying scan or
    /// reads fail.
    pub async fn render_csv(&self) -> BridgeResult<String> {
        let keys = self.store.scan(&format!("{}:*", stat_field::STATISTIC_KEY_PREFIX)).await?;

        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            let date = key
                .strip_prefix(&format!("{}:", stat_field::STATISTIC_KEY_PREFIX))
                .unwrap_or(&key)
                .to_string();
            let fields = self.store.get_all(&key).await?;
            let field = |name: &str| {
                fields
                    .iter()
                    .find(|(f, _)| f == name)
                    .and_then(|(_, v)| v.as_text())
                    .and_then(|s| s.parse::<u64>().ok())
            };
            rows.push(DailyStats {
                date,
                count_request: field(&stat_field::count(Direction::Request)),
                request_bytes: field(stat_field::bytes(Direction::Request)),
                count_reply: field(&stat_field::count(Direction::Reply)),
                reply_bytes: field(stat_field::bytes(Direction::Reply)),
            });
        }
        rows.sort_by(|a, b| a.date.cmp(&b.date));

        let mut csv = String::from(STATS_CSV_HEADER);
        for row in &rows {
            csv.push('\n');
            csv.push_str(&row.to_csv_line());
        }
        Ok(csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn renders_two_requests_and_one_reply() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let recorder = StatsRecorder::new(store.clone());

        recorder.record_enqueue(Direction::Request, 10).await.unwrap();
        recorder.record_enqueue(Direction::Request, 20).await.unwrap();
        recorder.record_enqueue(Direction::Reply, 5).await.unwrap();

        let csv = recorder.render_csv().await.unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let expected_line = format!("{today},2,30,1,5");
        assert!(csv.contains(&expected_line), "csv was:\n{csv}");
        assert!(csv.starts_with(STATS_CSV_HEADER));
    }

    #[tokio::test]
    async fn empty_store_renders_header_only() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let recorder = StatsRecorder::new(store);
        assert_eq!(recorder.render_csv().await.unwrap(), STATS_CSV_HEADER);
    }
}
