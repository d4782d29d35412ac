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

//! The rendezvous engine: enqueue and dequeue against a slot, the single-reader
//! interlock, and the adaptive polling cadence. This is the hard engineering the rest
//! of the relay is built around — everything else is a thin adapter on top of it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use jupyter_bridge_schema::{slot_field, slot_key, DequeueBusyStatus, Direction};

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};
use crate::stats::StatsRecorder;
use crate::store::{FieldValue, Store};

/// The outcome of a [`Engine::dequeue`] call, mirroring `(payload|none, valid_reader)`
/// from the source protocol as a proper enum instead of a pair of optionals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DequeueOutcome {
    /// A message was read and removed from the slot.
    Delivered(Vec<u8>),
    /// `DEQUEUE_TIMEOUT` elapsed with no message. The reader was still valid; the busy
    /// flag has been released.
    TimedOut,
    /// Another waiter already holds the interlock. The busy flag was left untouched.
    Redundant,
}

fn now_human_readable() -> String {
    // Mirrors the source's `time.asctime()` format, eg "Wed Jun 9 04:26:40 1993".
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

pub struct Engine {
    store: Arc<dyn Store>,
    config: Arc<Config>,
    stats: StatsRecorder,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        let stats = StatsRecorder::new(store.clone());
        Self { store, config, stats }
    }

    #[must_use]
    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    /// §4.2.1 — writes `payload` into the named slot, failing with
    /// [`BridgeError::SlotOccupied`] if a message is already pending there.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SlotOccupied`] if the slot already holds a message, or
    /// [`BridgeError::StoreFailure`] if any underlying store call fails.
    pub async fn enqueue(
        &self,
        txn: u64,
        direction: Direction,
        channel: &str,
        payload: Vec<u8>,
    ) -> BridgeResult<()> {
        let key = slot_key(channel, direction);
        tracing::debug!(txn, key = %key, "into enqueue");

        let existing = self.store.get_field(&key, slot_field::MESSAGE).await?;
        if existing.is_some() {
            return Err(BridgeError::SlotOccupied {
                channel: channel.to_string(),
                direction: direction.as_key_suffix(),
            });
        }

        let len = payload.len();
        self.store
            .set_fields(
                &key,
                &[
                    (slot_field::MESSAGE, FieldValue::Bytes(payload)),
                    (slot_field::POSTED_TIME, now_human_readable().into()),
                    (slot_field::PICKUP_TIME, String::new().into()),
                ],
            )
            .await?;
        self.store.expire(&key, Duration::from_secs(crate::config::EXPIRE_SECS)).await?;
        self.stats.record_enqueue(direction, len).await?;

        tracing::debug!(txn, key = %key, "out of enqueue");
        Ok(())
    }

    /// Permissively deletes `message` from a slot, ignoring absence. Used by the HTTP
    /// surface to sweep a stranded reply before a new request is queued (§4.3), and by
    /// [`Engine::dequeue`]'s `reset_first` sweep.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::StoreFailure`] if the underlying delete fails.
    pub async fn clear_message(&self, channel: &str, direction: Direction) -> BridgeResult<bool> {
        let key = slot_key(channel, direction);
        self.store.delete_field(&key, slot_field::MESSAGE).await
    }

    /// §4.2.2 — the long-poll dequeue protocol: reader interlock, stale-reply sweep,
    /// adaptive fast/slow cadence, and the poll loop itself.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::StoreFailure`] if any underlying store call fails. Every
    /// valid-reader exit path (success, timeout, or this error) releases the interlock
    /// before returning.
    pub async fn dequeue(
        &self,
        txn: u64,
        direction: Direction,
        channel: &str,
        reset_first: bool,
    ) -> BridgeResult<DequeueOutcome> {
        let key = slot_key(channel, direction);
        tracing::debug!(txn, key = %key, reset_first, "into dequeue");

        // Step 1: reader interlock. Absence reads as idle.
        let busy_field = self.store.get_field(&key, slot_field::DEQUEUE_BUSY).await?;
        let busy = DequeueBusyStatus::from_store_str(busy_field.as_ref().and_then(FieldValue::as_text));
        if busy == DequeueBusyStatus::Busy {
            tracing::debug!(txn, key = %key, "detected redundant reader");
            return Ok(DequeueOutcome::Redundant);
        }
        self.store
            .set_fields(&key, &[(slot_field::DEQUEUE_BUSY, DequeueBusyStatus::Busy.as_store_str().into())])
            .await?;

        // From here on we are a valid reader: every exit path, including an error
        // returned by `?`, must still release the interlock. `result` captures that
        // exit so the busy flag can be cleared exactly once, afterwards.
        let result = self.dequeue_as_valid_reader(&key, reset_first).await;

        if let Err(release_err) = self
            .store
            .set_fields(&key, &[(slot_field::DEQUEUE_BUSY, DequeueBusyStatus::Idle.as_store_str().into())])
            .await
        {
            tracing::error!(txn, key = %key, error = %release_err, "failed releasing dequeue_busy");
        }

        tracing::debug!(txn, key = %key, "out of dequeue");
        result
    }

    async fn dequeue_as_valid_reader(&self, key: &str, reset_first: bool) -> BridgeResult<DequeueOutcome> {
        // Step 2: stale-reply sweep. Permissive — a dead predecessor may never have
        // left a message at all.
        if reset_first {
            self.store.delete_field(key, slot_field::MESSAGE).await?;
        }

        // Step 3: clear pickup_time and refresh TTL so the slot survives even if no
        // enqueue ever arrives.
        self.store
            .set_fields(key, &[(slot_field::PICKUP_TIME, String::new().into())])
            .await?;
        self.store.expire(key, Duration::from_secs(crate::config::EXPIRE_SECS)).await?;

        // Step 4: cadence selection.
        let interval = self.select_poll_interval(key).await?;

        // Step 5: poll loop.
        let deadline = Instant::now() + self.config.dequeue_timeout();
        let message = loop {
            if let Some(value) = self.store.get_field(key, slot_field::MESSAGE).await? {
                break Some(value);
            }
            if Instant::now() >= deadline {
                break None;
            }
            tokio::time::sleep(interval).await;
        };

        match message {
            // Step 6: success path.
            Some(value) => {
                let deleted = self.store.delete_field(key, slot_field::MESSAGE).await?;
                if !deleted {
                    return Err(BridgeError::StoreFailure(format!(
                        "message vanished from {key} between read and delete (concurrent theft)"
                    )));
                }
                self.store
                    .set_fields(
                        key,
                        &[
                            (slot_field::PICKUP_TIME, now_human_readable().into()),
                            (
                                slot_field::REPLY_FAST_POLLS_LEFT,
                                self.config.max_fast_polls.to_string().into(),
                            ),
                        ],
                    )
                    .await?;
                Ok(DequeueOutcome::Delivered(value.into_bytes()))
            }
            // Step 7: timeout path. Leave message/pickup_time/fast-poll counter alone
            // (the counter's decrement in step 4 already persisted).
            None => Ok(DequeueOutcome::TimedOut),
        }
    }

    /// Reads and decrements `reply_fast_polls_left`, returning which cadence this
    /// dequeue call should poll at. Absent counter seeds to the configured maximum.
    async fn select_poll_interval(&self, key: &str) -> BridgeResult<Duration> {
        let raw = self.store.get_field(key, slot_field::REPLY_FAST_POLLS_LEFT).await?;
        let fast_polls_left = raw
            .as_ref()
            .and_then(FieldValue::as_text)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(self.config.max_fast_polls);

        if fast_polls_left > 0 {
            self.store
                .set_fields(
                    key,
                    &[(
                        slot_field::REPLY_FAST_POLLS_LEFT,
                        (fast_polls_left - 1).to_string().into(),
                    )],
                )
                .await?;
            Ok(self.config.fast_poll_interval())
        } else {
            Ok(self.config.slow_poll_interval())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;
    use crate::store::memory::MemoryStore;

    fn test_config() -> Arc<Config> {
        Arc::new(Config::parse_from(["jupyter-bridge"]))
    }

    fn engine() -> Engine {
        Engine::new(Arc::new(MemoryStore::new()), test_config())
    }

    #[tokio::test]
    async fn enqueue_then_dequeue_round_trips_payload() {
        let engine = engine();
        engine.enqueue(0, Direction::Request, "c1", b"hello".to_vec()).await.unwrap();
        let outcome = engine.dequeue(1, Direction::Request, "c1", false).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::Delivered(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn enqueue_while_occupied_fails() {
        let engine = engine();
        engine.enqueue(0, Direction::Reply, "c5", b"A".to_vec()).await.unwrap();
        let result = engine.enqueue(1, Direction::Reply, "c5", b"B".to_vec()).await;
        assert!(matches!(result, Err(BridgeError::SlotOccupied { .. })));
    }

    #[tokio::test]
    async fn dequeue_without_message_times_out() {
        let mut config = Config::parse_from(["jupyter-bridge"]);
        config.dequeue_timeout_secs = 0.05;
        config.fast_poll_secs = 0.01;
        let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(config));

        let outcome = engine.dequeue(0, Direction::Reply, "c3", false).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::TimedOut);

        // Busy flag must be released after a valid-reader timeout exit.
        let busy = engine
            .store
            .get_field(&slot_key("c3", Direction::Reply), slot_field::DEQUEUE_BUSY)
            .await
            .unwrap();
        assert_eq!(
            DequeueBusyStatus::from_store_str(busy.as_ref().and_then(FieldValue::as_text)),
            DequeueBusyStatus::Idle
        );
    }

    #[tokio::test]
    async fn concurrent_dequeue_is_rejected_without_clearing_busy() {
        let mut config = Config::parse_from(["jupyter-bridge"]);
        config.dequeue_timeout_secs = 0.2;
        config.fast_poll_secs = 0.01;
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(Engine::new(store, Arc::new(config)));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.dequeue(0, Direction::Request, "c2", false).await.unwrap() })
        };
        // Give the first call time to acquire the interlock before the second arrives.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = engine.dequeue(1, Direction::Request, "c2", false).await.unwrap();
        assert_eq!(second, DequeueOutcome::Redundant);

        let first_outcome = first.await.unwrap();
        assert_eq!(first_outcome, DequeueOutcome::TimedOut);
    }

    #[tokio::test]
    async fn stranded_reply_is_swept_on_reset_first() {
        let engine = engine();
        engine.enqueue(0, Direction::Reply, "c2", b"stale".to_vec()).await.unwrap();
        let outcome = engine.dequeue(1, Direction::Reply, "c2", true).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::TimedOut);
    }

    #[tokio::test]
    async fn successful_consume_resets_fast_poll_counter() {
        let mut config = Config::parse_from(["jupyter-bridge"]);
        config.max_fast_polls = 2;
        let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(config));

        engine.enqueue(0, Direction::Reply, "c4", b"1".to_vec()).await.unwrap();
        engine.dequeue(1, Direction::Reply, "c4", false).await.unwrap();

        let key = slot_key("c4", Direction::Reply);
        let left = engine.store.get_field(&key, slot_field::REPLY_FAST_POLLS_LEFT).await.unwrap();
        assert_eq!(left.unwrap().as_text().unwrap(), "2");
    }
}
