/*
 *   Copyright (c) 2023 R3BL LLC
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

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two mailboxes that make up a channel. A channel is really just a pair of these,
/// keyed by the same channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Request,
    Reply,
}

impl Direction {
    /// The store key suffix for this direction, eg `request` or `reply`.
    #[must_use]
    pub fn as_key_suffix(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Reply => "reply",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key_suffix())
    }
}

/// Whether a dequeue waiter currently holds the single-reader interlock for a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DequeueBusyStatus {
    #[default]
    Idle,
    Busy,
}

impl DequeueBusyStatus {
    #[must_use]
    pub fn as_store_str(&self) -> &'static str {
        match self {
            DequeueBusyStatus::Idle => "idle",
            DequeueBusyStatus::Busy => "busy",
        }
    }

    /// Absence of the field in the store is treated as [`DequeueBusyStatus::Idle`].
    #[must_use]
    pub fn from_store_str(s: Option<&str>) -> Self {
        match s {
            Some("busy") => DequeueBusyStatus::Busy,
            _ => DequeueBusyStatus::Idle,
        }
    }
}

/// Field names for a slot record, as persisted in the store. These are the hash fields
/// under the `<channel>:<direction>` key.
pub mod slot_field {
    pub const MESSAGE: &str = "message";
    pub const POSTED_TIME: &str = "posted_time";
    pub const PICKUP_TIME: &str = "pickup_time";
    pub const DEQUEUE_BUSY: &str = "dequeue_busy";
    pub const REPLY_FAST_POLLS_LEFT: &str = "reply_fast_polls_left";
}

/// Builds the store key for a channel's slot in a given direction.
#[must_use]
pub fn slot_key(channel: &str, direction: Direction) -> String {
    format!("{channel}:{}", direction.as_key_suffix())
}
