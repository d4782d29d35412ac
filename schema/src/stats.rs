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

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Field names for a day's statistics record, persisted under the `stat:YYYY-MM-DD`
/// key. There is no TTL on these keys.
pub mod stat_field {
    pub const STATISTIC_KEY_PREFIX: &str = "stat";

    #[must_use]
    pub fn count(direction: super::Direction) -> String {
        format!("count:{}", direction.as_key_suffix())
    }

    #[must_use]
    pub fn bytes(direction: super::Direction) -> &'static str {
        direction.as_key_suffix()
    }
}

/// Builds the store key for a given calendar date's statistics record.
#[must_use]
pub fn stat_key(date: &str) -> String {
    format!("{}:{date}", stat_field::STATISTIC_KEY_PREFIX)
}

/// One decoded row of the `/stats` CSV projection: a calendar date plus the four
/// counters for that day. Absent fields decode to `None`, rendered as an empty CSV
/// cell, matching the permissive read used by the original statistics dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub count_request: Option<u64>,
    pub request_bytes: Option<u64>,
    pub count_reply: Option<u64>,
    pub reply_bytes: Option<u64>,
}

impl DailyStats {
    #[must_use]
    pub fn count_for(&self, direction: Direction) -> Option<u64> {
        match direction {
            Direction::Request => self.count_request,
            Direction::Reply => self.count_reply,
        }
    }

    #[must_use]
    pub fn bytes_for(&self, direction: Direction) -> Option<u64> {
        match direction {
            Direction::Request => self.request_bytes,
            Direction::Reply => self.reply_bytes,
        }
    }

    /// Renders one CSV data line: `date,count(request),request bytes,count(reply),reply bytes`.
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        fn cell(value: Option<u64>) -> String {
            value.map_or_else(String::new, |v| v.to_string())
        }
        format!(
            "{},{},{},{},{}",
            self.date,
            cell(self.count_request),
            cell(self.request_bytes),
            cell(self.count_reply),
            cell(self.reply_bytes),
        )
    }
}

pub const STATS_CSV_HEADER: &str = "date,count(request),request bytes,count(reply),reply bytes";

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn csv_line_renders_missing_fields_as_empty_cells() {
        let row = DailyStats {
            date: "2024-01-01".to_string(),
            count_request: Some(2),
            request_bytes: Some(30),
            count_reply: None,
            reply_bytes: None,
        };
        assert_eq!(row.to_csv_line(), "2024-01-01,2,30,,");
    }

    #[test]
    fn stat_key_prefixes_with_statistic_namespace() {
        assert_eq!(stat_key("2024-01-01"), "stat:2024-01-01");
    }
}
