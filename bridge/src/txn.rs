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

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out a monotonically increasing id for correlating one HTTP request's log
/// lines. Shared across all concurrent handlers via an atomic rather than a
/// thread-local, so it's a plain injected collaborator instead of a process-global.
#[derive(Debug, Default)]
pub struct TransactionCounter {
    next: AtomicU64,
}

impl TransactionCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let counter = TransactionCounter::new();
        let a = counter.next_id();
        let b = counter.next_id();
        let c = counter.next_id();
        assert!(a < b && b < c);
    }
}
