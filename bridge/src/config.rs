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

use std::time::Duration;

use clap::Parser;

pub const JUPYTER_BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seconds an idle slot or stat key is kept around. This one isn't operator-tunable in
/// the source this was ported from, so it stays a constant rather than a CLI flag.
pub const EXPIRE_SECS: u64 = 60 * 60 * 24;

/// How many trailing ASCII spaces to pad a successful dequeue payload with. Works
/// around an upstream defect that truncates the closing bytes of small responses; see
/// `DESIGN.md` for why this stays on by default.
pub const PAD_MESSAGE_LEN: usize = 1500;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "jupyter-bridge",
    version,
    about = "Rendezvous relay between a Jupyter kernel and a browser-based client"
)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[arg(long, env = "JUPYTER_BRIDGE_BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Connection string for the shared store (a Redis-compatible server).
    #[arg(
        long,
        env = "JUPYTER_BRIDGE_STORE_URL",
        default_value = "redis://127.0.0.1:6379"
    )]
    pub store_url: String,

    /// Max blocking time per dequeue, in seconds.
    #[arg(long, env = "JUPYTER_DEQUEUE_TIMEOUT_SECS", default_value_t = 15.0)]
    pub dequeue_timeout_secs: f64,

    /// Fast-cadence poll sleep, in seconds.
    #[arg(long, env = "JUPYTER_FAST_BRIDGE_POLL_SECS", default_value_t = 0.1)]
    pub fast_poll_secs: f64,

    /// Slow-cadence poll sleep, in seconds.
    #[arg(long, env = "JUPYTER_SLOW_BRIDGE_POLL_SECS", default_value_t = 2.0)]
    pub slow_poll_secs: f64,

    /// Number of fast-cadence polls allowed before a waiter downshifts to the slow
    /// cadence.
    #[arg(long, env = "JUPYTER_ALLOWED_FAST_DEQUEUE_POLLS", default_value_t = 10)]
    pub max_fast_polls: u32,

    /// When set, also write logs to this file (rotated daily).
    #[arg(long, env = "JUPYTER_BRIDGE_LOG_FILE")]
    pub log_file: Option<String>,

    /// Disable the trailing-space padding workaround on successful dequeues.
    #[arg(long, env = "JUPYTER_BRIDGE_DISABLE_PADDING")]
    pub disable_padding: bool,
}

impl Config {
    /// Parses from argv + environment, failing fast with a descriptive error before any
    /// logging or store connection is attempted. Also loads a `.env` file if present,
    /// for local development.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but can't be parsed (eg a non-numeric
    /// `JUPYTER_DEQUEUE_TIMEOUT_SECS`), or is out of range (eg a non-positive poll
    /// interval).
    pub fn try_load() -> miette::Result<Self> {
        use miette::IntoDiagnostic as _;

        let _dotenv_loaded = dotenvy::dotenv();
        let config = Config::try_parse().into_diagnostic()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> miette::Result<()> {
        miette::ensure!(
            self.dequeue_timeout_secs > 0.0,
            "JUPYTER_DEQUEUE_TIMEOUT_SECS must be positive, got {}",
            self.dequeue_timeout_secs
        );
        miette::ensure!(
            self.fast_poll_secs > 0.0,
            "JUPYTER_FAST_BRIDGE_POLL_SECS must be positive, got {}",
            self.fast_poll_secs
        );
        miette::ensure!(
            self.slow_poll_secs > 0.0,
            "JUPYTER_SLOW_BRIDGE_POLL_SECS must be positive, got {}",
            self.slow_poll_secs
        );
        Ok(())
    }

    #[must_use]
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.dequeue_timeout_secs)
    }

    #[must_use]
    pub fn fast_poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.fast_poll_secs)
    }

    #[must_use]
    pub fn slow_poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.slow_poll_secs)
    }

    #[must_use]
    pub fn padding_enabled(&self) -> bool {
        !self.disable_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::parse_from(["jupyter-bridge"]);
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert!((config.dequeue_timeout_secs - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.max_fast_polls, 10);
        assert!(config.padding_enabled());
    }
}
