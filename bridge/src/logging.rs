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

//! §4.7 — structured logging setup. Default destination is stdout with a
//! human-readable formatter; additionally logs to a daily-rotated file when
//! `JUPYTER_BRIDGE_LOG_FILE` is set.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Must be kept alive for the life of the process; dropping it stops the background
/// writer thread for the file layer, silently truncating later log lines.
#[derive(Debug)]
pub struct LoggingGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Installs the global `tracing` subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed.
pub fn init(log_file: Option<&str>) -> LoggingGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jupyter_bridge=info,tower_http=info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stdout);

    match log_file {
        Some(path) => {
            let directory = std::path::Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = std::path::Path::new(path)
                .file_name()
                .map_or_else(|| "jupyter-bridge.log".to_string(), |n| n.to_string_lossy().to_string());
            let appender = tracing_appender::rolling::daily(directory.unwrap_or_else(|| std::path::Path::new(".")), file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
            LoggingGuard(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(stdout_layer).init();
            LoggingGuard(None)
        }
    }
}
