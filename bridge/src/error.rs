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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The relay's complete error taxonomy. Every fallible engine and HTTP-surface
/// operation returns one of these instead of an ad hoc boxed exception; the mapping to
/// an HTTP status lives in one place, [`BridgeError::into_response`], rather than being
/// scattered across handlers.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("channel is missing in parameter list")]
    MissingChannel,

    #[error("payload must be {expected}")]
    WrongMediaType { expected: &'static str },

    #[error("channel {channel}:{direction} contains unprocessed message")]
    SlotOccupied { channel: String, direction: &'static str },

    /// Not surfaced as an HTTP error body — the adapter maps this straight to `429`
    /// with an empty body — but it flows through the same `Result` as everything else
    /// so callers can't forget to check it.
    #[error("redundant reader on channel {channel}:{direction}")]
    RedundantReader { channel: String, direction: &'static str },

    /// Likewise mapped to an empty-body `408`.
    #[error("dequeue timed out on channel {channel}:{direction}")]
    Timeout { channel: String, direction: &'static str },

    #[error("store operation failed: {0}")]
    StoreFailure(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::MissingChannel
            | BridgeError::WrongMediaType { .. }
            | BridgeError::SlotOccupied { .. }
            | BridgeError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::RedundantReader { .. } => StatusCode::TOO_MANY_REQUESTS,
            BridgeError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// `RedundantReader` and `Timeout` are protocol-level outcomes the clients poll in
    /// a loop for, not failures worth a body; everything else gets the error text so an
    /// operator (or the Jupyter-side caller) can see what went wrong.
    fn body(&self) -> String {
        match self {
            BridgeError::RedundantReader { .. } | BridgeError::Timeout { .. } => String::new(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(BridgeError::MissingChannel, StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(BridgeError::WrongMediaType { expected: "application/json" }, StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(BridgeError::SlotOccupied { channel: "c1".to_string(), direction: "request" }, StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(BridgeError::StoreFailure("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[test_case(BridgeError::RedundantReader { channel: "c1".to_string(), direction: "reply" }, StatusCode::TOO_MANY_REQUESTS)]
    #[test_case(BridgeError::Timeout { channel: "c1".to_string(), direction: "reply" }, StatusCode::REQUEST_TIMEOUT)]
    fn maps_to_documented_status(error: BridgeError, expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test_case(BridgeError::RedundantReader { channel: "c1".to_string(), direction: "reply" })]
    #[test_case(BridgeError::Timeout { channel: "c1".to_string(), direction: "reply" })]
    fn protocol_level_outcomes_have_empty_body(error: BridgeError) {
        assert_eq!(error.body(), "");
    }
}
