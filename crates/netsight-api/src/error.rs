use thiserror::Error;

/// Top-level error type for the `netsight-api` crate.
///
/// Covers every failure mode of the REST client and the WebSocket
/// transport. `netsight-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request did not complete within the configured timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// HTTP client could not be built (TLS backend, invalid headers).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// Backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Every retry attempt failed. `last` holds the final failure.
    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    /// An endpoint template in configuration does not match the
    /// placeholders its endpoint is called with.
    #[error("Invalid endpoint template '{name}' ({template}): {reason}")]
    InvalidTemplate {
        name: String,
        template: String,
        reason: String,
    },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// A listener rejected a published message.
    #[error("Listener failed: {0}")]
    Listener(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) => true,
            Self::Status { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Status { status: 404, .. } => true,
            Self::RetriesExhausted { last, .. } => last.is_not_found(),
            _ => false,
        }
    }

    /// HTTP status code carried by this error, looking through retry wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        for status in [500, 502, 503, 504] {
            let err = Error::Status {
                status,
                body: String::new(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = Error::Status {
            status: 400,
            body: "bad request".into(),
        };
        assert!(!err.is_transient());
        assert!(Error::Timeout { timeout_ms: 10 }.is_transient());
    }

    #[test]
    fn not_found_looks_through_retry_wrapper() {
        let err = Error::RetriesExhausted {
            attempts: 3,
            last: Box::new(Error::Status {
                status: 404,
                body: String::new(),
            }),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }
}
