use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures talking to the game server. Every variant ends the current session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    #[error("{route} answered with status {status}")]
    Status { route: &'static str, status: u16 },

    #[error("tick stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid game state payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request to {route} failed: {source}")]
    Http {
        route: &'static str,
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    pub fn http(route: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Http {
            route,
            source: source.into(),
        }
    }
}
