//! Error types for the harness.
//!
//! # Design
//! A response with any status is data, not an error. `TransportError` is the
//! only way a round trip fails: no response was obtained. Everything a
//! scenario can report is folded into `ScenarioError`, whose variants map to
//! the four kinds of scenario-local failure (transport, unexpected status,
//! shape mismatch, assertion).

use thiserror::Error;

use crate::http::HttpMethod;
use crate::validate::ShapeError;

/// No HTTP response was obtained (DNS, connect, timeout, body read).
#[derive(Debug, Error)]
#[error("{method} {url}: no response received: {source}")]
pub struct TransportError {
    pub method: HttpMethod,
    pub url: String,
    #[source]
    pub source: ureq::Error,
}

/// Errors returned by `ResourceApi` helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The outgoing record could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a scenario did not pass.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{url}: expected status in {expected:?}, got {actual}")]
    UnexpectedStatus {
        expected: Vec<u16>,
        actual: u16,
        url: String,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeError),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScenarioError {
    pub fn assertion(message: impl Into<String>) -> Self {
        ScenarioError::Assertion(message.into())
    }

    /// Transport failures are errors of the run environment rather than
    /// findings about the service.
    pub fn is_transport(&self) -> bool {
        matches!(self, ScenarioError::Transport(_))
    }
}

impl From<ApiError> for ScenarioError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(e) => ScenarioError::Transport(e),
            ApiError::Serialization(e) => ScenarioError::Serialization(e),
        }
    }
}

/// Fixture files could not be read or did not have the expected keys.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture {name} is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
