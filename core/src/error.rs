//! Error types for the translator API client.
//!
//! # Design
//! Two failure kinds only. `NetworkError` means no HTTP response was
//! obtained at all. `ApiError` means a response arrived but is a failure:
//! either a status of 400 or above, or a body that does not decode as JSON.
//! Nothing is retried; every failure propagates to the caller unchanged.

use serde_json::Value;

/// Message used when an error response carries no usable `message` field.
pub const FALLBACK_MESSAGE: &str = "Translator API error";

/// Message used when a response body cannot be decoded.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Dns,
    Connect,
    Io,
    Other,
}

/// The request never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("network error ({kind:?}): {message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A response was received but represents a failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("api error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Raw body, absent when the response body was empty.
    pub response_body: Option<String>,
    /// Decoded body, absent when the body was empty or not JSON.
    pub response_json: Option<Value>,
}

impl ApiError {
    /// Build the error for a status >= 400 response.
    ///
    /// The message comes from the body's `message` field when the body is
    /// JSON and that field is a string.
    pub fn from_response(status: u16, body: &str) -> Self {
        let response_json = decode_json_or_none(body);
        let message = response_json
            .as_ref()
            .and_then(|json| json.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();

        Self {
            status,
            message,
            response_body: (!body.is_empty()).then(|| body.to_string()),
            response_json,
        }
    }

    pub fn invalid_json(status: u16, body: &str) -> Self {
        Self {
            status,
            message: INVALID_JSON_MESSAGE.to_string(),
            response_body: (!body.is_empty()).then(|| body.to_string()),
            response_json: None,
        }
    }
}

/// Decode a body as a JSON object or array. Scalars count as undecodable.
pub(crate) fn decode_json_or_none(body: &str) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// HTTP status for API errors; `None` for network failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status),
            Error::Network(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
