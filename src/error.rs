// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the LIFX remote client.
//!
//! This module provides the error hierarchy for failures across the library:
//! value validation, transport communication, response parsing, and errors
//! reported by the LIFX cloud itself.

use thiserror::Error;

use crate::command::CommandKind;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when talking to
/// the LIFX cloud API.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during HTTP communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The server answered with an error document.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A hue value is outside the valid range [0, 360).
    #[error("hue value {0} is out of range [0, 360)")]
    InvalidHue(f32),

    /// A saturation value is outside the valid range [0, 1].
    #[error("saturation value {0} is out of range [0, 1]")]
    InvalidSaturation(f32),

    /// A brightness value is outside the valid range [0, 1].
    #[error("brightness value {0} is out of range [0, 1]")]
    InvalidBrightness(f32),

    /// A kelvin value is outside the valid range [2500, 9000].
    #[error("kelvin value {0} is out of range [2500, 9000]")]
    InvalidKelvin(u16),

    /// A batch command carried no states at all.
    #[error("set_states() requires at least one state")]
    EmptyBatch,

    /// A batch command carried more states than the API accepts.
    #[error("set_states() accepts at most {max} states, got {actual}")]
    BatchTooLarge {
        /// Maximum number of states per batch.
        max: usize,
        /// The number of states that was provided.
        actual: usize,
    },
}

/// Errors related to reaching the LIFX cloud over HTTP.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The app token cannot be sent as an HTTP header.
    #[error("app token contains characters not allowed in a header value")]
    InvalidToken,

    /// The server answered with a status code outside the range the API
    /// documents for command responses.
    #[error("server returned HTTP {code} for {kind} command")]
    Status {
        /// The HTTP status code.
        code: u16,
        /// The command that was being executed.
        kind: CommandKind,
    },
}

/// Errors related to parsing LIFX cloud responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// An error document returned by the LIFX cloud.
///
/// A request that reached the server can still fail at the API level, in
/// which case the body carries an `error` message and, for validation
/// failures, a list of per-field messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServerError {
    /// The error message from the server.
    pub message: String,
    /// The HTTP status code the error arrived with.
    pub code: u16,
    /// Per-field validation errors, if the server reported any.
    pub fields: Vec<FieldError>,
}

/// A single field-level validation error inside a [`ServerError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The name of the offending request field.
    pub field: String,
    /// The messages describing what is wrong with the field.
    pub messages: Vec<String>,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidKelvin(10_000);
        assert_eq!(
            err.to_string(),
            "kelvin value 10000 is out of range [2500, 9000]"
        );
    }

    #[test]
    fn batch_error_display() {
        let err = ValueError::BatchTooLarge {
            max: 50,
            actual: 51,
        };
        assert_eq!(
            err.to_string(),
            "set_states() accepts at most 50 states, got 51"
        );
    }

    #[test]
    fn error_from_value_error() {
        let value_err = ValueError::InvalidHue(400.0);
        let err: Error = value_err.into();
        assert!(matches!(err, Error::Value(ValueError::InvalidHue(_))));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("results".to_string());
        assert_eq!(err.to_string(), "missing field in response: results");
    }

    #[test]
    fn server_error_display() {
        let err = ServerError {
            message: "Authentication required".to_string(),
            code: 401,
            fields: Vec::new(),
        };
        assert_eq!(err.to_string(), "Authentication required");
    }

    #[test]
    fn status_error_display() {
        let err = ProtocolError::Status {
            code: 502,
            kind: CommandKind::ListLights,
        };
        assert_eq!(
            err.to_string(),
            "server returned HTTP 502 for ListLights command"
        );
    }
}
