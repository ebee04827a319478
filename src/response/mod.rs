// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for LIFX cloud payloads.
//!
//! The API answers in several shapes: an error object, a success object
//! with per-bulb `results`, a flat JSON array of bulbs (listing), or an
//! array of operation blocks (batch). [`Response::parse`] classifies the
//! payload exactly once and produces a uniform structure; downstream code
//! never probes for field presence again.

mod bulb;

pub use bulb::{Bulb, BulbStatus, GroupRef, Product};

#[cfg(test)]
pub(crate) use bulb::test_fixtures;

use std::collections::HashMap;

use serde_json::Value;

use crate::command::CommandKind;
use crate::error::{Error, FieldError, ParseError, ProtocolError, ServerError};
use crate::state::LightState;

/// A non-fatal notice attached to a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// The warning message.
    pub message: String,
    /// Request parameters the server did not understand, mapped to their
    /// textual description.
    pub unknown_params: Option<HashMap<String, String>>,
}

impl Warning {
    fn from_json(json: &Value) -> Result<Self, ParseError> {
        let message = json
            .get("warning")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("warning".to_string()))?
            .to_string();

        let unknown_params = json.get("unknown_params").map(|params| {
            params
                .as_object()
                .map(|obj| {
                    obj.iter()
                        .map(|(k, v)| (k.clone(), value_as_text(v)))
                        .collect()
                })
                .unwrap_or_default()
        });

        Ok(Self {
            message,
            unknown_params,
        })
    }
}

/// One applied state paired with the bulbs it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The state that produced these results.
    pub state: LightState,
    /// The bulbs the operation affected.
    pub bulbs: Vec<Bulb>,
}

impl Operation {
    /// Parses a self-describing operation block from a batch response.
    ///
    /// The block carries its own `operation` descriptor and its own
    /// `results` array; an absent `results` means the operation touched no
    /// bulbs.
    fn from_json(json: &Value) -> Result<Self, ParseError> {
        let descriptor = json
            .get("operation")
            .ok_or_else(|| ParseError::MissingField("operation".to_string()))?;
        let state = LightState::from_json(descriptor)?;
        let bulbs = match json.get("results") {
            None => Vec::new(),
            Some(results) => parse_bulb_array(results)?,
        };
        Ok(Self { state, bulbs })
    }
}

/// A successfully parsed, non-error server response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The HTTP status code the response arrived with.
    pub code: u16,
    /// Warnings the server attached, if any.
    pub warnings: Vec<Warning>,
    /// The operations this response reports on. Single-state commands
    /// always produce exactly one.
    pub operations: Vec<Operation>,
}

impl Response {
    /// Parses an HTTP response body for the given command.
    ///
    /// `origin` is the state that produced the request; response shapes
    /// that do not echo their own operation descriptor are bound to it.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Status` when the status code is outside
    ///   `[200, 500)` (the range in which the API returns a JSON document)
    /// - `ServerError` when the body is an error document
    /// - `ParseError` when the body is malformed
    pub fn parse(
        kind: CommandKind,
        origin: &LightState,
        code: u16,
        body: &str,
    ) -> Result<Self, Error> {
        if !(200..500).contains(&code) {
            return Err(ProtocolError::Status { code, kind }.into());
        }

        let value: Value =
            serde_json::from_str(body.trim()).map_err(|e| Error::Parse(e.into()))?;

        match &value {
            Value::Object(_) => Self::from_object(&value, origin, code),
            Value::Array(entries) => Self::from_array(entries, origin, code),
            _ => Err(Error::Parse(ParseError::UnexpectedFormat(
                "expected a JSON object or array".to_string(),
            ))),
        }
    }

    /// Parses an object-shaped body: either an error document or a success
    /// document with a `results` array.
    fn from_object(json: &Value, origin: &LightState, code: u16) -> Result<Self, Error> {
        if let Some(error) = json.get("error") {
            let message = error
                .as_str()
                .ok_or_else(|| {
                    Error::Parse(ParseError::InvalidValue {
                        field: "error".to_string(),
                        message: "expected a string".to_string(),
                    })
                })?
                .to_string();

            let fields = match json.get("errors") {
                None => Vec::new(),
                Some(errors) => parse_field_errors(errors).map_err(Error::Parse)?,
            };

            return Err(Error::Server(ServerError {
                message,
                code,
                fields,
            }));
        }

        let warnings = match json.get("warnings") {
            None => Vec::new(),
            Some(list) => {
                let entries = list.as_array().ok_or_else(|| {
                    Error::Parse(ParseError::InvalidValue {
                        field: "warnings".to_string(),
                        message: "expected an array".to_string(),
                    })
                })?;
                entries
                    .iter()
                    .map(Warning::from_json)
                    .collect::<Result<_, _>>()
                    .map_err(Error::Parse)?
            }
        };

        let results = json
            .get("results")
            .ok_or_else(|| Error::Parse(ParseError::MissingField("results".to_string())))?;
        let bulbs = parse_bulb_array(results).map_err(Error::Parse)?;

        Ok(Self {
            code,
            warnings,
            operations: vec![Operation {
                state: origin.clone(),
                bulbs,
            }],
        })
    }

    /// Parses an array-shaped body: operation blocks if any element carries
    /// an `operation` descriptor, otherwise a flat bulb listing.
    fn from_array(entries: &[Value], origin: &LightState, code: u16) -> Result<Self, Error> {
        let has_operations = entries.iter().any(|e| e.get("operation").is_some());
        let operations = if has_operations {
            entries
                .iter()
                .map(Operation::from_json)
                .collect::<Result<_, _>>()
                .map_err(Error::Parse)?
        } else {
            let bulbs = entries
                .iter()
                .map(Bulb::from_json)
                .collect::<Result<_, _>>()
                .map_err(Error::Parse)?;
            vec![Operation {
                state: origin.clone(),
                bulbs,
            }]
        };

        Ok(Self {
            code,
            warnings: Vec::new(),
            operations,
        })
    }

    /// Returns every bulb across all operations.
    #[must_use]
    pub fn bulbs(&self) -> Vec<&Bulb> {
        self.operations.iter().flat_map(|op| &op.bulbs).collect()
    }
}

fn parse_bulb_array(json: &Value) -> Result<Vec<Bulb>, ParseError> {
    let entries = json.as_array().ok_or_else(|| ParseError::InvalidValue {
        field: "results".to_string(),
        message: "expected an array".to_string(),
    })?;
    entries.iter().map(Bulb::from_json).collect()
}

fn parse_field_errors(json: &Value) -> Result<Vec<FieldError>, ParseError> {
    let entries = json.as_array().ok_or_else(|| ParseError::InvalidValue {
        field: "errors".to_string(),
        message: "expected an array".to_string(),
    })?;

    entries
        .iter()
        .map(|entry| {
            let field = entry
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::MissingField("errors[].field".to_string()))?
                .to_string();
            let messages = match entry.get("message") {
                None => Vec::new(),
                Some(list) => list
                    .as_array()
                    .ok_or_else(|| ParseError::InvalidValue {
                        field: "errors[].message".to_string(),
                        message: "expected an array".to_string(),
                    })?
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect(),
            };
            Ok(FieldError { field, messages })
        })
        .collect()
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::bulb::test_fixtures::{listing_entry, result_entry};
    use super::*;

    fn origin() -> LightState {
        LightState::for_all()
    }

    #[test]
    fn success_object_wraps_results_with_origin() {
        let body = serde_json::json!({
            "results": [result_entry("a", "Lamp", "ok"), result_entry("b", "Strip", "timed_out")]
        })
        .to_string();

        let response =
            Response::parse(CommandKind::SetState, &origin(), 207, &body).unwrap();
        assert_eq!(response.code, 207);
        assert_eq!(response.operations.len(), 1);
        assert_eq!(response.operations[0].state, origin());
        let bulbs = &response.operations[0].bulbs;
        assert_eq!(bulbs.len(), 2);
        assert_eq!(bulbs[0].status(), BulbStatus::Ok);
        assert_eq!(bulbs[1].status(), BulbStatus::TimedOut);
    }

    #[test]
    fn error_object_becomes_server_error() {
        let body = serde_json::json!({ "error": "Authentication required" }).to_string();
        let err = Response::parse(CommandKind::ListLights, &origin(), 401, &body).unwrap_err();
        match err {
            Error::Server(server) => {
                assert_eq!(server.message, "Authentication required");
                assert_eq!(server.code, 401);
                assert!(server.fields.is_empty());
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn error_object_with_field_errors() {
        let body = serde_json::json!({
            "error": "Invalid parameters",
            "errors": [
                { "field": "brightness", "message": ["must be between 0 and 1"] },
                { "field": "duration" }
            ]
        })
        .to_string();

        let err = Response::parse(CommandKind::SetState, &origin(), 422, &body).unwrap_err();
        match err {
            Error::Server(server) => {
                assert_eq!(server.fields.len(), 2);
                assert_eq!(server.fields[0].field, "brightness");
                assert_eq!(
                    server.fields[0].messages,
                    vec!["must be between 0 and 1".to_string()]
                );
                assert!(server.fields[1].messages.is_empty());
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn warnings_are_collected() {
        let body = serde_json::json!({
            "results": [result_entry("a", "Lamp", "ok")],
            "warnings": [
                { "warning": "Unknown params", "unknown_params": { "sparkle": "not supported" } }
            ]
        })
        .to_string();

        let response =
            Response::parse(CommandKind::SetState, &origin(), 207, &body).unwrap();
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.warnings[0].message, "Unknown params");
        let params = response.warnings[0].unknown_params.as_ref().unwrap();
        assert_eq!(params.get("sparkle"), Some(&"not supported".to_string()));
    }

    #[test]
    fn flat_array_is_a_listing_bound_to_origin() {
        let body = serde_json::json!([
            listing_entry("a", "Lamp", "on"),
            listing_entry("b", "Strip", "off")
        ])
        .to_string();

        let response =
            Response::parse(CommandKind::ListLights, &origin(), 200, &body).unwrap();
        assert_eq!(response.operations.len(), 1);
        let bulbs = response.bulbs();
        assert_eq!(bulbs.len(), 2);
        assert_eq!(bulbs[0].uuid(), Some("uuid-a"));
        assert!(!bulbs[1].is_on());
    }

    #[test]
    fn operation_array_parses_each_block() {
        let body = serde_json::json!([
            {
                "operation": { "selector": "group:Kitchen", "power": "on", "duration": 1.0 },
                "results": [result_entry("a", "Lamp", "ok")]
            },
            {
                "operation": { "selector": "group:Den", "brightness": 0.5, "duration": 2.0 },
                "results": [result_entry("b", "Strip", "ok")]
            }
        ])
        .to_string();

        let response =
            Response::parse(CommandKind::SetStates, &origin(), 207, &body).unwrap();
        assert_eq!(response.operations.len(), 2);
        assert_eq!(response.operations[0].state.selector(), "group:Kitchen");
        assert_eq!(
            response.operations[0].state.power(),
            Some(crate::types::Power::On)
        );
        assert_eq!(response.operations[1].state.brightness(), Some(0.5));
        assert_eq!(response.operations[1].bulbs[0].id(), "b");
    }

    #[test]
    fn operation_block_without_results_is_empty() {
        let body = serde_json::json!([
            { "operation": { "selector": "group:Empty", "duration": 1.0 } }
        ])
        .to_string();

        let response =
            Response::parse(CommandKind::SetStates, &origin(), 207, &body).unwrap();
        assert!(response.operations[0].bulbs.is_empty());
    }

    #[test]
    fn status_out_of_range_is_a_protocol_error() {
        let err = Response::parse(CommandKind::ListLights, &origin(), 502, "").unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Status { code: 502, kind: CommandKind::ListLights })
        ));
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let err =
            Response::parse(CommandKind::ListLights, &origin(), 200, "<html>").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Json(_))));

        let err = Response::parse(CommandKind::ListLights, &origin(), 200, "42").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::UnexpectedFormat(_))));
    }

    #[test]
    fn object_without_results_is_a_parse_error() {
        let err = Response::parse(CommandKind::SetState, &origin(), 200, "{}").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingField(_))));
    }
}
