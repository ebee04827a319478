// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event notification for command outcomes.
//!
//! The worker reports every finished command and every failure through a
//! broadcast [`EventBus`]; callers subscribe and react from their own
//! tasks. This is the only way results travel back to the application,
//! since enqueueing a command never blocks or returns its outcome.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::command::CommandKind;
use crate::error::{Error, FieldError, ServerError};
use crate::response::Response;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// An event emitted by the command worker.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    /// A command completed and its results were reconciled into the cache.
    CommandFinished {
        /// The kind of command that finished.
        kind: CommandKind,
        /// The parsed server response.
        response: Arc<Response>,
    },
    /// A command failed: validation, transport, parsing, or a server-side
    /// error document.
    Error {
        /// Human-readable description of the failure.
        message: String,
        /// The HTTP status code, when the failure came from the server.
        code: Option<u16>,
        /// Per-field validation errors, when the server reported any.
        fields: Vec<FieldError>,
    },
}

impl RemoteEvent {
    /// Builds an error event from any library error, carrying the status
    /// code and field details when the server supplied them.
    #[must_use]
    pub(crate) fn from_error(error: &Error) -> Self {
        match error {
            Error::Server(ServerError {
                message,
                code,
                fields,
            }) => Self::Error {
                message: message.clone(),
                code: Some(*code),
                fields: fields.clone(),
            },
            other => Self::Error {
                message: other.to_string(),
                code: None,
                fields: Vec::new(),
            },
        }
    }
}

/// Broadcast bus for [`RemoteEvent`]s.
///
/// Multiple subscribers each receive their own copy of every event. The
/// bus has a fixed capacity (default 256); a subscriber that falls behind
/// sees `RecvError::Lagged` for the events it missed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RemoteEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RemoteEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Events published while nobody is subscribed are dropped silently.
    pub fn publish(&self, event: RemoteEvent) {
        let _ = self.sender.send(event);
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ValueError};

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(RemoteEvent::Error {
            message: "boom".to_string(),
            code: None,
            fields: Vec::new(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, RemoteEvent::Error { message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(RemoteEvent::Error {
            message: "nobody listening".to_string(),
            code: None,
            fields: Vec::new(),
        });
    }

    #[test]
    fn from_error_preserves_server_details() {
        let err = Error::Server(ServerError {
            message: "Invalid parameters".to_string(),
            code: 422,
            fields: vec![FieldError {
                field: "brightness".to_string(),
                messages: vec!["out of range".to_string()],
            }],
        });
        let event = RemoteEvent::from_error(&err);
        match event {
            RemoteEvent::Error {
                message,
                code,
                fields,
            } => {
                assert_eq!(message, "Invalid parameters");
                assert_eq!(code, Some(422));
                assert_eq!(fields.len(), 1);
            }
            RemoteEvent::CommandFinished { .. } => panic!("expected an error event"),
        }
    }

    #[test]
    fn from_error_flattens_other_errors() {
        let err = Error::Value(ValueError::EmptyBatch);
        match RemoteEvent::from_error(&err) {
            RemoteEvent::Error { code, fields, .. } => {
                assert!(code.is_none());
                assert!(fields.is_empty());
            }
            RemoteEvent::CommandFinished { .. } => panic!("expected an error event"),
        }

        let err = Error::Parse(ParseError::MissingField("results".to_string()));
        assert!(matches!(
            RemoteEvent::from_error(&err),
            RemoteEvent::Error { .. }
        ));
    }
}
