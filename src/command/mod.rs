// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LIFX HTTP command definitions.
//!
//! A [`Command`] pairs a [`CommandKind`] with the states it should apply
//! and knows how to render itself as an HTTP request: method, URL path and
//! JSON body.
//!
//! # Endpoint table
//!
//! | Kind | Method | Path |
//! |------|--------|------|
//! | [`CommandKind::ListLights`] | GET | `/lights/{selector}` |
//! | [`CommandKind::SetState`] | PUT | `/lights/{selector}/state` |
//! | [`CommandKind::SetStates`] | PUT | `/lights/states` |
//! | [`CommandKind::TogglePower`] | POST | `/lights/{selector}/toggle` |

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use serde_json::{Value, json};

use crate::error::ValueError;
use crate::state::{LightState, MAX_BATCH};

/// The kind of operation a [`Command`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Query the bulbs matching a selector.
    ListLights,
    /// Apply one state to one selector.
    SetState,
    /// Apply up to [`MAX_BATCH`] states, each with its own selector.
    SetStates,
    /// Flip power for a selector.
    TogglePower,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListLights => "ListLights",
            Self::SetState => "SetState",
            Self::SetStates => "SetStates",
            Self::TogglePower => "TogglePower",
        };
        write!(f, "{name}")
    }
}

/// A fully-formed command ready for dispatch.
///
/// Every kind except [`CommandKind::SetStates`] carries exactly one state;
/// the batch kind carries between 1 and [`MAX_BATCH`].
///
/// # Examples
///
/// ```
/// use lifx_remote::command::{Command, CommandKind};
/// use lifx_remote::state::LightState;
/// use lifx_remote::types::Power;
///
/// let cmd = Command::set_state(LightState::for_all().with_power(Power::On));
/// assert_eq!(cmd.kind(), CommandKind::SetState);
/// assert_eq!(cmd.url("https://api.lifx.com/v1"), "https://api.lifx.com/v1/lights/all/state");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    states: Vec<LightState>,
}

impl Command {
    /// Creates a listing command for the given selector.
    #[must_use]
    pub fn list_lights(selector: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::ListLights,
            states: vec![LightState::for_selector(selector)],
        }
    }

    /// Creates a listing command for every bulb on the account.
    #[must_use]
    pub fn list_all_lights() -> Self {
        Self::list_lights(crate::state::SELECTOR_ALL)
    }

    /// Creates a single-selector state command.
    #[must_use]
    pub fn set_state(state: LightState) -> Self {
        Self {
            kind: CommandKind::SetState,
            states: vec![state],
        }
    }

    /// Creates a batch state command.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyBatch` for an empty vector and
    /// `ValueError::BatchTooLarge` for more than [`MAX_BATCH`] entries.
    pub fn set_states(states: Vec<LightState>) -> Result<Self, ValueError> {
        if states.is_empty() {
            return Err(ValueError::EmptyBatch);
        }
        if states.len() > MAX_BATCH {
            return Err(ValueError::BatchTooLarge {
                max: MAX_BATCH,
                actual: states.len(),
            });
        }
        Ok(Self {
            kind: CommandKind::SetStates,
            states,
        })
    }

    /// Creates a power-toggle command.
    #[must_use]
    pub fn toggle_power(selector: impl Into<String>, duration: Duration) -> Self {
        Self {
            kind: CommandKind::TogglePower,
            states: vec![LightState::for_selector(selector).with_duration(duration)],
        }
    }

    /// Returns the command kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns the states this command applies.
    #[must_use]
    pub fn states(&self) -> &[LightState] {
        &self.states
    }

    /// Returns the state against which a non-batch response is resolved.
    #[must_use]
    pub fn primary_state(&self) -> &LightState {
        &self.states[0]
    }

    /// Returns the HTTP method for this command.
    #[must_use]
    pub fn method(&self) -> Method {
        match self.kind {
            CommandKind::ListLights => Method::GET,
            CommandKind::SetState | CommandKind::SetStates => Method::PUT,
            CommandKind::TogglePower => Method::POST,
        }
    }

    /// Builds the full request URL for the given API base.
    ///
    /// Selectors are percent-encoded since group and location selectors may
    /// contain spaces and arbitrary user-chosen labels.
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self.kind {
            CommandKind::ListLights => {
                format!("{base}/lights/{}", self.encoded_selector())
            }
            CommandKind::SetState => {
                format!("{base}/lights/{}/state", self.encoded_selector())
            }
            CommandKind::SetStates => format!("{base}/lights/states"),
            CommandKind::TogglePower => {
                format!("{base}/lights/{}/toggle", self.encoded_selector())
            }
        }
    }

    /// Builds the JSON request body.
    #[must_use]
    pub fn body(&self) -> Value {
        match self.kind {
            CommandKind::ListLights => json!({}),
            CommandKind::SetState => self.states[0].to_json(false),
            CommandKind::SetStates => {
                let entries: Vec<Value> =
                    self.states.iter().map(|s| s.to_json(true)).collect();
                json!({ "states": entries })
            }
            CommandKind::TogglePower => {
                json!({ "duration": self.states[0].duration().as_secs_f64() })
            }
        }
    }

    fn encoded_selector(&self) -> String {
        urlencoding::encode(self.states[0].selector()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Power;

    const BASE: &str = "https://api.lifx.com/v1";

    #[test]
    fn list_lights_request_shape() {
        let cmd = Command::list_all_lights();
        assert_eq!(cmd.method(), Method::GET);
        assert_eq!(cmd.url(BASE), "https://api.lifx.com/v1/lights/all");
        assert_eq!(cmd.body(), json!({}));
    }

    #[test]
    fn set_state_request_shape() {
        let cmd = Command::set_state(
            LightState::for_selector("id:d3b2f2d97452")
                .with_power(Power::On)
                .with_duration(Duration::from_secs(2)),
        );
        assert_eq!(cmd.method(), Method::PUT);
        assert_eq!(
            cmd.url(BASE),
            "https://api.lifx.com/v1/lights/id%3Ad3b2f2d97452/state"
        );
        let body = cmd.body();
        assert_eq!(body["power"], "on");
        assert_eq!(body["duration"], 2.0);
        assert!(body.get("selector").is_none());
    }

    #[test]
    fn set_states_request_shape() {
        let cmd = Command::set_states(vec![
            LightState::for_selector("group:Kitchen").with_power(Power::On),
            LightState::for_selector("group:Den").with_power(Power::Off),
        ])
        .unwrap();
        assert_eq!(cmd.method(), Method::PUT);
        assert_eq!(cmd.url(BASE), "https://api.lifx.com/v1/lights/states");
        let body = cmd.body();
        let states = body["states"].as_array().unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0]["selector"], "group:Kitchen");
        assert_eq!(states[1]["power"], "off");
    }

    #[test]
    fn toggle_power_request_shape() {
        let cmd = Command::toggle_power("all", Duration::from_millis(500));
        assert_eq!(cmd.method(), Method::POST);
        assert_eq!(cmd.url(BASE), "https://api.lifx.com/v1/lights/all/toggle");
        assert_eq!(cmd.body(), json!({ "duration": 0.5 }));
    }

    #[test]
    fn set_states_rejects_empty_batch() {
        assert!(matches!(
            Command::set_states(Vec::new()),
            Err(ValueError::EmptyBatch)
        ));
    }

    #[test]
    fn set_states_rejects_oversized_batch() {
        let states = vec![LightState::for_all(); MAX_BATCH + 1];
        assert!(matches!(
            Command::set_states(states),
            Err(ValueError::BatchTooLarge { max: 50, actual: 51 })
        ));
    }

    #[test]
    fn set_states_accepts_max_batch() {
        let states = vec![LightState::for_all(); MAX_BATCH];
        assert!(Command::set_states(states).is_ok());
    }

    #[test]
    fn selector_with_spaces_is_encoded() {
        let cmd = Command::list_lights("label:Bedroom Lamp");
        assert_eq!(
            cmd.url(BASE),
            "https://api.lifx.com/v1/lights/label%3ABedroom%20Lamp"
        );
    }

    #[test]
    fn base_trailing_slash_is_tolerated() {
        let cmd = Command::list_all_lights();
        assert_eq!(
            cmd.url("https://api.lifx.com/v1/"),
            "https://api.lifx.com/v1/lights/all"
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(CommandKind::ListLights.to_string(), "ListLights");
        assert_eq!(CommandKind::TogglePower.to_string(), "TogglePower");
    }
}
