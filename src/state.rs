// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Desired-state payloads for LIFX commands.
//!
//! A [`LightState`] describes what a set of bulbs should look like after a
//! command completes: which bulbs (selector), power, color, brightness and
//! the transition duration. The same type also represents the operation
//! descriptor the batch endpoint echoes back in its response.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::error::{ParseError, ValueError};
use crate::types::{HsbkColor, Power};

/// The selector matching every bulb on the account.
pub const SELECTOR_ALL: &str = "all";

/// Maximum number of states a single batch command may carry.
pub const MAX_BATCH: usize = 50;

/// Default transition duration.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(1000);

/// A desired state for one selector's worth of bulbs.
///
/// All change fields are optional; a `None` means "leave as is". This is
/// how the API distinguishes "turn on and recolor" from "recolor only".
///
/// # Examples
///
/// ```
/// use lifx_remote::state::LightState;
/// use lifx_remote::types::{HsbkColor, Power};
///
/// let state = LightState::for_selector("group:Kitchen")
///     .with_power(Power::On)
///     .with_color(HsbkColor::from_rgb(255, 120, 0))
///     .with_duration(std::time::Duration::from_secs(2));
/// assert_eq!(state.selector(), "group:Kitchen");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LightState {
    selector: String,
    power: Option<Power>,
    color: Option<HsbkColor>,
    brightness: Option<f32>,
    duration: Duration,
}

impl LightState {
    /// Creates a state targeting the given selector with no changes and
    /// the default 1 s duration.
    #[must_use]
    pub fn for_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            power: None,
            color: None,
            brightness: None,
            duration: DEFAULT_DURATION,
        }
    }

    /// Creates a state targeting every bulb.
    #[must_use]
    pub fn for_all() -> Self {
        Self::for_selector(SELECTOR_ALL)
    }

    /// Retargets this state at a different selector.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Sets the desired power state.
    #[must_use]
    pub fn with_power(mut self, power: Power) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the desired color.
    #[must_use]
    pub fn with_color(mut self, color: HsbkColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the desired brightness.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` if the value is outside
    /// `[0, 1]`.
    pub fn with_brightness(mut self, brightness: f32) -> Result<Self, ValueError> {
        if !brightness.is_finite() || !(0.0..=1.0).contains(&brightness) {
            return Err(ValueError::InvalidBrightness(brightness));
        }
        self.brightness = Some(brightness);
        Ok(self)
    }

    /// Sets the transition duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns the selector.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Returns the desired power state, if one was set.
    #[must_use]
    pub const fn power(&self) -> Option<Power> {
        self.power
    }

    /// Returns the desired color, if one was set.
    #[must_use]
    pub const fn color(&self) -> Option<HsbkColor> {
        self.color
    }

    /// Returns the desired brightness, if one was set.
    #[must_use]
    pub const fn brightness(&self) -> Option<f32> {
        self.brightness
    }

    /// Returns the transition duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Serializes this state as a JSON request body fragment.
    ///
    /// The wire format wants duration in seconds as a float; power is only
    /// emitted when set, color as its text encoding, brightness when set.
    /// The selector is included only for batch bodies, where each entry
    /// names its own target.
    #[must_use]
    pub fn to_json(&self, include_selector: bool) -> Value {
        let mut body = Map::new();
        if let Some(power) = self.power {
            body.insert("power".to_string(), json!(power.as_str()));
        }
        body.insert("duration".to_string(), json!(self.duration.as_secs_f64()));
        if let Some(color) = &self.color {
            body.insert("color".to_string(), json!(color.to_text()));
        }
        if let Some(brightness) = self.brightness {
            body.insert("brightness".to_string(), json!(brightness));
        }
        if include_selector {
            body.insert("selector".to_string(), json!(self.selector));
        }
        Value::Object(body)
    }

    /// Parses an operation descriptor echoed back by the batch endpoint.
    ///
    /// Absent fields mean "no change" or defaults. Duration arrives in
    /// float seconds and is converted back to milliseconds by rounding to
    /// the nearest millisecond.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if a present field has the wrong type or an
    /// invalid value.
    pub fn from_json(json: &Value) -> Result<Self, ParseError> {
        let selector = match json.get("selector") {
            None => SELECTOR_ALL.to_string(),
            Some(v) => v
                .as_str()
                .ok_or_else(|| ParseError::InvalidValue {
                    field: "selector".to_string(),
                    message: "expected a string".to_string(),
                })?
                .to_string(),
        };

        let power = match json.get("power") {
            None => None,
            Some(v) => {
                let s = v.as_str().ok_or_else(|| ParseError::InvalidValue {
                    field: "power".to_string(),
                    message: "expected a string".to_string(),
                })?;
                Some(if s == "on" { Power::On } else { Power::Off })
            }
        };

        let color = match json.get("color") {
            None => None,
            Some(Value::String(text)) => Some(HsbkColor::from_text(text)?),
            Some(v) if v.is_object() => Some(HsbkColor::from_partial_json(v)?),
            Some(_) => {
                return Err(ParseError::InvalidValue {
                    field: "color".to_string(),
                    message: "expected a string or object".to_string(),
                });
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let brightness = match json.get("brightness") {
            None => None,
            Some(v) => Some(v.as_f64().map(|b| b as f32).ok_or_else(|| {
                ParseError::InvalidValue {
                    field: "brightness".to_string(),
                    message: "expected a number".to_string(),
                }
            })?),
        };

        let duration = match json.get("duration") {
            None => DEFAULT_DURATION,
            Some(v) => {
                let secs = v.as_f64().ok_or_else(|| ParseError::InvalidValue {
                    field: "duration".to_string(),
                    message: "expected a number".to_string(),
                })?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(ParseError::InvalidValue {
                        field: "duration".to_string(),
                        message: format!("invalid duration: {secs}"),
                    });
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                Duration::from_millis((secs * 1000.0).round() as u64)
            }
        };

        Ok(Self {
            selector,
            power,
            color,
            brightness,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = LightState::for_all();
        assert_eq!(state.selector(), "all");
        assert!(state.power().is_none());
        assert!(state.color().is_none());
        assert!(state.brightness().is_none());
        assert_eq!(state.duration(), Duration::from_millis(1000));
    }

    #[test]
    fn with_selector_retargets() {
        let state = LightState::for_selector("id:abc")
            .with_power(Power::On)
            .with_selector(SELECTOR_ALL);
        assert_eq!(state.selector(), "all");
        assert_eq!(state.power(), Some(Power::On));
    }

    #[test]
    fn brightness_validation() {
        assert!(LightState::for_all().with_brightness(0.5).is_ok());
        assert!(LightState::for_all().with_brightness(0.0).is_ok());
        assert!(LightState::for_all().with_brightness(1.0).is_ok());
        assert!(matches!(
            LightState::for_all().with_brightness(1.5),
            Err(ValueError::InvalidBrightness(_))
        ));
        assert!(LightState::for_all().with_brightness(-0.1).is_err());
    }

    #[test]
    fn to_json_minimal() {
        let state = LightState::for_all();
        let json = state.to_json(false);
        // Only duration is always present.
        assert_eq!(json, serde_json::json!({ "duration": 1.0 }));
    }

    #[test]
    fn to_json_full() {
        let color = HsbkColor::new(120.0, 1.0, 0.5, 3500).unwrap();
        let state = LightState::for_selector("id:abc")
            .with_power(Power::On)
            .with_color(color)
            .with_brightness(0.25)
            .unwrap()
            .with_duration(Duration::from_millis(2500));

        let json = state.to_json(true);
        assert_eq!(json["power"], "on");
        assert_eq!(json["duration"], 2.5);
        assert_eq!(json["color"], color.to_text());
        assert_eq!(json["brightness"], 0.25);
        assert_eq!(json["selector"], "id:abc");

        // Outside a batch the selector lives in the URL, not the body.
        assert!(state.to_json(false).get("selector").is_none());
    }

    #[test]
    fn from_json_round_trips_to_json() {
        let state = LightState::for_selector("group:Den")
            .with_power(Power::Off)
            .with_brightness(0.8)
            .unwrap()
            .with_duration(Duration::from_millis(1500));

        let parsed = LightState::from_json(&state.to_json(true)).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn from_json_defaults_missing_fields() {
        let parsed = LightState::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(parsed.selector(), "all");
        assert!(parsed.power().is_none());
        assert!(parsed.color().is_none());
        assert!(parsed.brightness().is_none());
        assert_eq!(parsed.duration(), DEFAULT_DURATION);
    }

    #[test]
    fn from_json_duration_rounds_to_nearest_ms() {
        let parsed =
            LightState::from_json(&serde_json::json!({ "duration": 1.2344 })).unwrap();
        assert_eq!(parsed.duration(), Duration::from_millis(1234));

        let parsed =
            LightState::from_json(&serde_json::json!({ "duration": 1.2347 })).unwrap();
        assert_eq!(parsed.duration(), Duration::from_millis(1235));
    }

    #[test]
    fn from_json_color_object() {
        let parsed = LightState::from_json(&serde_json::json!({
            "color": { "hue": 200.0, "saturation": 0.3, "kelvin": 4500 }
        }))
        .unwrap();
        let color = parsed.color().unwrap();
        assert!((color.hue() - 200.0).abs() < 0.001);
        assert_eq!(color.kelvin(), 4500);
    }

    #[test]
    fn from_json_rejects_bad_types() {
        assert!(LightState::from_json(&serde_json::json!({ "power": 1 })).is_err());
        assert!(LightState::from_json(&serde_json::json!({ "duration": "fast" })).is_err());
        assert!(LightState::from_json(&serde_json::json!({ "brightness": "dim" })).is_err());
        assert!(LightState::from_json(&serde_json::json!({ "duration": -2.0 })).is_err());
    }
}
