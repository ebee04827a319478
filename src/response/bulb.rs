// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bulb records parsed from LIFX cloud responses.
//!
//! Two payload shapes produce a [`Bulb`]: the per-bulb result entries of a
//! command response (id, label, status only) and the full listing entries,
//! which additionally carry connection, grouping, product and color data.
//! The presence of the `uuid` field distinguishes the two.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::ParseError;
use crate::state::LightState;
use crate::types::{HsbkColor, Power};

/// Per-bulb outcome of a command, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulbStatus {
    /// The bulb acknowledged the command.
    Ok,
    /// The bulb did not answer in time.
    TimedOut,
    /// The bulb is not reachable.
    Offline,
    /// The response did not carry a status.
    Unknown,
}

impl FromStr for BulbStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "timed_out" => Ok(Self::TimedOut),
            "offline" => Ok(Self::Offline),
            other => Err(ParseError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown bulb status: {other:?}"),
            }),
        }
    }
}

/// A named id/name pair used for both groups and locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    /// The server-assigned id.
    pub id: String,
    /// The user-chosen name.
    pub name: String,
}

impl GroupRef {
    fn from_json(field: &str, json: &Value) -> Result<Self, ParseError> {
        Ok(Self {
            id: required_str(json, "id", field)?,
            name: required_str(json, "name", field)?,
        })
    }
}

/// Product information from a full listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product name, e.g. "LIFX A19".
    pub name: String,
    /// Product identifier string.
    pub identifier: String,
    /// Manufacturer name.
    pub company: String,
    /// Capability flags such as `has_color` or `has_multizone`.
    pub capabilities: HashMap<String, bool>,
}

impl Product {
    fn from_json(json: &Value) -> Result<Self, ParseError> {
        let caps_json = json
            .get("capabilities")
            .and_then(Value::as_object)
            .ok_or_else(|| ParseError::MissingField("product.capabilities".to_string()))?;
        let mut capabilities = HashMap::new();
        for (key, value) in caps_json {
            if let Some(flag) = value.as_bool() {
                capabilities.insert(key.clone(), flag);
            }
        }
        Ok(Self {
            name: required_str(json, "name", "product")?,
            identifier: required_str(json, "identifier", "product")?,
            company: required_str(json, "company", "product")?,
            capabilities,
        })
    }
}

/// The last-known record of a single bulb.
///
/// Command responses carry only `id`, `label` and `status`; the extended
/// fields are populated from full listings and survive incremental merges
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Bulb {
    id: String,
    label: String,
    status: BulbStatus,

    // Extended fields, present only when parsed from a full listing.
    uuid: Option<String>,
    connected: bool,
    power: Option<Power>,
    brightness: Option<f32>,
    color: Option<HsbkColor>,
    group: Option<GroupRef>,
    location: Option<GroupRef>,
    product: Option<Product>,
    last_seen: Option<DateTime<FixedOffset>>,
}

impl Bulb {
    /// Parses a bulb entry from a response payload.
    ///
    /// `id` and `label` are required in every shape. The extended fields
    /// are parsed only when the entry carries a `uuid`, the marker of a
    /// full listing entry.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` when a required field is missing or a present
    /// field is malformed.
    pub fn from_json(json: &Value) -> Result<Self, ParseError> {
        let id = required_str(json, "id", "bulb")?;
        let label = required_str(json, "label", "bulb")?;
        let status = match json.get("status") {
            None => BulbStatus::Unknown,
            Some(v) => v
                .as_str()
                .ok_or_else(|| ParseError::InvalidValue {
                    field: "status".to_string(),
                    message: "expected a string".to_string(),
                })?
                .parse()?,
        };

        let mut bulb = Self {
            id,
            label,
            status,
            uuid: None,
            connected: false,
            power: None,
            brightness: None,
            color: None,
            group: None,
            location: None,
            product: None,
            last_seen: None,
        };

        if let Some(uuid) = json.get("uuid") {
            let uuid = uuid
                .as_str()
                .ok_or_else(|| ParseError::InvalidValue {
                    field: "uuid".to_string(),
                    message: "expected a string".to_string(),
                })?
                .to_string();

            let connected = json
                .get("connected")
                .and_then(Value::as_bool)
                .ok_or_else(|| ParseError::MissingField("connected".to_string()))?;

            #[allow(clippy::cast_possible_truncation)]
            let brightness = json
                .get("brightness")
                .and_then(Value::as_f64)
                .map(|b| b as f32)
                .ok_or_else(|| ParseError::MissingField("brightness".to_string()))?;

            let power: Power = json
                .get("power")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::MissingField("power".to_string()))?
                .parse()?;

            let group_json = json
                .get("group")
                .ok_or_else(|| ParseError::MissingField("group".to_string()))?;
            let location_json = json
                .get("location")
                .ok_or_else(|| ParseError::MissingField("location".to_string()))?;
            let product_json = json
                .get("product")
                .ok_or_else(|| ParseError::MissingField("product".to_string()))?;
            let color_json = json
                .get("color")
                .ok_or_else(|| ParseError::MissingField("color".to_string()))?;

            // The listing reports brightness at the bulb level, separate
            // from the nested color; rejoin them on the color value.
            let color =
                HsbkColor::from_partial_json(color_json)?.with_brightness_unchecked(brightness);

            let last_seen_text = json
                .get("last_seen")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseError::MissingField("last_seen".to_string()))?;
            let last_seen = DateTime::parse_from_rfc3339(last_seen_text).map_err(|e| {
                ParseError::InvalidValue {
                    field: "last_seen".to_string(),
                    message: e.to_string(),
                }
            })?;

            bulb.uuid = Some(uuid);
            bulb.connected = connected;
            bulb.brightness = Some(brightness);
            bulb.power = Some(power);
            bulb.color = Some(color);
            bulb.group = Some(GroupRef::from_json("group", group_json)?);
            bulb.location = Some(GroupRef::from_json("location", location_json)?);
            bulb.product = Some(Product::from_json(product_json)?);
            bulb.last_seen = Some(last_seen);
        }

        Ok(bulb)
    }

    /// Returns the bulb id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the user-visible label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the last reported status.
    #[must_use]
    pub const fn status(&self) -> BulbStatus {
        self.status
    }

    /// Returns the device uuid, known only after a full listing.
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Returns whether the bulb was connected at the last listing.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.connected
    }

    /// Returns the last-known power state.
    #[must_use]
    pub const fn power(&self) -> Option<Power> {
        self.power
    }

    /// Returns `true` when the bulb is known to be on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.power.is_some_and(|p| p.is_on())
    }

    /// Returns the last-known brightness.
    #[must_use]
    pub const fn brightness(&self) -> Option<f32> {
        self.brightness
    }

    /// Returns the last-known color.
    #[must_use]
    pub const fn color(&self) -> Option<HsbkColor> {
        self.color
    }

    /// Returns the group the bulb belongs to.
    #[must_use]
    pub const fn group(&self) -> Option<&GroupRef> {
        self.group.as_ref()
    }

    /// Returns the location the bulb belongs to.
    #[must_use]
    pub const fn location(&self) -> Option<&GroupRef> {
        self.location.as_ref()
    }

    /// Returns the product information.
    #[must_use]
    pub const fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// Returns when the cloud last saw the bulb.
    #[must_use]
    pub const fn last_seen(&self) -> Option<DateTime<FixedOffset>> {
        self.last_seen
    }

    /// Merges a command result into this record.
    ///
    /// Identity fields are always refreshed; power, color and brightness
    /// move only when the originating state actually specified them, and
    /// status only when the response carried one. Extended fields are left
    /// alone, since command responses never include them.
    pub(crate) fn apply_state(
        &mut self,
        state: &LightState,
        id: &str,
        label: &str,
        status: BulbStatus,
    ) {
        if let Some(power) = state.power() {
            self.power = Some(power);
        }
        if let Some(color) = state.color() {
            self.color = Some(color);
        }
        if let Some(brightness) = state.brightness() {
            self.brightness = Some(brightness);
        }
        self.id = id.to_string();
        self.label = label.to_string();
        if status != BulbStatus::Unknown {
            self.status = status;
        }
    }
}

fn required_str(json: &Value, key: &str, context: &str) -> Result<String, ParseError> {
    json.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ParseError::MissingField(format!("{context}.{key}")))
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use serde_json::{Value, json};

    /// A full listing entry as the `/lights/{selector}` endpoint returns it.
    #[must_use]
    pub fn listing_entry(id: &str, label: &str, power: &str) -> Value {
        json!({
            "id": id,
            "uuid": format!("uuid-{id}"),
            "label": label,
            "connected": true,
            "power": power,
            "color": { "hue": 120.0, "saturation": 0.5, "kelvin": 3500 },
            "brightness": 0.75,
            "group": { "id": "g1", "name": "Kitchen" },
            "location": { "id": "l1", "name": "Home" },
            "product": {
                "name": "LIFX A19",
                "identifier": "lifx_a19",
                "company": "LIFX",
                "capabilities": { "has_color": true, "has_multizone": false }
            },
            "last_seen": "2017-03-01T18:32:01.000+00:00",
            "seconds_since_seen": 0.02
        })
    }

    /// A command result entry: id, label and status only.
    #[must_use]
    pub fn result_entry(id: &str, label: &str, status: &str) -> Value {
        json!({ "id": id, "label": label, "status": status })
    }
}
