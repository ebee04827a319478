// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HSBK color representation for LIFX bulbs.
//!
//! LIFX describes colors as hue/saturation/brightness plus an optional
//! kelvin component for white tones. This module provides the value type
//! with RGB conversion, circular hue averaging, and the `key:value` text
//! encoding the HTTP API uses for color payloads.

use std::fmt;

use serde_json::Value;

use crate::error::{ParseError, ValueError};

/// An HSBK color value.
///
/// - hue in degrees, `[0, 360)`
/// - saturation in `[0, 1]`
/// - brightness in `[0, 1]`
/// - kelvin in `[2500, 9000]`, meaningful only when the kelvin component
///   was explicitly set (white tones)
///
/// Values are validated at construction time and immutable afterwards.
///
/// # Examples
///
/// ```
/// use lifx_remote::types::HsbkColor;
///
/// let red = HsbkColor::new(0.0, 1.0, 1.0, 3500).unwrap();
/// assert!(!red.is_white());
///
/// let white = HsbkColor::from_rgb(200, 200, 200);
/// assert!(white.is_white());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsbkColor {
    hue: f32,
    saturation: f32,
    brightness: f32,
    kelvin: u16,
    kelvin_enabled: bool,
}

impl HsbkColor {
    /// Saturation at or below this threshold counts as white.
    pub const WHITE_SATURATION_THRESHOLD: f32 = 0.0001;

    /// Kelvin value used when none was specified.
    pub const DEFAULT_KELVIN: u16 = 3500;

    /// Minimum kelvin value (warmest).
    pub const MIN_KELVIN: u16 = 2500;

    /// Maximum kelvin value (coolest).
    pub const MAX_KELVIN: u16 = 9000;

    /// Creates a new color with an explicit kelvin component.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if any component is outside its valid range.
    pub fn new(hue: f32, saturation: f32, brightness: f32, kelvin: u16) -> Result<Self, ValueError> {
        validate_hue(hue)?;
        validate_saturation(saturation)?;
        validate_brightness(brightness)?;
        validate_kelvin(kelvin)?;
        Ok(Self {
            hue,
            saturation,
            brightness,
            kelvin,
            kelvin_enabled: true,
        })
    }

    /// Converts an 8-bit RGB triple to HSBK.
    ///
    /// Brightness is the maximum channel, saturation the normalized
    /// max/min spread, hue the standard six-sector derivation. The kelvin
    /// component defaults to 3500 and is left disabled since RGB carries
    /// no white-point information.
    #[must_use]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = f32::from(r) / 255.0;
        let g = f32::from(g) / 255.0;
        let b = f32::from(b) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let diff = max - min;

        let brightness = max;
        let saturation = if max == 0.0 { 0.0 } else { diff / max };

        let hue = if diff == 0.0 {
            0.0
        } else {
            let sector = if max == r {
                (g - b) / diff + if g < b { 6.0 } else { 0.0 }
            } else if max == g {
                (b - r) / diff + 2.0
            } else {
                (r - g) / diff + 4.0
            };
            sector * 60.0
        };

        Self {
            hue,
            saturation,
            brightness,
            kelvin: Self::DEFAULT_KELVIN,
            kelvin_enabled: false,
        }
    }

    /// Converts a packed `0xRRGGBB` value to HSBK.
    #[must_use]
    pub fn from_rgb_packed(rgb: u32) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parses the space-separated `key:value` text encoding.
    ///
    /// Recognized keys are `hue`, `saturation`, `brightness` and `kelvin`;
    /// unrecognized keys are ignored. Setting `kelvin` enables the kelvin
    /// component. This is the inverse of [`to_text`](Self::to_text).
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` if a component fails to parse as
    /// a number, or `ParseError::UnexpectedFormat` if a parsed component is
    /// out of range.
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let mut color = Self {
            kelvin_enabled: false,
            ..Self::default()
        };
        for token in text.split_whitespace() {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            match key {
                "hue" => {
                    let hue = parse_component(key, value)?;
                    validate_hue(hue).map_err(range_error)?;
                    color.hue = hue;
                }
                "saturation" => {
                    let saturation = parse_component(key, value)?;
                    validate_saturation(saturation).map_err(range_error)?;
                    color.saturation = saturation;
                }
                "brightness" => {
                    let brightness = parse_component(key, value)?;
                    validate_brightness(brightness).map_err(range_error)?;
                    color.brightness = brightness;
                }
                "kelvin" => {
                    let kelvin: u16 =
                        value.parse().map_err(|_| ParseError::InvalidValue {
                            field: key.to_string(),
                            message: format!("not an integer: {value:?}"),
                        })?;
                    validate_kelvin(kelvin).map_err(range_error)?;
                    color.kelvin = kelvin;
                    color.kelvin_enabled = true;
                }
                _ => {}
            }
        }
        Ok(color)
    }

    /// Builds a color from a partial JSON object.
    ///
    /// Absent fields fall back to the defaults (hue 0, saturation 0,
    /// brightness 1, kelvin 3500). The kelvin component is enabled only
    /// when the `kelvin` field was present in the payload.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if a present field is not numeric or is out of
    /// range.
    pub fn from_partial_json(json: &Value) -> Result<Self, ParseError> {
        let number = |key: &str, default: f32| -> Result<f32, ParseError> {
            match json.get(key) {
                None => Ok(default),
                #[allow(clippy::cast_possible_truncation)]
                Some(v) => v.as_f64().map(|n| n as f32).ok_or_else(|| {
                    ParseError::InvalidValue {
                        field: key.to_string(),
                        message: "expected a number".to_string(),
                    }
                }),
            }
        };

        let hue = number("hue", 0.0)?;
        let saturation = number("saturation", 0.0)?;
        let brightness = number("brightness", 1.0)?;
        let kelvin_field = json.get("kelvin");
        let kelvin = match kelvin_field {
            None => Self::DEFAULT_KELVIN,
            Some(v) => {
                let k = v.as_u64().ok_or_else(|| ParseError::InvalidValue {
                    field: "kelvin".to_string(),
                    message: "expected an integer".to_string(),
                })?;
                u16::try_from(k).map_err(|_| ParseError::InvalidValue {
                    field: "kelvin".to_string(),
                    message: format!("value {k} does not fit in u16"),
                })?
            }
        };

        validate_hue(hue).map_err(range_error)?;
        validate_saturation(saturation).map_err(range_error)?;
        validate_brightness(brightness).map_err(range_error)?;
        validate_kelvin(kelvin).map_err(range_error)?;

        Ok(Self {
            hue,
            saturation,
            brightness,
            kelvin,
            kelvin_enabled: kelvin_field.is_some(),
        })
    }

    /// Averages a slice of colors.
    ///
    /// Hue is averaged circularly: each hue is projected onto the unit
    /// circle, the components are summed and the mean angle recovered with
    /// `atan2`. A naive arithmetic mean would put the average of 350° and
    /// 10° at 180°; the circular mean correctly yields 0°. Saturation and
    /// brightness use plain arithmetic means. A stored kelvin of 0 counts
    /// as 3500 before the integer mean is taken.
    ///
    /// The result always has its kelvin component enabled, even when none
    /// of the inputs did, so averaging a single flag-disabled color is
    /// identity in every component except that flag.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn average(colors: &[Self]) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }

        let mut hue_x_total = 0.0f32;
        let mut hue_y_total = 0.0f32;
        let mut saturation_total = 0.0f32;
        let mut brightness_total = 0.0f32;
        let mut kelvin_total = 0u64;

        for color in colors {
            let radians = color.hue.to_radians();
            hue_x_total += radians.sin();
            hue_y_total += radians.cos();
            saturation_total += color.saturation;
            brightness_total += color.brightness;
            kelvin_total += if color.kelvin == 0 {
                u64::from(Self::DEFAULT_KELVIN)
            } else {
                u64::from(color.kelvin)
            };
        }

        // atan2 yields (-pi, pi]; normalize to [0, 1) of a full turn before
        // scaling back to degrees.
        let mut turn = hue_x_total.atan2(hue_y_total) / (2.0 * std::f32::consts::PI);
        if turn < 0.0 {
            turn += 1.0;
        }
        let mut hue = turn * 360.0;
        if hue >= 360.0 {
            hue = 0.0;
        }

        #[allow(clippy::cast_possible_truncation)]
        let count = colors.len() as u64;
        #[allow(clippy::cast_precision_loss)]
        let count_f = colors.len() as f32;
        #[allow(clippy::cast_possible_truncation)]
        let kelvin = (kelvin_total / count) as u16;

        Some(Self {
            hue,
            saturation: saturation_total / count_f,
            brightness: brightness_total / count_f,
            kelvin,
            kelvin_enabled: true,
        })
    }

    /// Returns the hue in degrees, `[0, 360)`.
    #[must_use]
    pub const fn hue(&self) -> f32 {
        self.hue
    }

    /// Returns the saturation, `[0, 1]`.
    #[must_use]
    pub const fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Returns the brightness, `[0, 1]`.
    #[must_use]
    pub const fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Returns the kelvin component, `[2500, 9000]`.
    #[must_use]
    pub const fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Returns whether the kelvin component was explicitly set.
    #[must_use]
    pub const fn kelvin_enabled(&self) -> bool {
        self.kelvin_enabled
    }

    /// Returns `true` when the color is effectively white (no saturation).
    #[must_use]
    pub fn is_white(&self) -> bool {
        self.saturation <= Self::WHITE_SATURATION_THRESHOLD
    }

    /// Returns a copy with the brightness replaced.
    ///
    /// The listing endpoint reports brightness at the bulb level, separate
    /// from the nested color object; this rejoins them.
    pub(crate) fn with_brightness_unchecked(mut self, brightness: f32) -> Self {
        self.brightness = brightness;
        self
    }

    /// Converts back to an 8-bit RGB triple via the standard HSB→RGB
    /// sector interpolation. The kelvin component is ignored.
    #[must_use]
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let c = self.brightness * self.saturation;
        let sector = self.hue / 60.0;
        let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
        let m = self.brightness - c;

        let (r, g, b) = match sector {
            s if s < 1.0 => (c, x, 0.0),
            s if s < 2.0 => (x, c, 0.0),
            s if s < 3.0 => (0.0, c, x),
            s if s < 4.0 => (0.0, x, c),
            s if s < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    /// Returns the canonical `key:value` text encoding.
    ///
    /// The kelvin token is emitted only when the kelvin component was
    /// explicitly set, so `from_text(to_text())` reproduces the color
    /// exactly, enabled flag included.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "hue:{} saturation:{} brightness:{}",
            self.hue, self.saturation, self.brightness
        );
        if self.kelvin_enabled {
            text.push_str(&format!(" kelvin:{}", self.kelvin));
        }
        text
    }
}

impl Default for HsbkColor {
    /// White at full brightness with the default 3500 K white point.
    fn default() -> Self {
        Self {
            hue: 0.0,
            saturation: 0.0,
            brightness: 1.0,
            kelvin: Self::DEFAULT_KELVIN,
            kelvin_enabled: true,
        }
    }
}

impl fmt::Display for HsbkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

fn validate_hue(hue: f32) -> Result<(), ValueError> {
    if !hue.is_finite() || hue < 0.0 || hue >= 360.0 {
        return Err(ValueError::InvalidHue(hue));
    }
    Ok(())
}

fn validate_saturation(saturation: f32) -> Result<(), ValueError> {
    if !saturation.is_finite() || saturation < 0.0 || saturation > 1.0 {
        return Err(ValueError::InvalidSaturation(saturation));
    }
    Ok(())
}

fn validate_brightness(brightness: f32) -> Result<(), ValueError> {
    if !brightness.is_finite() || brightness < 0.0 || brightness > 1.0 {
        return Err(ValueError::InvalidBrightness(brightness));
    }
    Ok(())
}

fn validate_kelvin(kelvin: u16) -> Result<(), ValueError> {
    if kelvin < HsbkColor::MIN_KELVIN || kelvin > HsbkColor::MAX_KELVIN {
        return Err(ValueError::InvalidKelvin(kelvin));
    }
    Ok(())
}

fn parse_component(key: &str, value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue {
        field: key.to_string(),
        message: format!("not a number: {value:?}"),
    })
}

fn range_error(err: ValueError) -> ParseError {
    ParseError::UnexpectedFormat(err.to_string())
}
