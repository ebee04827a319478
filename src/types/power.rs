// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state type for LIFX bulbs.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// The power state of a bulb.
///
/// "No change" is expressed as `Option<Power>::None` wherever a state
/// payload may leave power untouched, rather than as a third enum variant.
///
/// # Examples
///
/// ```
/// use lifx_remote::types::Power;
///
/// assert_eq!(Power::On.as_str(), "on");
/// assert_eq!("off".parse::<Power>().unwrap(), Power::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Power {
    /// The bulb is (or should be) on.
    On,
    /// The bulb is (or should be) off.
    Off,
}

impl Power {
    /// Returns the wire representation used in JSON payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// Returns `true` for [`Power::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Power {
    type Err = ParseError;

    /// Parses the wire representation. The listing endpoint only ever
    /// reports `"on"` or `"off"`; anything else is treated as off, matching
    /// the service's own fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            _ => Ok(Self::Off),
        }
    }
}

impl From<bool> for Power {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}
