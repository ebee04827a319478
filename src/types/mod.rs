// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for LIFX bulb control.
//!
//! This module provides type-safe representations of values used in LIFX
//! commands. Each type ensures values are within their valid ranges at
//! construction time, preventing runtime errors.
//!
//! # Types
//!
//! - [`Power`] - On/Off power state ("no change" is `Option::None`)
//! - [`HsbkColor`] - Hue/Saturation/Brightness/Kelvin color value

mod color;
mod power;

pub use color::HsbkColor;
pub use power::Power;
