// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport for talking to the LIFX cloud.
//!
//! All communication is HTTPS against the v1 REST API; [`HttpClient`]
//! performs the request and hands the raw status code and body to the
//! response parser.

mod http;

pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpClient, HttpConfig};
