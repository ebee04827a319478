// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LIFX` Remote - A Rust library to control LIFX bulbs through the cloud
//! HTTP API.
//!
//! The library keeps a local cache of every bulb on the account and runs
//! all commands through a single background worker, so callers never block
//! on the network and never see the cache change mid-command.
//!
//! # Supported Features
//!
//! - **Power control**: Turn bulbs on/off or toggle them, with transition
//!   durations
//! - **Color control**: HSBK colors with white-point kelvin, RGB
//!   conversion, text encoding, circular hue averaging
//! - **Batch updates**: Up to 50 selector/state pairs in one request
//! - **Bulb cache**: Full listings replace the cache, command results
//!   merge into it, unknown bulbs trigger a self-healing refresh
//! - **Events**: Broadcast notifications for finished commands and errors
//!
//! # Quick Start
//!
//! ```no_run
//! use lifx_remote::{RemoteConfig, RemoteEvent};
//!
//! #[tokio::main]
//! async fn main() -> lifx_remote::Result<()> {
//!     let remote = RemoteConfig::new("my-app-token").into_remote()?;
//!     let mut events = remote.subscribe();
//!
//!     // Spawns the worker and requests an initial full listing.
//!     remote.start();
//!
//!     remote.turn_all_on();
//!     remote.set_brightness("label:Kitchen", 0.4)?;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             RemoteEvent::CommandFinished { kind, .. } => {
//!                 println!("{kind} done; {} bulbs known", remote.bulbs().len());
//!             }
//!             RemoteEvent::Error { message, .. } => {
//!                 eprintln!("remote error: {message}");
//!             }
//!         }
//!     }
//!
//!     remote.destroy();
//!     Ok(())
//! }
//! ```
//!
//! # Selectors
//!
//! Operations that target bulbs take a selector string as defined by the
//! LIFX HTTP API, for example `"all"`, `"id:d073d5000000"` or
//! `"label:Kitchen"`. Selectors are percent-encoded before they are put
//! into a URL path.

mod cache;
pub mod command;
pub mod error;
pub mod event;
pub mod protocol;
pub mod remote;
pub mod response;
pub mod state;
pub mod types;

pub use command::{Command, CommandKind};
pub use error::{Error, FieldError, ParseError, ProtocolError, Result, ServerError, ValueError};
pub use event::{EventBus, RemoteEvent};
pub use protocol::{HttpClient, HttpConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use remote::{Remote, RemoteConfig, DEFAULT_IDLE_REFRESH};
pub use response::{Bulb, BulbStatus, GroupRef, Operation, Product, Response, Warning};
pub use state::{LightState, DEFAULT_DURATION, MAX_BATCH, SELECTOR_ALL};
pub use types::{HsbkColor, Power};
