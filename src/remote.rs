// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The command dispatch engine.
//!
//! [`Remote`] owns the command queue and a single background worker. Every
//! public operation just validates its input, builds a [`Command`] and
//! hands it to the queue; the worker executes commands strictly in
//! submission order, one at a time, and is the only writer of the bulb
//! cache. Outcomes travel back through the broadcast [`EventBus`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::{BulbCache, Reconciliation};
use crate::command::{Command, CommandKind};
use crate::error::{Error, ValueError};
use crate::event::{EventBus, RemoteEvent};
use crate::protocol::{HttpClient, HttpConfig};
use crate::response::{Bulb, Response};
use crate::state::LightState;
use crate::types::Power;

/// How long the worker waits for a command before refreshing the cache on
/// its own.
pub const DEFAULT_IDLE_REFRESH: Duration = Duration::from_secs(5 * 60);

/// Configuration for a [`Remote`].
///
/// # Examples
///
/// ```no_run
/// use lifx_remote::remote::RemoteConfig;
/// use std::time::Duration;
///
/// # fn main() -> lifx_remote::Result<()> {
/// let remote = RemoteConfig::new("my-app-token")
///     .with_idle_refresh(Duration::from_secs(60))
///     .into_remote()?;
/// remote.start();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    http: HttpConfig,
    idle_refresh: Duration,
}

impl RemoteConfig {
    /// Creates a configuration for the given app token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: HttpConfig::new(token),
            idle_refresh: DEFAULT_IDLE_REFRESH,
        }
    }

    /// Overrides the API base URL. Mainly useful for tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Sets the idle interval after which the worker refreshes the full
    /// bulb listing on its own.
    #[must_use]
    pub fn with_idle_refresh(mut self, idle_refresh: Duration) -> Self {
        self.idle_refresh = idle_refresh;
        self
    }

    /// Builds the [`Remote`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_remote(self) -> crate::Result<Remote> {
        let http = self.http.into_client().map_err(Error::Protocol)?;
        Ok(Remote {
            http,
            cache: Arc::new(RwLock::new(BulbCache::new())),
            event_bus: EventBus::new(),
            idle_refresh: self.idle_refresh,
            worker: Mutex::new(None),
        })
    }
}

struct Worker {
    queue: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

/// Client-side controller for the LIFX cloud.
///
/// All operations are non-blocking: they enqueue a command and return
/// immediately. Results and failures arrive through
/// [`subscribe`](Self::subscribe). The worker keeps the local bulb cache
/// consistent with the server, including a self-healing full refresh when
/// a command response mentions a bulb the cache does not know.
///
/// # Examples
///
/// ```no_run
/// use lifx_remote::remote::RemoteConfig;
/// use lifx_remote::event::RemoteEvent;
///
/// #[tokio::main]
/// async fn main() -> lifx_remote::Result<()> {
///     let remote = RemoteConfig::new("my-app-token").into_remote()?;
///     let mut events = remote.subscribe();
///     remote.start();
///
///     while let Ok(event) = events.recv().await {
///         match event {
///             RemoteEvent::CommandFinished { kind, .. } => {
///                 println!("{kind} finished; {} bulbs known", remote.bulbs().len());
///             }
///             RemoteEvent::Error { message, .. } => eprintln!("error: {message}"),
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct Remote {
    http: HttpClient,
    cache: Arc<RwLock<BulbCache>>,
    event_bus: EventBus,
    idle_refresh: Duration,
    worker: Mutex<Option<Worker>>,
}

impl Remote {
    /// Subscribes to command outcomes and errors.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RemoteEvent> {
        self.event_bus.subscribe()
    }

    /// Starts the background worker and requests an initial full listing.
    ///
    /// Calling `start` while already running is a no-op. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker_loop(
            rx,
            self.http.clone(),
            Arc::clone(&self.cache),
            self.event_bus.clone(),
            self.idle_refresh,
        ));
        *worker = Some(Worker { queue: tx, handle });
        drop(worker);

        tracing::debug!("worker started");
        self.list_all_lights();
    }

    /// Stops the worker, drops any queued commands and clears the cache.
    ///
    /// An HTTP request already in flight is not aborted mid-request; the
    /// worker just never picks up further work. The remote can be started
    /// again afterwards.
    pub fn destroy(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.handle.abort();
            tracing::debug!("worker stopped");
        }
        self.cache.write().clear();
    }

    /// Returns whether the worker is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Returns a snapshot of the last-known state of every bulb.
    #[must_use]
    pub fn bulbs(&self) -> Vec<Bulb> {
        self.cache.read().snapshot()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Requests a full listing of every bulb on the account.
    pub fn list_all_lights(&self) {
        self.enqueue(Command::list_all_lights());
    }

    /// Requests a listing of the bulbs matching a selector.
    pub fn list_lights(&self, selector: impl Into<String>) {
        self.enqueue(Command::list_lights(selector));
    }

    // =========================================================================
    // Power
    // =========================================================================

    /// Turns every bulb on with the default duration.
    pub fn turn_all_on(&self) {
        self.turn_on(crate::state::SELECTOR_ALL);
    }

    /// Turns every bulb off with the default duration.
    pub fn turn_all_off(&self) {
        self.turn_off(crate::state::SELECTOR_ALL);
    }

    /// Turns the selected bulbs on with the default duration.
    pub fn turn_on(&self, selector: impl Into<String>) {
        self.enqueue(Command::set_state(
            LightState::for_selector(selector).with_power(Power::On),
        ));
    }

    /// Turns the selected bulbs off with the default duration.
    pub fn turn_off(&self, selector: impl Into<String>) {
        self.enqueue(Command::set_state(
            LightState::for_selector(selector).with_power(Power::Off),
        ));
    }

    /// Turns the selected bulbs on over the given transition duration.
    pub fn turn_on_with_duration(&self, selector: impl Into<String>, duration: Duration) {
        self.enqueue(Command::set_state(
            LightState::for_selector(selector)
                .with_power(Power::On)
                .with_duration(duration),
        ));
    }

    /// Turns the selected bulbs off over the given transition duration.
    pub fn turn_off_with_duration(&self, selector: impl Into<String>, duration: Duration) {
        self.enqueue(Command::set_state(
            LightState::for_selector(selector)
                .with_power(Power::Off)
                .with_duration(duration),
        ));
    }

    // =========================================================================
    // Brightness and state
    // =========================================================================

    /// Sets the brightness of every bulb.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` if the value is outside
    /// `[0, 1]`; nothing is enqueued in that case.
    pub fn set_all_brightness(
        &self,
        brightness: f32,
        duration: Duration,
    ) -> Result<(), ValueError> {
        self.set_brightness_with_duration(crate::state::SELECTOR_ALL, brightness, duration)
    }

    /// Sets the brightness of the selected bulbs with the default duration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` if the value is outside
    /// `[0, 1]`; nothing is enqueued in that case.
    pub fn set_brightness(
        &self,
        selector: impl Into<String>,
        brightness: f32,
    ) -> Result<(), ValueError> {
        let state = LightState::for_selector(selector).with_brightness(brightness)?;
        self.enqueue(Command::set_state(state));
        Ok(())
    }

    /// Sets the brightness of the selected bulbs over the given duration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidBrightness` if the value is outside
    /// `[0, 1]`; nothing is enqueued in that case.
    pub fn set_brightness_with_duration(
        &self,
        selector: impl Into<String>,
        brightness: f32,
        duration: Duration,
    ) -> Result<(), ValueError> {
        let state = LightState::for_selector(selector)
            .with_brightness(brightness)?
            .with_duration(duration);
        self.enqueue(Command::set_state(state));
        Ok(())
    }

    /// Applies an arbitrary desired state to its selector.
    pub fn set_state(&self, state: LightState) {
        self.enqueue(Command::set_state(state));
    }

    /// Applies a desired state to every bulb, whatever the state's own
    /// selector says.
    pub fn set_all_state(&self, state: LightState) {
        self.set_state(state.with_selector(crate::state::SELECTOR_ALL));
    }

    /// Applies up to 50 desired states in one request, each with its own
    /// selector.
    ///
    /// An empty or oversized batch is rejected before it reaches the
    /// queue: a single [`RemoteEvent::Error`] is published and no request
    /// is made.
    pub fn set_states(&self, states: Vec<LightState>) {
        match Command::set_states(states) {
            Ok(command) => self.enqueue(command),
            Err(e) => {
                tracing::warn!(error = %e, "rejected set_states batch");
                self.event_bus
                    .publish(RemoteEvent::from_error(&Error::Value(e)));
            }
        }
    }

    // =========================================================================
    // Toggle
    // =========================================================================

    /// Toggles power on every bulb.
    pub fn toggle_all_power(&self) {
        self.toggle_power(crate::state::SELECTOR_ALL);
    }

    /// Toggles power on the selected bulbs with no transition.
    pub fn toggle_power(&self, selector: impl Into<String>) {
        self.toggle_power_with_duration(selector, Duration::ZERO);
    }

    /// Toggles power on the selected bulbs over the given duration.
    pub fn toggle_power_with_duration(&self, selector: impl Into<String>, duration: Duration) {
        self.enqueue(Command::toggle_power(selector, duration));
    }

    fn enqueue(&self, command: Command) {
        let worker = self.worker.lock();
        let delivered = worker
            .as_ref()
            .is_some_and(|w| w.queue.send(command).is_ok());
        drop(worker);
        if !delivered {
            tracing::warn!("remote is not running, command dropped");
        }
    }
}

impl Drop for Remote {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.handle.abort();
        }
    }
}

/// The single worker loop.
///
/// The queue is the loop's only suspension point besides the HTTP call
/// itself; commands execute strictly in submission order with at most one
/// request in flight. When the queue stays silent for the idle interval,
/// the worker refreshes the full listing so the cache cannot go stale
/// while the application idles.
async fn worker_loop(
    mut queue: mpsc::UnboundedReceiver<Command>,
    http: HttpClient,
    cache: Arc<RwLock<BulbCache>>,
    event_bus: EventBus,
    idle_refresh: Duration,
) {
    loop {
        match tokio::time::timeout(idle_refresh, queue.recv()).await {
            Err(_) => {
                tracing::debug!("idle timeout, refreshing bulb listing");
                execute(&Command::list_all_lights(), &http, &cache, &event_bus).await;
            }
            Ok(Some(command)) => {
                execute(&command, &http, &cache, &event_bus).await;
            }
            Ok(None) => break,
        }
    }
    tracing::debug!("worker loop exited");
}

/// Executes one command: request, parse, reconcile, notify.
///
/// Every failure is published once and the loop carries on; nothing here
/// can kill the worker.
async fn execute(
    command: &Command,
    http: &HttpClient,
    cache: &Arc<RwLock<BulbCache>>,
    event_bus: &EventBus,
) {
    let kind = command.kind();
    match run_command(command, http).await {
        Err(e) => {
            tracing::warn!(%kind, error = %e, "command failed");
            event_bus.publish(RemoteEvent::from_error(&e));
        }
        Ok(response) => {
            let outcome = cache.write().reconcile(kind, &response);
            if outcome == Reconciliation::Diverged {
                refresh_after_divergence(http, cache, event_bus).await;
            }
            event_bus.publish(RemoteEvent::CommandFinished {
                kind,
                response: Arc::new(response),
            });
        }
    }
}

/// Runs exactly one full-listing request to re-sync a diverged cache.
///
/// Bounded by construction: this is a plain call, not a re-enqueue, so a
/// server that keeps reporting unknown ids cannot cause a refresh storm.
async fn refresh_after_divergence(
    http: &HttpClient,
    cache: &Arc<RwLock<BulbCache>>,
    event_bus: &EventBus,
) {
    let listing = Command::list_all_lights();
    match run_command(&listing, http).await {
        Ok(response) => {
            cache.write().reconcile(CommandKind::ListLights, &response);
        }
        Err(e) => {
            tracing::warn!(error = %e, "divergence refresh failed");
            event_bus.publish(RemoteEvent::from_error(&e));
        }
    }
}

async fn run_command(command: &Command, http: &HttpClient) -> crate::Result<Response> {
    let (code, body) = http.send(command).await.map_err(Error::Protocol)?;
    Response::parse(command.kind(), command.primary_state(), code, &body)
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;

    fn remote() -> Remote {
        RemoteConfig::new("test-token").into_remote().unwrap()
    }

    #[test]
    fn not_running_initially() {
        assert!(!remote().is_running());
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let remote = remote();
        remote.start();
        assert!(remote.is_running());
        remote.start();
        assert!(remote.is_running());
        remote.destroy();
        assert!(!remote.is_running());
    }

    #[tokio::test]
    async fn destroy_clears_cache_and_allows_restart() {
        let remote = remote();
        remote.start();
        remote.destroy();
        assert!(remote.bulbs().is_empty());
        remote.start();
        assert!(remote.is_running());
        remote.destroy();
    }

    #[test]
    fn empty_batch_publishes_one_error_without_enqueueing() {
        let remote = remote();
        let mut events = remote.subscribe();

        remote.set_states(Vec::new());

        assert!(matches!(
            events.try_recv().unwrap(),
            RemoteEvent::Error { code: None, .. }
        ));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn oversized_batch_publishes_one_error_without_enqueueing() {
        let remote = remote();
        let mut events = remote.subscribe();

        let states = vec![LightState::for_all(); crate::state::MAX_BATCH + 1];
        remote.set_states(states);

        match events.try_recv().unwrap() {
            RemoteEvent::Error { message, .. } => {
                assert!(message.contains("at most 50"), "unexpected: {message}");
            }
            RemoteEvent::CommandFinished { .. } => panic!("expected an error event"),
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn invalid_brightness_is_rejected_before_enqueue() {
        let remote = remote();
        assert!(matches!(
            remote.set_brightness("all", 1.5),
            Err(ValueError::InvalidBrightness(_))
        ));
    }

    #[test]
    fn commands_while_stopped_are_dropped() {
        let remote = remote();
        let mut events = remote.subscribe();
        remote.turn_all_on();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }
}
