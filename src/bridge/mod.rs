//! Embedded content bridge
//!
//! [`Bridge`] owns one content surface and everything that happens to it:
//! - the [`LoadState`] machine (`Idle -> Loading -> Loaded | Errored`, retry back to `Loading`)
//! - fullscreen entry a short delay after each successful load
//! - the sign-in relay: an `AUTH_REQUEST` from the page starts a sign-in, and
//!   its outcome goes back as exactly one `AUTH_RESPONSE`
//!
//! Only messages from the configured [`TrustedOrigin`] are acted on, and
//! responses are only delivered to it. Everything else is dropped silently.
//!
//! The bridge never blocks. Work that takes time (the fullscreen delay, the
//! sign-in) is requested through [`BridgeEffect`]s and its completion is fed
//! back through [`Bridge::fullscreen_due`] and [`Bridge::complete_sign_in`].

pub mod config;
pub mod fullscreen;
pub mod message;
pub mod origin;
pub mod state;

pub use config::BridgeOptions;
pub use fullscreen::FullscreenDirection;
pub use message::{AuthPayload, BridgeMessage, DecodeError, RawMessage};
pub use origin::TrustedOrigin;
pub use state::{LoadState, NavigationState, RecoveryAction};

use crate::auth::{self, AuthResult};
use crate::error::{BridgeError, Result};
use crate::navigation::Destination;
use crate::surface::{ContentSurface, SurfaceEvent, SurfaceTask};
use std::collections::VecDeque;
use std::time::Duration;

/// Work the bridge asks its host to do
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEffect {
    /// The load state changed
    StateChanged(LoadState),
    /// The address shown to the user changed
    AddressChanged(String),
    /// Call [`Bridge::fullscreen_due`] with `generation` after `delay`
    ScheduleFullscreen { generation: u64, delay: Duration },
    /// Run the authenticator and pass its outcome, with `generation`, to [`Bridge::complete_sign_in`]
    SignInRequested { generation: u64 },
}

/// What happened to an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDisposition {
    SignInStarted,
    /// A sign-in is already running; the request was ignored
    SignInPending,
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotMounted,
    UntrustedOrigin,
    Undecodable,
    /// Responses only travel into the page
    UnexpectedResponse,
}

/// Lifecycle and message relay for one content surface
pub struct Bridge<S> {
    surface: S,
    options: BridgeOptions,
    state: LoadState,
    destination: Option<Destination>,
    navigation: Option<NavigationState>,
    /// Bumped on every load and unmount; stale timers compare against it
    generation: u64,
    /// Generation of the page whose sign-in is running
    sign_in: Option<u64>,
    effects: VecDeque<BridgeEffect>,
}

impl<S: ContentSurface> Bridge<S> {
    /// Create an idle bridge over `surface`
    pub fn new(surface: S, options: BridgeOptions) -> Self {
        Self {
            surface,
            options,
            state: LoadState::Idle,
            destination: None,
            navigation: None,
            generation: 0,
            sign_in: None,
            effects: VecDeque::new(),
        }
    }

    /// Current load state
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Destination being shown, if any
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Last navigation state reported by the surface
    pub fn navigation(&self) -> Option<&NavigationState> {
        self.navigation.as_ref()
    }

    /// Counter bumped by every load and unmount
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get the bridge options
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Whether a content surface is currently shown
    pub fn is_mounted(&self) -> bool {
        self.destination.is_some()
    }

    /// Whether a sign-in started by the current page is still running
    pub fn is_sign_in_pending(&self) -> bool {
        self.sign_in.is_some()
    }

    /// Get the underlying content surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Get the underlying content surface mutably
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Take the effects requested since the last call
    pub fn drain_effects(&mut self) -> Vec<BridgeEffect> {
        self.effects.drain(..).collect()
    }

    /// Blocking surface work the host must run off its event loop.
    ///
    /// Events returned by each task go to [`Bridge::handle_surface_event`].
    pub fn take_surface_tasks(&mut self) -> Vec<SurfaceTask> {
        self.surface.take_tasks()
    }

    /// Pump, then run pending surface work inline. For hosts without an event loop.
    pub fn pump_blocking(&mut self) -> usize {
        let mut count = self.pump();
        for task in self.surface.take_tasks() {
            for event in task() {
                self.handle_surface_event(event);
                count += 1;
            }
        }
        count
    }

    /// Start loading a destination, superseding any load in flight
    pub fn load(&mut self, destination: Destination) {
        log::info!("Loading {}", destination);

        self.generation += 1;
        self.navigation = None;
        self.sign_in = None;
        self.destination = Some(destination.clone());
        self.set_state(LoadState::Loading);
        self.effects
            .push_back(BridgeEffect::AddressChanged(destination.as_str().to_string()));

        if let Err(e) = self.surface.load(&destination) {
            log::warn!("Surface refused to load {}: {}", destination, e);
            self.fail();
        }
    }

    /// Reissue the failed load. Returns `false` unless the state was `Errored`.
    pub fn retry(&mut self) -> bool {
        if !self.state.is_errored() {
            return false;
        }

        match self.destination.clone() {
            Some(destination) => {
                self.load(destination);
                true
            }
            None => false,
        }
    }

    /// Recovery the user can pick while the load is errored
    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        match (&self.state, &self.destination) {
            (LoadState::Errored(_), Some(destination)) => {
                vec![RecoveryAction::OpenExternally(destination.clone()), RecoveryAction::Retry]
            }
            _ => Vec::new(),
        }
    }

    /// Reload the current page
    pub fn reload(&mut self) -> Result<()> {
        self.require_mounted()?;
        self.surface.reload()
    }

    /// Move back in the surface history
    pub fn go_back(&mut self) -> Result<()> {
        self.require_mounted()?;
        self.surface.go_back()
    }

    /// Move forward in the surface history
    pub fn go_forward(&mut self) -> Result<()> {
        self.require_mounted()?;
        self.surface.go_forward()
    }

    /// Tear down the content and return to `Idle`
    pub fn unmount(&mut self) {
        if let Some(destination) = self.destination.take() {
            log::info!("Closing {}", destination);
            if let Err(e) = self.surface.unload() {
                log::debug!("Failed to unload surface: {}", e);
            }
        }

        self.generation += 1;
        self.navigation = None;
        self.sign_in = None;
        self.set_state(LoadState::Idle);
    }

    /// Feed queued surface events into the bridge. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let events = self.surface.poll_events();
        let count = events.len();
        for event in events {
            self.handle_surface_event(event);
        }
        count
    }

    /// Apply one event observed by the surface
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::LoadStarted { address } => {
                if self.is_current(&address) {
                    self.set_state(LoadState::Loading);
                } else {
                    log::debug!("Ignoring stale load start for {}", address);
                }
            }
            SurfaceEvent::LoadFinished { address } => {
                if !self.is_current(&address) {
                    log::debug!("Ignoring stale load completion for {}", address);
                    return;
                }

                self.set_state(LoadState::Loaded);
                if self.options.auto_fullscreen {
                    self.effects.push_back(BridgeEffect::ScheduleFullscreen {
                        generation: self.generation,
                        delay: self.options.fullscreen_delay,
                    });
                }
            }
            SurfaceEvent::LoadFailed { address, reason } => {
                if !self.is_current(&address) {
                    log::debug!("Ignoring stale load failure for {}", address);
                    return;
                }

                log::warn!("Failed to load {}: {}", address, reason);
                self.fail();
            }
            SurfaceEvent::NavigationChanged(navigation) => {
                if !self.is_mounted() {
                    return;
                }

                let url_changed = self.navigation.as_ref().map(|n| n.url != navigation.url).unwrap_or(true);
                if url_changed {
                    self.effects.push_back(BridgeEffect::AddressChanged(navigation.url.clone()));
                }
                self.navigation = Some(navigation);
            }
            SurfaceEvent::Message { origin, raw } => {
                self.handle_message(&origin, raw);
            }
        }
    }

    /// Validate and act on a message posted by the embedded page
    pub fn handle_message(&mut self, origin: &str, raw: RawMessage) -> MessageDisposition {
        if !self.is_mounted() {
            return MessageDisposition::Dropped(DropReason::NotMounted);
        }

        if !self.options.trusted_origin.matches(origin) {
            log::debug!("Dropping message from untrusted origin {}", origin);
            return MessageDisposition::Dropped(DropReason::UntrustedOrigin);
        }

        let message = match BridgeMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("Dropping message from {}: {}", origin, e);
                return MessageDisposition::Dropped(DropReason::Undecodable);
            }
        };

        match message {
            BridgeMessage::AuthRequest if self.sign_in.is_some() => {
                log::debug!("Sign-in already in progress, ignoring request");
                MessageDisposition::SignInPending
            }
            BridgeMessage::AuthRequest => {
                log::info!("Page requested sign-in");
                self.sign_in = Some(self.generation);
                self.effects.push_back(BridgeEffect::SignInRequested {
                    generation: self.generation,
                });
                MessageDisposition::SignInStarted
            }
            BridgeMessage::AuthResponse { .. } => {
                log::debug!("Dropping {} sent by the page", message.kind());
                MessageDisposition::Dropped(DropReason::UnexpectedResponse)
            }
        }
    }

    /// Relay a finished sign-in into the page that requested it.
    ///
    /// `generation` is the one carried by [`BridgeEffect::SignInRequested`].
    /// Returns `Ok(false)` when that page was closed or replaced and the
    /// response was dropped.
    pub fn complete_sign_in(&mut self, generation: u64, result: AuthResult) -> Result<bool> {
        if !self.is_mounted() || self.sign_in != Some(generation) {
            log::debug!("Page closed before sign-in finished, dropping response (generation {})", generation);
            return Ok(false);
        }
        self.sign_in = None;

        let result = auth::settle(result);
        if let Err(e) = &result {
            log::info!("Sign-in failed: {}", e);
        }

        let response = BridgeMessage::auth_response(result);
        self.surface.post_message(&response, &self.options.trusted_origin)?;
        Ok(true)
    }

    /// The fullscreen delay for `generation` elapsed.
    ///
    /// Does nothing when the content was closed or replaced in the meantime.
    pub fn fullscreen_due(&mut self, generation: u64) -> Option<&'static str> {
        if !self.is_mounted() || generation != self.generation {
            log::debug!("Skipping stale fullscreen request (generation {})", generation);
            return None;
        }

        fullscreen::apply(&mut self.surface, FullscreenDirection::Enter)
    }

    /// Best-effort exit from fullscreen
    pub fn exit_fullscreen(&mut self) -> Option<&'static str> {
        if !self.surface.supports_fullscreen_exit() {
            return None;
        }

        fullscreen::apply(&mut self.surface, FullscreenDirection::Exit)
    }

    fn is_current(&self, address: &str) -> bool {
        self.destination.as_ref().map(|d| d.as_str() == address).unwrap_or(false)
    }

    fn require_mounted(&self) -> Result<()> {
        if self.is_mounted() { Ok(()) } else { Err(BridgeError::NotMounted) }
    }

    fn fail(&mut self) {
        let message = self.options.load_error_message.clone();
        self.set_state(LoadState::Errored(message));
    }

    fn set_state(&mut self, state: LoadState) {
        if self.state != state {
            self.state = state.clone();
            self.effects.push_back(BridgeEffect::StateChanged(state));
        }
    }
}
