//! Single-threaded event loop around a [`Screen`]
//!
//! Every state change happens inside [`ScreenDriver::step`], one event at a
//! time. Timers and sign-ins run as spawned tasks, and blocking surface work
//! runs on tokio's blocking pool. All of them report back through the same
//! event channel and never touch the screen directly.

use crate::auth::{AuthResult, Authenticator};
use crate::bridge::{BridgeEffect, LoadState, RecoveryAction};
use crate::screen::{HomeReason, Key, Screen};
use crate::surface::{ContentSurface, ExternalOpener, SurfaceEvent, SystemOpener};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Input to the event loop
#[derive(Debug)]
pub enum ScreenEvent {
    /// The input field changed
    Input(String),
    Submit,
    /// Set the input and submit it
    Navigate(String),
    DeepLink(String),
    Key(Key),
    GoHome,
    Retry,
    /// Hand the current destination to the system browser
    OpenExternally,
    Reload,
    GoBack,
    GoForward,
    Surface(SurfaceEvent),
    FullscreenDue(u64),
    /// A sign-in requested by the page of `generation` finished
    SignInFinished { generation: u64, result: AuthResult },
    /// Check the surface for queued events
    Poll,
    Shutdown,
}

/// Output of the event loop, for whatever renders the screen
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenUpdate {
    State(LoadState),
    Address(String),
    /// Offered after a load failure
    Recovery(Vec<RecoveryAction>),
    FullscreenEntered(&'static str),
    SignInRelayed { delivered: bool },
}

/// Owns a [`Screen`] and feeds it events one at a time
pub struct ScreenDriver<S> {
    screen: Screen<S>,
    authenticator: Arc<dyn Authenticator>,
    opener: Box<dyn ExternalOpener>,
    events_tx: UnboundedSender<ScreenEvent>,
    events_rx: UnboundedReceiver<ScreenEvent>,
    updates: Option<UnboundedSender<ScreenUpdate>>,
    poll_interval: Option<Duration>,
}

impl<S: ContentSurface> ScreenDriver<S> {
    /// Create a driver that signs in through `authenticator`
    pub fn new(screen: Screen<S>, authenticator: Arc<dyn Authenticator>) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            screen,
            authenticator,
            opener: Box::new(SystemOpener::default()),
            events_tx,
            events_rx,
            updates: None,
            poll_interval: None,
        }
    }

    /// Builder method: poll the surface for events on a fixed interval
    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Builder method: replace the system opener
    pub fn with_opener(mut self, opener: Box<dyn ExternalOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Sender for feeding events into the loop
    pub fn sender(&self) -> UnboundedSender<ScreenEvent> {
        self.events_tx.clone()
    }

    /// Receive screen updates; replaces any earlier subscriber
    pub fn subscribe(&mut self) -> UnboundedReceiver<ScreenUpdate> {
        let (tx, rx) = unbounded_channel();
        self.updates = Some(tx);
        rx
    }

    /// Get the driven screen
    pub fn screen(&self) -> &Screen<S> {
        &self.screen
    }

    /// Get the driven screen mutably
    pub fn screen_mut(&mut self) -> &mut Screen<S> {
        &mut self.screen
    }

    /// Process events until [`ScreenEvent::Shutdown`], then hand the screen back
    pub async fn run(mut self) -> Screen<S> {
        let mut ticker = self.poll_interval.map(tokio::time::interval);

        loop {
            let event = match ticker.as_mut() {
                Some(ticker) => tokio::select! {
                    event = self.events_rx.recv() => event,
                    _ = ticker.tick() => Some(ScreenEvent::Poll),
                },
                None => self.events_rx.recv().await,
            };

            let Some(event) = event else { break };
            if !self.step(event) {
                break;
            }
        }

        log::debug!("Screen event loop stopped");
        self.screen
    }

    /// Apply one event. Returns `false` once the loop should stop.
    pub fn step(&mut self, event: ScreenEvent) -> bool {
        match event {
            ScreenEvent::Input(text) => self.screen.set_input(text),
            ScreenEvent::Submit => {
                self.screen.submit();
            }
            ScreenEvent::Navigate(text) => {
                self.screen.set_input(text);
                self.screen.submit();
            }
            ScreenEvent::DeepLink(encoded) => {
                if let Err(e) = self.screen.open_deep_link(&encoded) {
                    log::warn!("Ignoring deep link: {}", e);
                }
            }
            ScreenEvent::Key(key) => {
                self.screen.dispatch_key(&key);
            }
            ScreenEvent::GoHome => self.screen.go_home(HomeReason::User),
            ScreenEvent::Retry => {
                if !self.screen.retry() {
                    log::debug!("Nothing to retry");
                }
            }
            ScreenEvent::OpenExternally => {
                if let Err(e) = self.screen.open_externally(self.opener.as_ref()) {
                    log::warn!("Open externally failed: {}", e);
                }
            }
            ScreenEvent::Reload => {
                if let Err(e) = self.screen.bridge_mut().reload() {
                    log::warn!("Reload failed: {}", e);
                }
            }
            ScreenEvent::GoBack => {
                if let Err(e) = self.screen.bridge_mut().go_back() {
                    log::warn!("Back failed: {}", e);
                }
            }
            ScreenEvent::GoForward => {
                if let Err(e) = self.screen.bridge_mut().go_forward() {
                    log::warn!("Forward failed: {}", e);
                }
            }
            ScreenEvent::Surface(event) => self.screen.bridge_mut().handle_surface_event(event),
            ScreenEvent::FullscreenDue(generation) => {
                if let Some(method) = self.screen.bridge_mut().fullscreen_due(generation) {
                    self.publish(ScreenUpdate::FullscreenEntered(method));
                }
            }
            ScreenEvent::SignInFinished { generation, result } => match self
                .screen
                .bridge_mut()
                .complete_sign_in(generation, result)
            {
                Ok(delivered) => self.publish(ScreenUpdate::SignInRelayed { delivered }),
                Err(e) => {
                    log::warn!("Failed to relay sign-in result: {}", e);
                    self.publish(ScreenUpdate::SignInRelayed { delivered: false });
                }
            },
            ScreenEvent::Poll => {}
            ScreenEvent::Shutdown => return false,
        }

        self.screen.bridge_mut().pump();
        self.flush_effects();
        self.spawn_surface_tasks();
        true
    }

    fn spawn_surface_tasks(&mut self) {
        for task in self.screen.bridge_mut().take_surface_tasks() {
            let tx = self.events_tx.clone();
            tokio::task::spawn_blocking(move || {
                for event in task() {
                    if tx.send(ScreenEvent::Surface(event)).is_err() {
                        break;
                    }
                }
            });
        }
    }

    fn flush_effects(&mut self) {
        for effect in self.screen.bridge_mut().drain_effects() {
            match effect {
                BridgeEffect::StateChanged(state) => {
                    let errored = state.is_errored();
                    self.publish(ScreenUpdate::State(state));
                    if errored {
                        let actions = self.screen.bridge().recovery_actions();
                        self.publish(ScreenUpdate::Recovery(actions));
                    }
                }
                BridgeEffect::AddressChanged(address) => self.publish(ScreenUpdate::Address(address)),
                BridgeEffect::ScheduleFullscreen { generation, delay } => {
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        // The loop may already be gone
                        let _ = tx.send(ScreenEvent::FullscreenDue(generation));
                    });
                }
                BridgeEffect::SignInRequested { generation } => {
                    let tx = self.events_tx.clone();
                    let authenticator = Arc::clone(&self.authenticator);
                    tokio::spawn(async move {
                        let result = authenticator.sign_in().await;
                        let _ = tx.send(ScreenEvent::SignInFinished { generation, result });
                    });
                }
            }
        }
    }

    fn publish(&self, update: ScreenUpdate) {
        if let Some(updates) = &self.updates {
            let _ = updates.send(update);
        }
    }
}
