//! The browser screen: input field, submit, deep links and going home
//!
//! A [`Screen`] holds the text the user typed and a [`Bridge`] for the
//! content surface. While content is shown it keeps an Escape binding
//! registered on its [`KeyboardHub`]; going home releases it.

pub mod keyboard;

pub use keyboard::{Key, KeyAction, KeyboardHub, ListenerGuard};

use crate::bridge::{Bridge, BridgeOptions};
use crate::error::{BridgeError, Result};
use crate::navigation::{Destination, Normalizer, decode_deep_link};
use crate::surface::{ContentSurface, ExternalOpener};

/// Why the screen is returning home
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeReason {
    /// Escape key or home button
    User,
    /// The host closed the content
    Programmatic,
}

/// The browser screen around one content surface
pub struct Screen<S> {
    bridge: Bridge<S>,
    normalizer: Normalizer,
    input: String,
    /// Focus the input on mount; off when opened from a deep link
    autofocus: bool,
    keyboard: KeyboardHub,
    escape_listener: Option<ListenerGuard>,
}

impl<S: ContentSurface> Screen<S> {
    /// Create an idle screen over `surface`
    pub fn new(surface: S, options: BridgeOptions) -> Self {
        Self {
            bridge: Bridge::new(surface, options),
            normalizer: Normalizer::default(),
            input: String::new(),
            autofocus: true,
            keyboard: KeyboardHub::new(),
            escape_listener: None,
        }
    }

    /// Builder method: use a custom normalizer (search engine)
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Get the content bridge
    pub fn bridge(&self) -> &Bridge<S> {
        &self.bridge
    }

    /// Get the content bridge mutably
    pub fn bridge_mut(&mut self) -> &mut Bridge<S> {
        &mut self.bridge
    }

    /// Current text of the input field
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the text of the input field
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Whether the input should take focus when shown
    pub fn autofocus(&self) -> bool {
        self.autofocus
    }

    /// Whether a content surface is mounted
    pub fn is_showing_content(&self) -> bool {
        self.bridge.is_mounted()
    }

    /// Get the screen's key listeners
    pub fn keyboard(&self) -> &KeyboardHub {
        &self.keyboard
    }

    /// Load an externally supplied, percent-encoded address without user input.
    ///
    /// Returns `false` when the link decodes to nothing.
    pub fn open_deep_link(&mut self, encoded: &str) -> Result<bool> {
        self.autofocus = false;

        match decode_deep_link(encoded, &self.normalizer)? {
            Some(destination) => {
                self.input = destination.as_str().to_string();
                self.show(destination);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Normalize the input and load it. Blank input is a no-op returning `false`.
    pub fn submit(&mut self) -> bool {
        match self.normalizer.normalize(&self.input) {
            Some(destination) => {
                self.show(destination);
                true
            }
            None => {
                log::debug!("Ignoring blank submit");
                false
            }
        }
    }

    /// Reload the destination after a failure
    pub fn retry(&mut self) -> bool {
        self.bridge.retry()
    }

    /// Hand the current destination to another application
    pub fn open_externally(&self, opener: &dyn ExternalOpener) -> Result<()> {
        let destination = self.bridge.destination().ok_or(BridgeError::NotMounted)?;
        opener.open(destination)
    }

    /// Close the content and return to the idle home state
    pub fn go_home(&mut self, reason: HomeReason) {
        if reason == HomeReason::User && self.bridge.is_mounted() {
            self.bridge.exit_fullscreen();
        }

        self.bridge.unmount();
        self.escape_listener = None;
    }

    /// Dispatch a document-level key press. Returns whether a binding handled it.
    pub fn dispatch_key(&mut self, key: &Key) -> bool {
        let actions = self.keyboard.dispatch(key);
        for action in &actions {
            match action {
                KeyAction::GoHome => self.go_home(HomeReason::User),
            }
        }
        !actions.is_empty()
    }

    fn show(&mut self, destination: Destination) {
        self.bridge.load(destination);

        if self.escape_listener.is_none() {
            self.escape_listener = Some(self.keyboard.listen(Key::Escape, KeyAction::GoHome));
        }
    }
}
