use crate::bridge::origin::TrustedOrigin;
use crate::error::Result;
use std::time::Duration;

/// Delay between a finished load and the fullscreen request
pub const DEFAULT_FULLSCREEN_DELAY: Duration = Duration::from_millis(800);

/// Message shown for every kind of load failure
pub const DEFAULT_LOAD_ERROR_MESSAGE: &str = "This page could not be loaded.";

/// Options for a [`Bridge`](crate::bridge::Bridge)
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// The only origin bridge messages are exchanged with
    pub trusted_origin: TrustedOrigin,

    pub fullscreen_delay: Duration,

    /// Request fullscreen after each successful load
    pub auto_fullscreen: bool,

    pub load_error_message: String,
}

impl BridgeOptions {
    /// Default options for `trusted_origin`
    pub fn new(trusted_origin: TrustedOrigin) -> Self {
        Self {
            trusted_origin,
            fullscreen_delay: DEFAULT_FULLSCREEN_DELAY,
            auto_fullscreen: true,
            load_error_message: DEFAULT_LOAD_ERROR_MESSAGE.to_string(),
        }
    }

    /// Parse the trusted origin and use defaults for everything else
    pub fn for_origin(origin: &str) -> Result<Self> {
        Ok(Self::new(TrustedOrigin::parse(origin)?))
    }

    /// Builder method: set the delay before fullscreen
    pub fn fullscreen_delay(mut self, delay: Duration) -> Self {
        self.fullscreen_delay = delay;
        self
    }

    /// Builder method: enable or disable fullscreen after load
    pub fn auto_fullscreen(mut self, enabled: bool) -> Self {
        self.auto_fullscreen = enabled;
        self
    }

    /// Builder method: set the load failure message
    pub fn load_error_message(mut self, message: impl Into<String>) -> Self {
        self.load_error_message = message.into();
        self
    }
}
