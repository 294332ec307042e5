//! Content surfaces the bridge can drive
//!
//! Both substrates implement [`ContentSurface`]:
//! - [`NativeSurface`]: a Chrome tab driven over the DevTools protocol. Can move
//!   through history, injects a startup script and intercepts structured
//!   messages posted by the page.
//! - [`FrameSurface`]: an iframe owned by a host page. The host reports load
//!   events and messages; history moves are [`BridgeError::Unsupported`].
//!
//! [`BridgeError::Unsupported`]: crate::error::BridgeError::Unsupported

pub mod config;
pub mod external;
pub mod frame;
pub mod native;

pub use config::{ConnectionOptions, LaunchOptions};
pub use external::{ExternalOpener, SystemOpener};
pub use frame::{FrameSurface, PostedMessage};
pub use native::NativeSurface;

use crate::bridge::fullscreen::FullscreenDirection;
use crate::bridge::message::{BridgeMessage, RawMessage};
use crate::bridge::origin::TrustedOrigin;
use crate::bridge::state::NavigationState;
use crate::error::Result;
use crate::navigation::Destination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Native,
    Frame,
}

impl SurfaceKind {
    /// Short name used in errors and logs
    pub fn name(self) -> &'static str {
        match self {
            SurfaceKind::Native => "native",
            SurfaceKind::Frame => "frame",
        }
    }
}

/// Something that happened inside a content surface.
///
/// Lifecycle events carry the address the surface was asked to load, so that
/// callbacks belonging to a superseded load can be recognized.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    LoadStarted { address: String },
    LoadFinished { address: String },
    LoadFailed { address: String, reason: String },
    NavigationChanged(NavigationState),
    Message { origin: String, raw: RawMessage },
}

/// Blocking engine work handed to the host, returning the events it observed
pub type SurfaceTask = Box<dyn FnOnce() -> Vec<SurfaceEvent> + Send + 'static>;

/// Capability set shared by every content substrate.
///
/// Methods return promptly. Anything that waits on the content engine is
/// queued as a [`SurfaceTask`] for the host to run off its event loop.
pub trait ContentSurface {
    fn kind(&self) -> SurfaceKind;

    /// Start loading a destination
    fn load(&mut self, destination: &Destination) -> Result<()>;

    /// Load the current destination again
    fn reload(&mut self) -> Result<()>;

    fn go_back(&mut self) -> Result<()>;

    fn go_forward(&mut self) -> Result<()>;

    /// Deliver a message into the embedded document, restricted to `target`
    fn post_message(&mut self, message: &BridgeMessage, target: &TrustedOrigin) -> Result<()>;

    /// Call a single vendor fullscreen method
    fn invoke_fullscreen(&mut self, direction: FullscreenDirection, method: &str) -> Result<()>;

    /// Whether the platform exposes a way to leave fullscreen
    fn supports_fullscreen_exit(&self) -> bool {
        true
    }

    /// Drain events observed since the last call
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Drain blocking work queued since the last call
    fn take_tasks(&mut self) -> Vec<SurfaceTask> {
        Vec::new()
    }

    /// Tear down the shown content
    fn unload(&mut self) -> Result<()>;
}
