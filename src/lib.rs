//! # webframe
//!
//! A minimal embedded-browser screen: a URL/search input that loads a destination
//! inside an embedded content surface, enters fullscreen once the page has loaded,
//! and relays a Google sign-in flow into the embedded page.
//!
//! ## Features
//!
//! - **URL Normalization**: free text becomes a search query URL or a scheme-qualified address
//! - **Content Surfaces**: one interface over a Chrome tab (native) and a host-page iframe (frame)
//! - **Load Lifecycle**: `Idle -> Loading -> Loaded | Errored`, with retry and open-externally recovery
//! - **Sign-in Bridge**: `GOOGLE_AUTH_REQUEST` / `GOOGLE_AUTH_RESPONSE` relay restricted to one trusted origin
//!
//! ## Usage
//!
//! ```rust,no_run
//! use webframe::{BridgeOptions, LaunchOptions, NativeSurface, Screen};
//!
//! # fn main() -> webframe::Result<()> {
//! let surface = NativeSurface::launch(LaunchOptions::default())?;
//! let options = BridgeOptions::for_origin("https://app.example.com")?;
//! let mut screen = Screen::new(surface, options);
//!
//! screen.set_input("openai.com");
//! screen.submit();
//! screen.bridge_mut().pump_blocking();
//!
//! println!("{:?}", screen.bridge().state());
//! # Ok(())
//! # }
//! ```
//!
//! ### Normalizing input
//!
//! ```rust
//! use webframe::navigation::normalize;
//!
//! assert_eq!(normalize("openai.com").unwrap().as_str(), "https://openai.com");
//! assert_eq!(
//!     normalize("weather today").unwrap().as_str(),
//!     "https://www.google.com/search?q=weather%20today"
//! );
//! assert!(normalize("   ").is_none());
//! ```
//!
//! ## Module Overview
//!
//! - [`navigation`]: input normalization and deep-link decoding
//! - [`bridge`]: load state, fullscreen and the sign-in message relay
//! - [`surface`]: native (Chrome) and frame (iframe) content surfaces
//! - [`screen`]: input, submit, go-home and the scoped Escape binding
//! - [`auth`]: the sign-in collaborator interface
//! - [`runtime`]: tokio event loop driving a screen (requires `runtime` feature)
//! - [`error`]: error types and result aliases

pub mod auth;
pub mod bridge;
pub mod error;
pub mod navigation;
pub mod screen;
pub mod surface;

#[cfg(feature = "runtime")]
pub mod runtime;

pub use auth::{AuthError, AuthTokens, Authenticator};
pub use bridge::{Bridge, BridgeMessage, BridgeOptions, LoadState, TrustedOrigin};
pub use error::{BridgeError, Result};
pub use navigation::{Destination, Normalizer, SearchEngine, normalize};
pub use screen::{HomeReason, Key, Screen};
pub use surface::{ContentSurface, FrameSurface, LaunchOptions, NativeSurface};

#[cfg(feature = "runtime")]
pub use runtime::{ScreenDriver, ScreenEvent, ScreenUpdate};
