use crate::surface::ContentSurface;

/// Vendor entry points for entering fullscreen, tried in order
pub const ENTER_METHODS: [&str; 5] = [
    "requestFullscreen",
    "webkitRequestFullscreen",
    "webkitEnterFullscreen",
    "mozRequestFullScreen",
    "msRequestFullscreen",
];

/// Vendor entry points for leaving fullscreen, tried in order
pub const EXIT_METHODS: [&str; 5] = [
    "exitFullscreen",
    "webkitExitFullscreen",
    "webkitCancelFullScreen",
    "mozCancelFullScreen",
    "msExitFullscreen",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenDirection {
    /// Called on the element containing the content
    Enter,
    /// Called on the document
    Exit,
}

impl FullscreenDirection {
    pub fn methods(self) -> &'static [&'static str] {
        match self {
            FullscreenDirection::Enter => &ENTER_METHODS,
            FullscreenDirection::Exit => &EXIT_METHODS,
        }
    }
}

/// Try each vendor entry point until one succeeds.
///
/// Returns the method that worked. Failures are logged and swallowed.
pub fn apply<S: ContentSurface + ?Sized>(surface: &mut S, direction: FullscreenDirection) -> Option<&'static str> {
    for method in direction.methods() {
        match surface.invoke_fullscreen(direction, method) {
            Ok(()) => {
                log::debug!("Fullscreen {:?} succeeded via {}", direction, method);
                return Some(method);
            }
            Err(e) => {
                log::debug!("Fullscreen {:?} via {} failed: {}", direction, method, e);
            }
        }
    }

    log::debug!("No fullscreen entry point available for {:?}", direction);
    None
}
