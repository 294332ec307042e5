use crate::bridge::fullscreen::FullscreenDirection;
use crate::bridge::message::{BridgeMessage, RawMessage};
use crate::bridge::origin::TrustedOrigin;
use crate::bridge::state::NavigationState;
use crate::error::{BridgeError, Result};
use crate::navigation::Destination;
use crate::surface::{ContentSurface, SurfaceEvent, SurfaceKind};
use std::collections::{HashSet, VecDeque};

/// A message waiting for the host page to hand it to `iframe.contentWindow.postMessage`
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub target_origin: String,
    pub data: serde_json::Value,
}

/// Content surface for a host page that embeds the destination in an iframe.
///
/// The host page renders [`FrameSurface::markup`], forwards the iframe's
/// `load`/`error` events and `message` events through the `report_*` and
/// [`FrameSurface::deliver`] methods, and flushes [`FrameSurface::take_posted`]
/// into the iframe. Cross-origin iframes cannot be scripted or moved through
/// history, so those operations are unsupported.
#[derive(Debug, Clone)]
pub struct FrameSurface {
    /// DOM id of the element that contains the iframe
    container_id: String,

    src: Option<String>,

    /// Fullscreen methods the host document exposes
    fullscreen_methods: HashSet<String>,

    fullscreen: bool,

    events: VecDeque<SurfaceEvent>,

    posted: Vec<PostedMessage>,

    fullscreen_calls: Vec<String>,
}

impl FrameSurface {
    /// Create an empty frame inside the element with id `container_id`
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            src: None,
            fullscreen_methods: HashSet::new(),
            fullscreen: false,
            events: VecDeque::new(),
            posted: Vec::new(),
            fullscreen_calls: Vec::new(),
        }
    }

    /// Builder method: fullscreen methods available on the host document
    pub fn with_fullscreen_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fullscreen_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// DOM id of the containing element
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Current iframe `src`, if any
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Whether the last fullscreen call entered fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Fullscreen methods the host should call, in the order they were requested
    pub fn take_fullscreen_calls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.fullscreen_calls)
    }

    /// Render the iframe element for the host page
    pub fn markup(&self) -> String {
        let src = self.src.as_deref().unwrap_or("about:blank");
        format!(
            r#"<div id="{id}" class="webframe-container"><iframe src="{src}" title="Embedded content" allow="fullscreen" allowfullscreen referrerpolicy="strict-origin-when-cross-origin" style="border:0;width:100%;height:100%"></iframe></div>"#,
            id = html_escape::encode_double_quoted_attribute(&self.container_id),
            src = html_escape::encode_double_quoted_attribute(src),
        )
    }

    /// Host saw the iframe's `load` event
    pub fn report_loaded(&mut self) {
        if let Some(src) = self.src.clone() {
            self.events.push_back(SurfaceEvent::LoadFinished { address: src.clone() });
            self.events.push_back(SurfaceEvent::NavigationChanged(NavigationState::new(src)));
        }
    }

    /// Host saw the iframe fail, including a framing rejection
    pub fn report_failed(&mut self, reason: impl Into<String>) {
        if let Some(src) = self.src.clone() {
            self.events.push_back(SurfaceEvent::LoadFailed {
                address: src,
                reason: reason.into(),
            });
        }
    }

    /// Host received a `message` event from the iframe
    pub fn deliver(&mut self, origin: impl Into<String>, data: serde_json::Value) {
        self.events.push_back(SurfaceEvent::Message {
            origin: origin.into(),
            raw: RawMessage::Object(data),
        });
    }

    /// Messages to forward into the iframe
    pub fn take_posted(&mut self) -> Vec<PostedMessage> {
        std::mem::take(&mut self.posted)
    }

    fn set_src(&mut self, address: &str) {
        self.src = Some(address.to_string());
        self.events.push_back(SurfaceEvent::LoadStarted {
            address: address.to_string(),
        });
    }

    fn unsupported(&self, operation: &'static str) -> BridgeError {
        log::warn!("{} is unavailable for embedded frames", operation);
        BridgeError::Unsupported {
            surface: SurfaceKind::Frame.name(),
            operation,
        }
    }
}

impl ContentSurface for FrameSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Frame
    }

    fn load(&mut self, destination: &Destination) -> Result<()> {
        self.set_src(destination.as_str());
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let src = self.src.clone().ok_or(BridgeError::NotMounted)?;
        self.set_src(&src);
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        Err(self.unsupported("go_back"))
    }

    fn go_forward(&mut self) -> Result<()> {
        Err(self.unsupported("go_forward"))
    }

    fn post_message(&mut self, message: &BridgeMessage, target: &TrustedOrigin) -> Result<()> {
        if self.src.is_none() {
            return Err(BridgeError::NotMounted);
        }

        // Frame substrate delivers structured objects
        self.posted.push(PostedMessage {
            target_origin: target.as_str().to_string(),
            data: message.to_object()?,
        });
        Ok(())
    }

    fn invoke_fullscreen(&mut self, direction: FullscreenDirection, method: &str) -> Result<()> {
        if !self.fullscreen_methods.contains(method) {
            return Err(BridgeError::Unsupported {
                surface: SurfaceKind::Frame.name(),
                operation: "fullscreen",
            });
        }

        self.fullscreen_calls.push(method.to_string());
        self.fullscreen = direction == FullscreenDirection::Enter;
        Ok(())
    }

    fn supports_fullscreen_exit(&self) -> bool {
        FullscreenDirection::Exit
            .methods()
            .iter()
            .any(|m| self.fullscreen_methods.contains(*m))
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.drain(..).collect()
    }

    fn unload(&mut self) -> Result<()> {
        self.src = None;
        self.events.clear();
        self.posted.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded(address: &str) -> FrameSurface {
        let mut surface = FrameSurface::new("content");
        surface.load(&Destination::from_resolved(address)).unwrap();
        surface
    }

    #[test]
    fn test_load_sets_src_and_reports_start() {
        let mut surface = loaded("https://openai.com");
        assert_eq!(surface.src(), Some("https://openai.com"));
        assert_eq!(
            surface.poll_events(),
            vec![SurfaceEvent::LoadStarted {
                address: "https://openai.com".into()
            }]
        );
    }

    #[test]
    fn test_history_is_unsupported() {
        let mut surface = loaded("https://openai.com");
        assert!(matches!(surface.go_back(), Err(BridgeError::Unsupported { operation: "go_back", .. })));
        assert!(matches!(
            surface.go_forward(),
            Err(BridgeError::Unsupported { operation: "go_forward", .. })
        ));
    }

    #[test]
    fn test_posted_messages_are_objects() {
        let mut surface = loaded("https://app.example.com");
        let origin = TrustedOrigin::parse("https://app.example.com").unwrap();
        surface.post_message(&BridgeMessage::AuthRequest, &origin).unwrap();

        assert_eq!(
            surface.take_posted(),
            vec![PostedMessage {
                target_origin: "https://app.example.com".into(),
                data: json!({"type": "GOOGLE_AUTH_REQUEST"}),
            }]
        );
        assert!(surface.take_posted().is_empty());
    }

    #[test]
    fn test_post_without_content_fails() {
        let mut surface = FrameSurface::new("content");
        let origin = TrustedOrigin::parse("https://app.example.com").unwrap();
        assert!(matches!(
            surface.post_message(&BridgeMessage::AuthRequest, &origin),
            Err(BridgeError::NotMounted)
        ));
    }

    #[test]
    fn test_markup_escapes_attributes() {
        let surface = loaded("https://example.com/?a=\"b\"&c=<d>");
        let markup = surface.markup();
        assert!(markup.contains("id=\"content\""));
        assert!(!markup.contains("\"b\""));
        assert!(markup.contains("allowfullscreen"));
    }

    #[test]
    fn test_fullscreen_only_for_known_methods() {
        let mut surface = loaded("https://openai.com").with_fullscreen_methods(["webkitRequestFullscreen"]);
        assert!(surface.invoke_fullscreen(FullscreenDirection::Enter, "requestFullscreen").is_err());
        assert!(surface
            .invoke_fullscreen(FullscreenDirection::Enter, "webkitRequestFullscreen")
            .is_ok());
        assert!(surface.is_fullscreen());
        assert_eq!(surface.take_fullscreen_calls(), vec!["webkitRequestFullscreen".to_string()]);
        assert!(!surface.supports_fullscreen_exit());
    }

    #[test]
    fn test_report_loaded_emits_navigation() {
        let mut surface = loaded("https://openai.com");
        surface.poll_events();
        surface.report_loaded();
        assert_eq!(
            surface.poll_events(),
            vec![
                SurfaceEvent::LoadFinished {
                    address: "https://openai.com".into()
                },
                SurfaceEvent::NavigationChanged(NavigationState::new("https://openai.com")),
            ]
        );
    }
}
