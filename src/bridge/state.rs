use crate::navigation::Destination;
use serde::{Deserialize, Serialize};

/// Lifecycle status of the embedded content surface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

impl LoadState {
    /// Whether a load is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// Whether the last load failed
    pub fn is_errored(&self) -> bool {
        matches!(self, LoadState::Errored(_))
    }

    /// Error message shown to the user, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Errored(message) => Some(message),
            _ => None,
        }
    }
}

/// Recovery offered to the user while a load is errored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Hand the destination to the platform (system browser)
    OpenExternally(Destination),
    /// Reload the same destination in place
    Retry,
}

/// History and address of the page currently shown by a surface
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationState {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub can_go_back: bool,

    #[serde(default)]
    pub can_go_forward: bool,
}

impl NavigationState {
    /// Navigation state for `url` with no title and no history
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Builder method: set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method: set history availability
    pub fn with_history(mut self, can_go_back: bool, can_go_forward: bool) -> Self {
        self.can_go_back = can_go_back;
        self.can_go_forward = can_go_forward;
        self
    }
}
