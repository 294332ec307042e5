use serde::{Deserialize, Serialize};
use std::fmt;

/// Default host of the search engine used for free-text queries
pub const DEFAULT_SEARCH_HOST: &str = "www.google.com";

/// A fully resolved address to load: either a search query URL or a string
/// carrying a `scheme://` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    /// Wrap an address that is already known to be resolved.
    ///
    /// Used for addresses reported back by a content engine; user input
    /// goes through [`normalize`] instead.
    pub fn from_resolved(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying address
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Search engine that free-text input is sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngine {
    host: String,
}

impl SearchEngine {
    /// Create a search engine for the given host, e.g. `www.google.com`
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let host = host
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        Self { host }
    }

    /// Host queries are sent to, without scheme
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the query URL for an already trimmed query
    pub fn query_url(&self, query: &str) -> String {
        format!("https://{}/search?q={}", self.host, urlencoding::encode(query))
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_HOST)
    }
}

/// Turns user input into destinations against a fixed search engine
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    engine: SearchEngine,
}

impl Normalizer {
    /// Create a normalizer that searches with `engine`
    pub fn new(engine: SearchEngine) -> Self {
        Self { engine }
    }

    /// Get the search engine
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Normalize free-text input.
    ///
    /// Returns `None` when the input is blank; callers must not navigate in
    /// that case.
    pub fn normalize(&self, input: &str) -> Option<Destination> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if is_search_query(trimmed) {
            return Some(Destination(self.engine.query_url(trimmed)));
        }

        Some(Destination(qualify_address(trimmed)))
    }
}

/// Normalize input against the default search engine
pub fn normalize(input: &str) -> Option<Destination> {
    Normalizer::default().normalize(input)
}

// No dot, or a space with more than one token. "a.b c" is a search.
fn is_search_query(trimmed: &str) -> bool {
    !trimmed.contains('.') || (trimmed.contains(' ') && trimmed.split_whitespace().count() > 1)
}

fn qualify_address(trimmed: &str) -> String {
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);

    if rest.contains("://") {
        rest.to_string()
    } else {
        format!("https://{}", rest)
    }
}
