use crate::error::{BridgeError, Result};
use std::fmt;
use url::Url;

/// The single origin bridge messages are accepted from and delivered to.
///
/// Always a concrete `scheme://host[:port]` origin, never a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustedOrigin(String);

impl TrustedOrigin {
    /// Parse and serialize an origin such as `https://app.example.com`
    pub fn parse(origin: &str) -> Result<Self> {
        let trimmed = origin.trim();
        let invalid = |reason: &str| BridgeError::InvalidOrigin {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        if trimmed == "*" || trimmed.eq_ignore_ascii_case("null") {
            return Err(invalid("wildcard and opaque origins are never trusted"));
        }

        let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("only http and https origins can be trusted"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("an origin has no path, query or fragment"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("an origin has no credentials"));
        }

        let serialized = url.origin().ascii_serialization();
        if serialized == "null" {
            return Err(invalid("origin is opaque"));
        }

        Ok(Self(serialized))
    }

    /// Serialized origin
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact comparison against an origin reported by a content surface
    pub fn matches(&self, origin: &str) -> bool {
        self.0 == origin
    }
}

impl fmt::Display for TrustedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
