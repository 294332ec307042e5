use crate::error::{BridgeError, Result};
use crate::navigation::normalize::{Destination, Normalizer};

/// Decode a percent-encoded startup address and normalize it.
///
/// Returns `Ok(None)` when the decoded address is blank.
pub fn decode_deep_link(encoded: &str, normalizer: &Normalizer) -> Result<Option<Destination>> {
    let decoded = urlencoding::decode(encoded.trim())
        .map_err(|e| BridgeError::InvalidDeepLink(format!("'{}' is not valid UTF-8 once decoded: {}", encoded, e)))?;

    Ok(normalizer.normalize(&decoded))
}
