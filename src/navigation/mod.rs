//! Turning user input into destinations
//!
//! - [`normalize`]: free text to a search query URL or a scheme-qualified address
//! - [`decode_deep_link`]: percent-encoded startup parameter to a destination

pub mod deep_link;
pub mod normalize;

pub use deep_link::decode_deep_link;
pub use normalize::{DEFAULT_SEARCH_HOST, Destination, Normalizer, SearchEngine, normalize};
