//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System instruction for every itinerary session
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Structured single-activity replacement prompt
pub const REPLACE: &str = include_str!("../../prompts/replace.pmt");

/// System instruction for the stateless replacement call
pub const REPLACE_SYSTEM: &str = include_str!("../../prompts/replace_system.pmt");

/// Free-text chat message asking for an alternative activity
pub const ALTERNATIVE: &str = include_str!("../../prompts/alternative.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "replace" => Some(REPLACE),
        "replace_system" => Some(REPLACE_SYSTEM),
        "alternative" => Some(ALTERNATIVE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
