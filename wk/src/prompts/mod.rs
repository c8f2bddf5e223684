//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for itinerary generation,
//! follow-up edits and single-activity replacement.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (configured override directory)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax with HTML escaping disabled.

pub mod embedded;
mod loader;

pub use loader::{AlternativeContext, PromptBuilder, ReplaceContext, SystemContext};

/// The opening user turn of a fresh session
pub const INITIAL_REQUEST: &str = "Please generate the initial itinerary based on my preferences.";
