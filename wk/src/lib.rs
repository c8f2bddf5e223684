//! Weekender - Conversational Weekend Itinerary Planner
//!
//! Drives a completion service to produce structured weekend itineraries,
//! repairs and validates what comes back, merges partial follow-up answers
//! into the current plan, and swaps single activities with recalculated
//! travel and cost.
//!
//! # Modules
//!
//! - [`domain`] - Preferences, itineraries, partial updates and saved plans
//! - [`llm`] - Completion client trait, Gemini implementation, retry policy
//! - [`sanitize`] - Model output repair and citation stripping
//! - [`session`] - Session state machine over the message history
//! - [`merge`] - Partial-update merge engine
//! - [`replace`] - Single-activity replacement flow
//! - [`planner`] - Interaction-level operations
//! - [`store`] - Saved-plan persistence boundary
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod cost;
pub mod display;
pub mod domain;
pub mod error;
pub mod llm;
pub mod merge;
pub mod planner;
pub mod prompts;
pub mod replace;
pub mod repl;
pub mod sanitize;
pub mod schema;
pub mod session;
pub mod store;

pub use error::PlannerError;
pub use planner::Planner;
