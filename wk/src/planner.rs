//! Planner
//!
//! Interaction-level operations: generate a plan, chat about it, and swap
//! single activities. Every operation returns a new itinerary value; the
//! caller's current one is never modified, so a failure leaves it intact.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::cost;
use crate::domain::{Itinerary, Preferences, SavedPlan};
use crate::error::PlannerError;
use crate::llm::{self, LlmClient, Message, RetryPolicy};
use crate::merge::merge;
use crate::prompts::{AlternativeContext, PromptBuilder};
use crate::replace::{ReplacementFlow, ReplacementRequest, apply_replacement};
use crate::session::{GenerationSettings, ItinerarySession, SessionManager};

/// Entry point for planning interactions
pub struct Planner {
    sessions: SessionManager,
    replacements: ReplacementFlow,
    prompts: Arc<PromptBuilder>,
}

impl Planner {
    pub fn new(
        client: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        prompts: PromptBuilder,
        settings: GenerationSettings,
    ) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            sessions: SessionManager::new(client.clone(), retry, prompts.clone(), settings),
            replacements: ReplacementFlow::new(client, retry, prompts.clone(), settings),
            prompts,
        }
    }

    /// Build a planner with the configured provider, retry policy and prompts
    pub fn from_config(config: &Config) -> Result<Self, PlannerError> {
        debug!(provider = %config.llm.provider, "Planner::from_config: called");
        let client = llm::create_client(&config.llm).map_err(PlannerError::Llm)?;
        Ok(Self::new(
            client,
            config.retry.policy(),
            PromptBuilder::new(config.prompts.dir.clone()),
            config.generation_settings(),
        ))
    }

    /// Generate an initial itinerary and open a session on it
    pub async fn generate(&self, preferences: &Preferences) -> Result<(ItinerarySession, Itinerary), PlannerError> {
        debug!("Planner::generate: called");
        let (session, itinerary) = self.sessions.start_session(preferences).await?;
        check_budget(&itinerary);
        Ok((session, itinerary))
    }

    /// Reopen a session on an existing itinerary
    pub fn resume(&self, plan: &Itinerary, history: Option<Vec<Message>>) -> Result<ItinerarySession, PlannerError> {
        self.sessions.resume_session(plan, history)
    }

    /// Reopen a session on a persisted plan
    pub fn resume_saved(&self, saved: &SavedPlan, history: Option<Vec<Message>>) -> Result<ItinerarySession, PlannerError> {
        self.sessions.resume_saved(saved, history)
    }

    /// Send a chat message and merge the answer into `current`
    pub async fn send_message(
        &self,
        session: &mut ItinerarySession,
        current: &Itinerary,
        message: &str,
    ) -> Result<Itinerary, PlannerError> {
        debug!(message_len = message.len(), "Planner::send_message: called");
        let preferences = current.preferences.clone();
        let update = self.sessions.continue_session(session, message, &preferences).await?;
        let merged = merge(current, &update);
        check_budget(&merged);
        Ok(merged)
    }

    /// Replace one activity through the structured replacement call
    pub async fn replace_activity(
        &self,
        current: &Itinerary,
        day_index: usize,
        activity_index: usize,
        preference: &str,
    ) -> Result<Itinerary, PlannerError> {
        debug!(%day_index, %activity_index, "Planner::replace_activity: called");
        let day = current
            .itinerary
            .get(day_index)
            .ok_or_else(|| PlannerError::InvalidEdit(format!("no day at index {}", day_index)))?;

        let replacement = self
            .replacements
            .request(ReplacementRequest {
                preferences: &current.preferences,
                day,
                activity_index,
                preference,
                current_total: &current.total_estimated_cost,
            })
            .await?;

        let updated = apply_replacement(current, day_index, activity_index, &replacement)?;
        info!(day = %day.day, %activity_index, "Replaced activity");
        Ok(updated)
    }

    /// Replace one activity by asking for it in the chat
    ///
    /// The model regenerates the itinerary and the merge engine reconciles it,
    /// so locality depends on the model honoring the editing policy.
    pub async fn replace_activity_via_chat(
        &self,
        session: &mut ItinerarySession,
        current: &Itinerary,
        day_index: usize,
        activity_index: usize,
        preference: &str,
    ) -> Result<Itinerary, PlannerError> {
        debug!(%day_index, %activity_index, "Planner::replace_activity_via_chat: called");
        let ctx = current
            .itinerary
            .get(day_index)
            .and_then(|day| AlternativeContext::new(day, activity_index, preference))
            .ok_or_else(|| {
                PlannerError::InvalidEdit(format!("no activity at day {} index {}", day_index, activity_index))
            })?;
        let message = self.prompts.alternative_message(&ctx)?;
        self.send_message(session, current, &message).await
    }
}

/// Warn when the model's total falls outside the requested budget
fn check_budget(itinerary: &Itinerary) {
    match cost::within_budget(&itinerary.total_estimated_cost, &itinerary.preferences.budget) {
        Some(false) => warn!(
            total = %itinerary.total_estimated_cost,
            budget = %itinerary.preferences.budget,
            "check_budget: total outside requested budget"
        ),
        Some(true) => debug!("check_budget: total within budget"),
        None => debug!("check_budget: no comparable amounts"),
    }
}
