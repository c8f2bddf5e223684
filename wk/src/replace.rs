//! Activity replacement flow
//!
//! Replaces exactly one activity with a model-proposed alternative through a
//! narrow, schema-constrained call. Only the target activity, the plan's total
//! cost and the following activity's travel leg can change.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{Activity, DayPlan, Itinerary, Preferences, TravelInfo};
use crate::error::PlannerError;
use crate::llm::{CompletionRequest, LlmClient, Message, RetryPolicy};
use crate::prompts::{PromptBuilder, ReplaceContext};
use crate::sanitize;
use crate::schema;
use crate::session::GenerationSettings;

/// The model's answer to a replacement request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub replacement_activity: Activity,
    pub updated_total_cost: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_activity_travel_info: Option<TravelInfo>,
}

/// Paths of mandatory fields missing from a raw replacement answer
///
/// Checked on the raw tree so that every gap is reported, not just the first
/// one typed deserialization trips over.
pub fn missing_fields(value: &Value) -> Vec<String> {
    let Some(activity) = value.get("replacementActivity").filter(|a| a.is_object()) else {
        return vec!["replacementActivity".to_string()];
    };

    let text = |v: Option<&Value>| v.and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty());
    let mut missing = Vec::new();

    for field in ["time", "title", "description"] {
        if !text(activity.get(field)) {
            missing.push(field.to_string());
        }
    }

    let address = match activity.get("location") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(location) => text(location.get("address")),
        None => false,
    };
    if !address {
        missing.push("location.address".to_string());
    }

    for field in ["category", "estimatedCost"] {
        if !text(activity.get(field)) {
            missing.push(field.to_string());
        }
    }

    if !activity.get("isSpecialEvent").is_some_and(Value::is_boolean) {
        missing.push("isSpecialEvent".to_string());
    }

    let travel = activity.get("travelInfo");
    for field in ["mode", "duration"] {
        if !text(travel.and_then(|t| t.get(field))) {
            missing.push(format!("travelInfo.{}", field));
        }
    }

    if !text(value.get("updatedTotalCost")) {
        missing.push("updatedTotalCost".to_string());
    }

    missing
}

/// Validate and read a sanitized replacement answer
pub fn parse_replacement(value: Value) -> Result<Replacement, PlannerError> {
    let missing = missing_fields(&value);
    if !missing.is_empty() {
        warn!(?missing, "parse_replacement: incomplete replacement");
        return Err(PlannerError::IncompleteReplacement(missing));
    }
    serde_json::from_value(value).map_err(|e| PlannerError::IncompleteReplacement(vec![e.to_string()]))
}

/// Apply a replacement to a copy of `plan`
///
/// Replaces `itinerary[day_index].activities[activity_index]`, updates the
/// total cost, and overwrites the next activity's travel leg when one was
/// returned and a next activity exists. Nothing else changes.
pub fn apply_replacement(
    plan: &Itinerary,
    day_index: usize,
    activity_index: usize,
    replacement: &Replacement,
) -> Result<Itinerary, PlannerError> {
    debug!(%day_index, %activity_index, "apply_replacement: called");
    let mut updated = plan.clone();
    let day = updated
        .itinerary
        .get_mut(day_index)
        .ok_or_else(|| PlannerError::InvalidEdit(format!("no day at index {}", day_index)))?;
    let slot = day.activities.get_mut(activity_index).ok_or_else(|| {
        PlannerError::InvalidEdit(format!("no activity at index {} on day {}", activity_index, day_index))
    })?;
    *slot = replacement.replacement_activity.clone();

    if let Some(travel) = &replacement.next_activity_travel_info {
        match day.activities.get_mut(activity_index + 1) {
            Some(next) => next.travel_info = Some(travel.clone()),
            None => debug!("apply_replacement: no next activity, ignoring travel info"),
        }
    }

    updated.total_estimated_cost = replacement.updated_total_cost.clone();
    Ok(updated)
}

/// Inputs to a structured replacement call
#[derive(Debug, Clone, Copy)]
pub struct ReplacementRequest<'a> {
    pub preferences: &'a Preferences,
    pub day: &'a DayPlan,
    pub activity_index: usize,
    /// Free-text description of what the user wants instead
    pub preference: &'a str,
    pub current_total: &'a str,
}

/// Issues schema-constrained replacement calls
pub struct ReplacementFlow {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    prompts: Arc<PromptBuilder>,
    settings: GenerationSettings,
}

impl ReplacementFlow {
    pub fn new(
        client: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        prompts: Arc<PromptBuilder>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            client,
            retry,
            prompts,
            settings,
        }
    }

    /// Ask the model for a replacement of `request.day.activities[request.activity_index]`
    ///
    /// Web search is disabled on this path; the response schema is sent as a hint.
    pub async fn request(&self, request: ReplacementRequest<'_>) -> Result<Replacement, PlannerError> {
        debug!(day = %request.day.day, index = request.activity_index, "ReplacementFlow::request: called");
        let ctx = ReplaceContext::new(
            request.preferences,
            request.day,
            request.activity_index,
            request.preference,
            request.current_total,
        )
        .ok_or_else(|| {
            PlannerError::InvalidEdit(format!(
                "no activity at index {} on {}",
                request.activity_index, request.day.day
            ))
        })?;
        let system_prompt = self.prompts.replacement_system()?;
        let prompt = self.prompts.replacement_prompt(&ctx)?;

        let completion = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(prompt)],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            response_schema: Some(schema::replacement_schema()),
            web_search: false,
        };

        let response = self.retry.run(|| self.client.complete(completion.clone())).await?;
        let text = match response.content {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                let reason = response.finish_reason;
                return Err(PlannerError::EmptyResponse {
                    finish_reason: (!reason.is_stop()).then_some(reason),
                });
            }
        };

        let replacement = parse_replacement(sanitize::sanitize(&text)?)?;
        info!(
            title = %replacement.replacement_activity.title,
            total = %replacement.updated_total_cost,
            "Received replacement activity"
        );
        Ok(replacement)
    }
}
