//! Session management
//!
//! A session is one conversation with the completion service anchored to one
//! itinerary. The service is stateless, so the session owns the full message
//! history and replays it on every call. Sessions are owned by the interaction
//! that created them (`&mut` access only); there is no shared registry.
//!
//! State machine:
//!
//! ```text
//! Created -> AwaitingModel -> Ready -> AwaitingModel -> Ready ...
//!                  \-> Failed -> AwaitingModel (resubmission)
//! ```
//!
//! On failure the pending user message is removed so resubmitting starts from
//! the last good exchange.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{GroundingSource, Itinerary, ItineraryUpdate, Preferences, SavedPlan};
use crate::error::PlannerError;
use crate::llm::{CompletionRequest, LlmClient, Message, RetryPolicy};
use crate::prompts::{INITIAL_REQUEST, PromptBuilder};
use crate::sanitize;

/// Default max output tokens per call
pub const DEFAULT_MAX_TOKENS: u32 = 16384;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Created,
    AwaitingModel,
    Ready,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::AwaitingModel => write!(f, "awaiting-model"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Model call settings shared by every session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub web_search: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            web_search: true,
        }
    }
}

/// A stateful conversation anchored to one itinerary
#[derive(Debug, Clone)]
pub struct ItinerarySession {
    state: SessionState,
    system_prompt: String,
    preferences: Preferences,
    history: Vec<Message>,
}

impl ItinerarySession {
    fn new(system_prompt: String, preferences: Preferences, history: Vec<Message>) -> Self {
        Self {
            state: SessionState::Created,
            system_prompt,
            preferences,
            history,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Message history, oldest first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Snapshot of the history for carrying across a process boundary
    pub fn snapshot(&self) -> Vec<Message> {
        self.history.clone()
    }

    /// Recover a session whose model call was dropped before completing
    ///
    /// Removes the pending user message and marks the session failed so it
    /// can be resubmitted. No-op in any other state.
    pub fn abandon_pending(&mut self) {
        if self.state == SessionState::AwaitingModel {
            warn!("ItinerarySession::abandon_pending: discarding pending message");
            self.rollback();
        }
    }

    fn begin(&mut self, message: String) -> Result<(), PlannerError> {
        if self.state == SessionState::AwaitingModel {
            debug!("ItinerarySession::begin: call already pending");
            return Err(PlannerError::SessionBusy);
        }
        self.history.push(Message::user(message));
        self.state = SessionState::AwaitingModel;
        Ok(())
    }

    fn commit(&mut self, reply: String) {
        self.history.push(Message::model(reply));
        self.state = SessionState::Ready;
    }

    fn rollback(&mut self) {
        if matches!(self.history.last(), Some(m) if m.role == crate::llm::Role::User) {
            self.history.pop();
        }
        self.state = SessionState::Failed;
    }
}

/// One sanitized model reply
struct Reply {
    text: String,
    value: Value,
    sources: Vec<GroundingSource>,
}

/// Starts, resumes and continues itinerary sessions
pub struct SessionManager {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    prompts: Arc<PromptBuilder>,
    settings: GenerationSettings,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        prompts: Arc<PromptBuilder>,
        settings: GenerationSettings,
    ) -> Self {
        debug!(?retry, ?settings, "SessionManager::new: called");
        Self {
            client,
            retry,
            prompts,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Open a session and generate the initial itinerary
    ///
    /// Fails with `IncompleteItinerary` unless every day has activities and
    /// every activity carries all mandatory fields including its travel leg.
    pub async fn start_session(&self, preferences: &Preferences) -> Result<(ItinerarySession, Itinerary), PlannerError> {
        debug!(budget = %preferences.budget, "start_session: called");
        let system_prompt = self.prompts.system_instruction(preferences)?;
        let mut session = ItinerarySession::new(system_prompt, preferences.clone(), Vec::new());

        let itinerary = self
            .exchange(&mut session, INITIAL_REQUEST.to_string(), |reply, prefs| {
                let flags = special_event_problems(&reply.value);
                if !flags.is_empty() {
                    warn!(count = flags.len(), "start_session: activities without a special-event flag");
                    return Err(PlannerError::IncompleteItinerary(flags));
                }
                let itinerary = itinerary_from_reply(reply, prefs)?;
                let problems = itinerary.generation_problems();
                if !problems.is_empty() {
                    warn!(count = problems.len(), "start_session: incomplete itinerary");
                    return Err(PlannerError::IncompleteItinerary(problems));
                }
                Ok(itinerary)
            })
            .await?;

        info!(
            title = %itinerary.title,
            days = itinerary.itinerary.len(),
            activities = itinerary.activity_count(),
            "Generated initial itinerary"
        );
        Ok((session, itinerary))
    }

    /// Rebuild a session around an existing itinerary
    ///
    /// With no prior history the session is seeded with a single model turn
    /// holding the serialized itinerary.
    pub fn resume_session(&self, plan: &Itinerary, prior_history: Option<Vec<Message>>) -> Result<ItinerarySession, PlannerError> {
        debug!(title = %plan.title, has_history = prior_history.is_some(), "resume_session: called");
        let system_prompt = self.prompts.system_instruction(&plan.preferences)?;
        let history = match prior_history {
            Some(history) => history,
            None => {
                let seed = serde_json::to_string(plan).map_err(|e| PlannerError::InvalidEdit(e.to_string()))?;
                vec![Message::model(seed)]
            }
        };
        let mut session = ItinerarySession::new(system_prompt, plan.preferences.clone(), history);
        session.state = SessionState::Ready;
        Ok(session)
    }

    /// Resume from a persisted plan
    pub fn resume_saved(&self, saved: &SavedPlan, prior_history: Option<Vec<Message>>) -> Result<ItinerarySession, PlannerError> {
        debug!(id = %saved.id, "resume_saved: called");
        self.resume_session(&saved.plan, prior_history)
    }

    /// Send a follow-up message and return the (possibly partial) update
    ///
    /// Preferences are re-attached to the fragment; sources come from the
    /// response's grounding metadata.
    pub async fn continue_session(
        &self,
        session: &mut ItinerarySession,
        message: &str,
        preferences: &Preferences,
    ) -> Result<ItineraryUpdate, PlannerError> {
        debug!(message_len = message.len(), state = %session.state, "continue_session: called");
        let update = self
            .exchange(session, message.to_string(), |reply, _| update_from_reply(reply, preferences))
            .await?;
        info!(days = update.itinerary.len(), "Received itinerary update");
        Ok(update)
    }

    /// Push `message`, call the model, and commit or roll back
    async fn exchange<T, F>(&self, session: &mut ItinerarySession, message: String, parse: F) -> Result<T, PlannerError>
    where
        F: FnOnce(Reply, &Preferences) -> Result<T, PlannerError>,
    {
        session.begin(message)?;

        let result = match self.call(session).await {
            Ok(reply) => {
                let text = reply.text.clone();
                parse(reply, &session.preferences).map(|value| (text, value))
            }
            Err(e) => Err(e),
        };

        match result {
            Ok((text, value)) => {
                session.commit(text);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "exchange: model turn failed, rolling back");
                session.rollback();
                Err(e)
            }
        }
    }

    /// One model call over the session's history, with retry on overload
    async fn call(&self, session: &ItinerarySession) -> Result<Reply, PlannerError> {
        let request = CompletionRequest {
            system_prompt: session.system_prompt.clone(),
            messages: session.history.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            response_schema: None,
            web_search: self.settings.web_search,
        };
        debug!(messages = request.messages.len(), "call: sending request");

        let response = self.retry.run(|| self.client.complete(request.clone())).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            finish_reason = %response.finish_reason,
            "call: response received"
        );

        let text = match response.content {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                let reason = response.finish_reason;
                warn!(finish_reason = %reason, "call: empty response");
                return Err(PlannerError::EmptyResponse {
                    finish_reason: (!reason.is_stop()).then_some(reason),
                });
            }
        };

        let value = sanitize::sanitize(&text)?;
        let sources = response.sources.into_iter().filter(|s| !s.uri.trim().is_empty()).collect();
        Ok(Reply { text, value, sources })
    }
}

/// Activities in a raw reply whose `isSpecialEvent` flag is absent or not a boolean
///
/// Checked before deserialization, which would default the flag to false.
fn special_event_problems(value: &Value) -> Vec<String> {
    let mut problems = Vec::new();
    let days = value.get("itinerary").and_then(Value::as_array).into_iter().flatten();
    for (d, day) in days.enumerate() {
        let activities = day.get("activities").and_then(Value::as_array).into_iter().flatten();
        for (a, activity) in activities.enumerate() {
            if !activity.get("isSpecialEvent").is_some_and(Value::is_boolean) {
                problems.push(format!("itinerary[{}].activities[{}].isSpecialEvent", d, a));
            }
        }
    }
    problems
}

/// Attach preferences and grounding sources, then read a full itinerary
fn itinerary_from_reply(reply: Reply, preferences: &Preferences) -> Result<Itinerary, PlannerError> {
    let mut itinerary: Itinerary =
        serde_json::from_value(reply.value).map_err(|e| PlannerError::IncompleteItinerary(vec![e.to_string()]))?;
    itinerary.preferences = preferences.clone();
    itinerary.sources = reply.sources;
    Ok(itinerary)
}

/// Read a partial update; any activity present must be complete
fn update_from_reply(reply: Reply, preferences: &Preferences) -> Result<ItineraryUpdate, PlannerError> {
    let mut update: ItineraryUpdate =
        serde_json::from_value(reply.value).map_err(|e| PlannerError::IncompleteItinerary(vec![e.to_string()]))?;

    let mut problems = Vec::new();
    for (d, day) in update.itinerary.iter().enumerate() {
        for (a, activity) in day.activities.iter().flatten().enumerate() {
            for field in activity.missing_fields(false) {
                problems.push(format!("itinerary[{}].activities[{}].{}", d, a, field));
            }
        }
    }
    if !problems.is_empty() {
        return Err(PlannerError::IncompleteItinerary(problems));
    }

    update.preferences = Some(preferences.clone());
    update.sources = reply.sources;
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, FinishReason, LlmError, Role};
    use serde_json::json;
    use std::time::Duration;

    fn manager(client: Arc<MockLlmClient>) -> SessionManager {
        SessionManager::new(
            client,
            RetryPolicy::new(3, Duration::from_millis(1)),
            Arc::new(PromptBuilder::embedded_only()),
            GenerationSettings::default(),
        )
    }

    fn itinerary_json() -> String {
        let mut value = serde_json::to_value(fixtures::itinerary()).unwrap();
        value.as_object_mut().unwrap().remove("preferences");
        value.to_string()
    }

    #[tokio::test]
    async fn test_start_session_success() {
        let text = format!("```json\n{}\n```", itinerary_json());
        let client = Arc::new(MockLlmClient::new(vec![Ok(CompletionResponse {
            sources: vec![
                GroundingSource {
                    uri: "https://example.com/events".to_string(),
                    title: "Events".to_string(),
                },
                GroundingSource {
                    uri: String::new(),
                    title: "empty".to_string(),
                },
            ],
            ..CompletionResponse::text(text)
        })]));
        let manager = manager(client.clone());
        let prefs = fixtures::preferences();

        let (session, itinerary) = manager.start_session(&prefs).await.unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(itinerary.itinerary.len(), 3);
        assert_eq!(itinerary.preferences, prefs);
        assert_eq!(itinerary.sources.len(), 1);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].text, INITIAL_REQUEST);
        assert_eq!(session.history()[1].role, Role::Model);

        let request = &client.requests()[0];
        assert!(request.web_search);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(request.system_prompt.contains("Gurugram"));
    }

    #[tokio::test]
    async fn test_start_session_rejects_missing_travel_info() {
        let mut itinerary = fixtures::itinerary();
        itinerary.itinerary[1].activities[2].travel_info = None;
        let text = serde_json::to_string(&itinerary).unwrap();

        let client = Arc::new(MockLlmClient::with_texts(&[&text]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();

        match err {
            PlannerError::IncompleteItinerary(problems) => {
                assert_eq!(problems, vec!["itinerary[1].activities[2].travelInfo".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_start_session_rejects_missing_time() {
        let mut value = serde_json::to_value(fixtures::itinerary()).unwrap();
        value["itinerary"][0]["activities"][0].as_object_mut().unwrap().remove("time");

        let client = Arc::new(MockLlmClient::with_texts(&[&value.to_string()]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();
        assert!(matches!(err, PlannerError::IncompleteItinerary(_)));
    }

    #[tokio::test]
    async fn test_start_session_rejects_missing_total_cost() {
        let mut value = serde_json::to_value(fixtures::itinerary()).unwrap();
        value.as_object_mut().unwrap().remove("totalEstimatedCost");

        let client = Arc::new(MockLlmClient::with_texts(&[&value.to_string()]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();
        match err {
            PlannerError::IncompleteItinerary(problems) => {
                assert_eq!(problems, vec!["totalEstimatedCost".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_start_session_rejects_missing_special_event_flag() {
        let mut value = serde_json::to_value(fixtures::itinerary()).unwrap();
        value["itinerary"][2]["activities"][0]
            .as_object_mut()
            .unwrap()
            .remove("isSpecialEvent");
        value["itinerary"][0]["activities"][1]["isSpecialEvent"] = json!("yes");

        let client = Arc::new(MockLlmClient::with_texts(&[&value.to_string()]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();
        match err {
            PlannerError::IncompleteItinerary(problems) => {
                assert_eq!(
                    problems,
                    vec![
                        "itinerary[0].activities[1].isSpecialEvent".to_string(),
                        "itinerary[2].activities[0].isSpecialEvent".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_response_carries_finish_reason() {
        let client = Arc::new(MockLlmClient::new(vec![Ok(CompletionResponse {
            content: None,
            finish_reason: FinishReason::Safety,
            ..CompletionResponse::text("")
        })]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();
        match err {
            PlannerError::EmptyResponse { finish_reason } => assert_eq!(finish_reason, Some(FinishReason::Safety)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_prose_only_is_malformed() {
        let client = Arc::new(MockLlmClient::with_texts(&["Sorry, I cannot help with that."]));
        let err = manager(client).start_session(&fixtures::preferences()).await.unwrap_err();
        assert!(matches!(err, PlannerError::MalformedJson(_)));
    }

    #[tokio::test]
    async fn test_overload_exhausts_retries() {
        let client = Arc::new(MockLlmClient::always(|| Err(LlmError::Overloaded("busy".to_string()))));
        let err = manager(client.clone())
            .start_session(&fixtures::preferences())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::TransientOverload(_)));
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_resume_seeds_model_turn() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let plan = fixtures::itinerary();
        let session = manager(client).resume_session(&plan, None).unwrap();

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::Model);
        let seeded: Itinerary = serde_json::from_str(&session.history()[0].text).unwrap();
        assert_eq!(seeded.title, plan.title);
    }

    #[tokio::test]
    async fn test_resume_with_prior_history() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let history = vec![Message::user("a"), Message::model("{}"), Message::user("b"), Message::model("{}")];
        let session = manager(client)
            .resume_session(&fixtures::itinerary(), Some(history.clone()))
            .unwrap();
        assert_eq!(session.snapshot(), history);
    }

    #[tokio::test]
    async fn test_continue_session_partial_update() {
        let client = Arc::new(MockLlmClient::with_texts(&[
            r#"{"itinerary": [{"theme": "Slow Evening"}], "totalEstimatedCost": "Approx. ₹6,000 [2]"}"#,
        ]));
        let manager = manager(client.clone());
        let prefs = fixtures::preferences();
        let mut session = manager.resume_session(&fixtures::itinerary(), None).unwrap();

        let update = manager
            .continue_session(&mut session, "Make Friday calmer", &prefs)
            .await
            .unwrap();

        assert_eq!(update.itinerary[0].theme.as_deref(), Some("Slow Evening"));
        assert!(update.itinerary[0].activities.is_none());
        assert_eq!(update.total_estimated_cost.as_deref(), Some("Approx. ₹6,000"));
        assert_eq!(update.preferences.as_ref(), Some(&prefs));
        assert_eq!(session.history().len(), 3);

        // the whole history is replayed
        let request = &client.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].text, "Make Friday calmer");
    }

    #[tokio::test]
    async fn test_failed_turn_rolls_back_and_allows_resubmission() {
        let client = Arc::new(MockLlmClient::with_texts(&["no json here", r#"{"title": "Calmer Weekend"}"#]));
        let manager = manager(client);
        let prefs = fixtures::preferences();
        let mut session = manager.resume_session(&fixtures::itinerary(), None).unwrap();

        let err = manager.continue_session(&mut session, "calmer", &prefs).await;
        assert!(err.is_err());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.history().len(), 1);

        let update = manager.continue_session(&mut session, "calmer", &prefs).await.unwrap();
        assert_eq!(update.title.as_deref(), Some("Calmer Weekend"));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_incomplete_activity_in_update_rejected() {
        let client = Arc::new(MockLlmClient::with_texts(&[
            r#"{"itinerary": [{"activities": [{"time": " ", "title": "X", "description": "d", "location": "Somewhere", "category": "Dining", "estimatedCost": "Free"}]}]}"#,
        ]));
        let manager = manager(client);
        let mut session = manager.resume_session(&fixtures::itinerary(), None).unwrap();
        let err = manager
            .continue_session(&mut session, "dinner", &fixtures::preferences())
            .await
            .unwrap_err();
        match err {
            PlannerError::IncompleteItinerary(problems) => {
                assert_eq!(problems, vec!["itinerary[0].activities[0].time".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_busy_session_and_abandon() {
        let mut session = ItinerarySession::new("sys".to_string(), fixtures::preferences(), vec![]);
        session.begin("first".to_string()).unwrap();
        assert!(matches!(session.begin("second".to_string()), Err(PlannerError::SessionBusy)));

        session.abandon_pending();
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.history().is_empty());
        assert!(session.begin("second".to_string()).is_ok());
    }
}
