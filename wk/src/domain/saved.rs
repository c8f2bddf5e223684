//! Persisted itineraries

use chrono::{DateTime, Utc};
use planstore::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::itinerary::Itinerary;

/// Normalize an owner email the way the store indexes it
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An itinerary saved by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub plan: Itinerary,
}

impl SavedPlan {
    /// Wrap a fresh itinerary for the given owner
    pub fn new(user_email: &str, plan: Itinerary) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_email: normalize_email(user_email),
            created_at: now,
            updated_at: now,
            plan,
        }
    }

    /// Replace the itinerary content, keeping identity and owner
    pub fn with_plan(mut self, plan: Itinerary) -> Self {
        self.plan = plan;
        self.updated_at = Utc::now();
        self
    }
}

impl Record for SavedPlan {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at.timestamp_millis()
    }

    fn collection_name() -> &'static str {
        "plans"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("userEmail".to_string(), IndexValue::String(self.user_email.clone()));
        fields
    }
}
