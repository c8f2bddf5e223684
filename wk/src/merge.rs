//! Itinerary merge engine
//!
//! Reconciles a possibly-partial update into the current itinerary. The model
//! does not reliably echo fields it did not change, so absent or empty
//! incoming values never overwrite existing ones.

use tracing::{debug, warn};

use crate::domain::{DayPlan, DayUpdate, Itinerary, ItineraryUpdate};

/// Merge `update` into a copy of `base`
///
/// - `title`, `totalEstimatedCost` and `sources` are replaced only when the
///   incoming value is present and non-empty.
/// - Days merge by position; incoming fields win where present.
/// - Days only in `base` are kept.
/// - Extra incoming days are appended when they carry a day label and
///   activities, and dropped otherwise.
///
/// Preferences are never taken from the update.
pub fn merge(base: &Itinerary, update: &ItineraryUpdate) -> Itinerary {
    debug!(base_days = base.itinerary.len(), update_days = update.itinerary.len(), "merge: called");
    let mut merged = base.clone();

    if let Some(title) = non_empty(&update.title) {
        merged.title = title.to_string();
    }
    if let Some(cost) = non_empty(&update.total_estimated_cost) {
        merged.total_estimated_cost = cost.to_string();
    }
    if !update.sources.is_empty() {
        merged.sources = update.sources.clone();
    }

    for (i, incoming) in update.itinerary.iter().enumerate() {
        match merged.itinerary.get_mut(i) {
            Some(day) => merge_day(day, incoming),
            None => match complete_day(incoming) {
                Some(day) => {
                    debug!(index = i, day = %day.day, "merge: appending extra day");
                    merged.itinerary.push(day);
                }
                None => warn!(index = i, "merge: dropping incomplete extra day"),
            },
        }
    }

    merged
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn merge_day(day: &mut DayPlan, incoming: &DayUpdate) {
    if let Some(label) = non_empty(&incoming.day) {
        day.day = label.to_string();
    }
    if let Some(theme) = non_empty(&incoming.theme) {
        day.theme = theme.to_string();
    }
    if let Some(activities) = &incoming.activities {
        day.activities = activities.clone();
    }
}

fn complete_day(incoming: &DayUpdate) -> Option<DayPlan> {
    let day = non_empty(&incoming.day)?;
    let activities = incoming.activities.as_ref().filter(|a| !a.is_empty())?;
    Some(DayPlan {
        day: day.to_string(),
        theme: incoming.theme.clone().unwrap_or_default(),
        activities: activities.clone(),
    })
}
