//! User preferences that seed every model call

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Home base of the user, as resolved by the geocoding collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Inclusive date range of the weekend (ISO dates, e.g. "2025-09-12")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Planning preferences
///
/// Immutable once a session starts. The model is stateless between processes,
/// so these are re-supplied with every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub vibe: String,
    /// Budget range, e.g. "₹5,000 - ₹10,000"
    pub budget: String,
    pub interests: Vec<String>,
    pub group: String,
    pub location: HomeLocation,
    /// Travel radius, e.g. "Within 15 km"
    pub distance: String,
    pub pace: String,
    pub dietary_needs: Vec<String>,
    pub occasion: String,
    pub accommodation: Vec<String>,
    pub transportation: String,
    pub dates: DateRange,
}

impl Preferences {
    /// City that all suggestions are scoped to
    ///
    /// Takes the last-but-one comma-separated token of the home address
    /// ("Sector 29, Gurugram, India" -> "Gurugram"). Returns `None` when the
    /// address has fewer than two tokens.
    pub fn city(&self) -> Option<String> {
        debug!(address = %self.location.address, "Preferences::city: called");
        let parts: Vec<&str> = self
            .location
            .address
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            debug!("Preferences::city: single-token address, no city");
            return None;
        }
        Some(parts[parts.len() - 2].to_string())
    }
}
