//! Itinerary document types
//!
//! Field names follow the camelCase JSON contract the model is asked to emit,
//! which is also the persisted document shape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::preferences::Preferences;

/// Activity category tags the model may choose from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Dining,
    Entertainment,
    Relaxation,
    Activity,
    Nightlife,
    Shopping,
    Culture,
    #[serde(rename = "History & Heritage")]
    HistoryHeritage,
    #[serde(rename = "Nature & Parks")]
    NatureParks,
    #[serde(rename = "Special Event")]
    SpecialEvent,
    #[serde(rename = "Outdoor Activities")]
    OutdoorActivities,
    Travel,
    #[serde(rename = "Spa & Wellness")]
    SpaWellness,
    #[serde(rename = "Art & Culture")]
    ArtCulture,
    #[serde(rename = "Live Music")]
    LiveMusic,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Dining,
        Category::Entertainment,
        Category::Relaxation,
        Category::Activity,
        Category::Nightlife,
        Category::Shopping,
        Category::Culture,
        Category::HistoryHeritage,
        Category::NatureParks,
        Category::SpecialEvent,
        Category::OutdoorActivities,
        Category::Travel,
        Category::SpaWellness,
        Category::ArtCulture,
        Category::LiveMusic,
    ];

    /// Wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dining => "Dining",
            Category::Entertainment => "Entertainment",
            Category::Relaxation => "Relaxation",
            Category::Activity => "Activity",
            Category::Nightlife => "Nightlife",
            Category::Shopping => "Shopping",
            Category::Culture => "Culture",
            Category::HistoryHeritage => "History & Heritage",
            Category::NatureParks => "Nature & Parks",
            Category::SpecialEvent => "Special Event",
            Category::OutdoorActivities => "Outdoor Activities",
            Category::Travel => "Travel",
            Category::SpaWellness => "Spa & Wellness",
            Category::ArtCulture => "Art & Culture",
            Category::LiveMusic => "Live Music",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Suggested booking partner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingPartner {
    Zomato,
    BookMyShow,
    Internal,
}

/// Where an activity takes place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LocationRepr")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
}

/// Accepts both `"Some address"` and `{"name": .., "address": ..}`
#[derive(Deserialize)]
#[serde(untagged)]
enum LocationRepr {
    Address(String),
    Full {
        #[serde(default)]
        name: Option<String>,
        address: String,
    },
}

impl From<LocationRepr> for Location {
    fn from(repr: LocationRepr) -> Self {
        match repr {
            LocationRepr::Address(address) => Location { name: None, address },
            LocationRepr::Full { name, address } => Location { name, address },
        }
    }
}

/// Travel leg from the previous activity (or from home for the day's first one)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInfo {
    pub mode: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// A single scheduled event or place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub time: String,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub category: Category,
    pub estimated_cost: String,
    #[serde(default)]
    pub is_special_event: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_partner: Option<BookingPartner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_info: Option<TravelInfo>,
}

impl Activity {
    /// Paths of mandatory fields that are blank, relative to this activity
    ///
    /// `require_travel` additionally demands a travel leg, which generation
    /// always produces but merges may drop.
    pub fn missing_fields(&self, require_travel: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.time) {
            missing.push("time");
        }
        if blank(&self.title) {
            missing.push("title");
        }
        if blank(&self.description) {
            missing.push("description");
        }
        if blank(&self.location.address) {
            missing.push("location.address");
        }
        if blank(&self.estimated_cost) {
            missing.push("estimatedCost");
        }
        match &self.travel_info {
            Some(travel) => {
                if blank(&travel.mode) {
                    missing.push("travelInfo.mode");
                }
                if blank(&travel.duration) {
                    missing.push("travelInfo.duration");
                }
            }
            None if require_travel => missing.push("travelInfo"),
            None => {}
        }
        missing
    }
}

/// One day's themed, chronologically ordered activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Weekday and date, e.g. "Saturday, September 13, 2025"
    pub day: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A web reference the model grounded a suggestion on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

/// A full multi-day plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub title: String,
    #[serde(default)]
    pub total_estimated_cost: String,
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
}

impl Itinerary {
    /// Describe every way this itinerary falls short of a freshly generated one
    ///
    /// Empty result means: title and total cost are set, there is at least one
    /// day, every day has activities, and every activity carries all mandatory
    /// fields including its travel leg.
    pub fn generation_problems(&self) -> Vec<String> {
        debug!(days = self.itinerary.len(), "Itinerary::generation_problems: called");
        let mut problems = Vec::new();
        if self.title.trim().is_empty() {
            problems.push("title".to_string());
        }
        if self.total_estimated_cost.trim().is_empty() {
            problems.push("totalEstimatedCost".to_string());
        }
        if self.itinerary.is_empty() {
            problems.push("itinerary is empty".to_string());
        }
        for (d, day) in self.itinerary.iter().enumerate() {
            if day.day.trim().is_empty() {
                problems.push(format!("itinerary[{}].day", d));
            }
            if day.activities.is_empty() {
                problems.push(format!("itinerary[{}].activities is empty", d));
            }
            for (a, activity) in day.activities.iter().enumerate() {
                for field in activity.missing_fields(true) {
                    problems.push(format!("itinerary[{}].activities[{}].{}", d, a, field));
                }
            }
        }
        problems
    }

    /// Total number of activities across all days
    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.activities.len()).sum()
    }
}

/// Partial day returned by a follow-up turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
}

/// Possibly-partial itinerary fragment returned by a follow-up turn
///
/// The model is not guaranteed to echo fields it did not change, so every
/// field is optional. Activities that are present must still be complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_cost: Option<String>,
    #[serde(default)]
    pub itinerary: Vec<DayUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<GroundingSource>,
}

impl From<&Itinerary> for ItineraryUpdate {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            title: Some(itinerary.title.clone()),
            total_estimated_cost: Some(itinerary.total_estimated_cost.clone()),
            itinerary: itinerary
                .itinerary
                .iter()
                .map(|d| DayUpdate {
                    day: Some(d.day.clone()),
                    theme: Some(d.theme.clone()),
                    activities: Some(d.activities.clone()),
                })
                .collect(),
            preferences: Some(itinerary.preferences.clone()),
            sources: itinerary.sources.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_location_accepts_bare_string() {
        let loc: Location = serde_json::from_str(r#""MG Road, Bengaluru""#).unwrap();
        assert_eq!(loc.address, "MG Road, Bengaluru");
        assert!(loc.name.is_none());

        let loc: Location = serde_json::from_str(r#"{"name": "Toit", "address": "Indiranagar"}"#).unwrap();
        assert_eq!(loc.name.as_deref(), Some("Toit"));
    }

    #[test]
    fn test_category_wire_names() {
        for cat in Category::ALL {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.as_str()));
        }
        let c: Category = serde_json::from_str(r#""History & Heritage""#).unwrap();
        assert_eq!(c, Category::HistoryHeritage);
        assert!(serde_json::from_str::<Category>(r#""Karaoke""#).is_err());
    }

    #[test]
    fn test_activity_camel_case_roundtrip_shape() {
        let a = activity("Old Fort", "Home");
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["estimatedCost"], "Approx. ₹500");
        assert_eq!(value["isSpecialEvent"], false);
        assert_eq!(value["travelInfo"]["mode"], "Metro");
        assert!(value.get("bookingPartner").is_none());
    }

    #[test]
    fn test_missing_fields() {
        let mut a = activity("Old Fort", "Home");
        assert!(a.missing_fields(true).is_empty());

        a.time = " ".to_string();
        a.travel_info = None;
        assert_eq!(a.missing_fields(true), vec!["time", "travelInfo"]);
        assert_eq!(a.missing_fields(false), vec!["time"]);
    }

    #[test]
    fn test_generation_problems() {
        let it = itinerary();
        assert!(it.generation_problems().is_empty());
        assert_eq!(it.activity_count(), 6);

        let mut broken = it.clone();
        broken.itinerary[1].activities[2].travel_info = None;
        broken.itinerary[2].activities.clear();
        let problems = broken.generation_problems();
        assert!(problems.contains(&"itinerary[1].activities[2].travelInfo".to_string()));
        assert!(problems.contains(&"itinerary[2].activities is empty".to_string()));

        let mut no_total = it.clone();
        no_total.total_estimated_cost = "  ".to_string();
        assert_eq!(no_total.generation_problems(), vec!["totalEstimatedCost".to_string()]);

        let empty = Itinerary {
            itinerary: vec![],
            ..it
        };
        assert!(empty.generation_problems().contains(&"itinerary is empty".to_string()));
    }

    #[test]
    fn test_update_from_itinerary() {
        let it = itinerary();
        let update = ItineraryUpdate::from(&it);
        assert_eq!(update.title.as_deref(), Some("Gurugram Getaway"));
        assert_eq!(update.itinerary.len(), 3);
        assert_eq!(update.itinerary[1].activities.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_partial_update_deserializes() {
        let update: ItineraryUpdate =
            serde_json::from_str(r#"{"title": "New", "itinerary": [{"theme": "X"}]}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));
        assert_eq!(update.itinerary[0].theme.as_deref(), Some("X"));
        assert!(update.itinerary[0].activities.is_none());
        assert!(update.total_estimated_cost.is_none());
    }
}
