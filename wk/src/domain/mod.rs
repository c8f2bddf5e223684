//! Domain types for weekend plans

mod itinerary;
mod preferences;
mod saved;

pub use itinerary::{
    Activity, BookingPartner, Category, DayPlan, DayUpdate, GroundingSource, Itinerary, ItineraryUpdate, Location,
    TravelInfo,
};
pub use preferences::{DateRange, HomeLocation, Preferences};
pub use saved::{SavedPlan, normalize_email};

#[cfg(test)]
pub(crate) use itinerary::fixtures;
