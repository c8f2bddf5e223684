//! Response schemas
//!
//! Static descriptions of the JSON the model must return. The itinerary schema
//! is embedded verbatim in the system prompt; the replacement schema is sent as
//! the request's response-schema hint. Both use the completion service's
//! OpenAPI-subset dialect (upper-case type names).

use serde_json::{Value, json};

use crate::domain::Category;

fn category_enum() -> Value {
    json!(Category::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>())
}

fn travel_info_schema(description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "description": description,
        "properties": {
            "mode": { "type": "STRING", "description": "Recommended mode of transport (e.g., 'Ride-Sharing', 'Metro', 'Walk')." },
            "duration": { "type": "STRING", "description": "Estimated travel time (e.g., 'Approx. 15 mins')." },
            "distance": { "type": "STRING", "description": "Estimated travel distance (e.g., 'Approx. 5 km').", "nullable": true },
            "from": { "type": "STRING", "description": "The starting point of the travel leg.", "nullable": true }
        },
        "required": ["mode", "duration"]
    })
}

/// Schema of a single activity
pub fn activity_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "time": { "type": "STRING", "description": "Suggested time (e.g., '8:00 PM', '11:00 AM - 1:00 PM'). Mandatory." },
            "title": { "type": "STRING", "description": "Name of the activity or place (e.g., 'Dinner at The Corner Bistro')." },
            "description": { "type": "STRING", "description": "A brief, appealing description of the activity." },
            "location": {
                "type": "OBJECT",
                "description": "Where the activity happens. Must contain at least an address.",
                "properties": {
                    "name": { "type": "STRING", "description": "Optional name of the place." },
                    "address": { "type": "STRING", "description": "The full, specific address." }
                },
                "required": ["address"]
            },
            "category": {
                "type": "STRING",
                "enum": category_enum(),
                "description": "Use 'Special Event' for time-sensitive events you discover."
            },
            "estimatedCost": { "type": "STRING", "description": "Estimated cost of this activity (e.g., 'Approx. ₹1200', 'Free'). Mandatory." },
            "isSpecialEvent": { "type": "BOOLEAN", "description": "True for a specific, date-sensitive event (concert, festival, exhibition)." },
            "bookingPartner": {
                "type": "STRING",
                "enum": ["Zomato", "BookMyShow", "Internal"],
                "description": "Suggested booking partner, if applicable.",
                "nullable": true
            },
            "travelInfo": travel_info_schema(
                "Travel from the previous location to this activity. For the first activity of the day, from the user's home."
            )
        },
        "required": ["time", "title", "description", "location", "category", "estimatedCost", "isSpecialEvent", "travelInfo"]
    })
}

/// Schema of a complete itinerary
pub fn itinerary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "A catchy, short title for the whole weekend plan." },
            "totalEstimatedCost": { "type": "STRING", "description": "Total estimated cost of the plan as one string, e.g. 'Approx. ₹4,500'." },
            "itinerary": {
                "type": "ARRAY",
                "description": "Daily plans covering Friday evening, Saturday and Sunday.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "day": { "type": "STRING", "description": "Weekday and full date, e.g. 'Friday Evening, July 26, 2024' or 'Saturday, July 27, 2024'." },
                        "theme": { "type": "STRING", "description": "A short theme for the day." },
                        "activities": { "type": "ARRAY", "items": activity_schema() }
                    },
                    "required": ["day", "theme", "activities"]
                }
            }
        },
        "required": ["title", "totalEstimatedCost", "itinerary"]
    })
}

/// Schema of a single-activity replacement
pub fn replacement_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "replacementActivity": activity_schema(),
            "updatedTotalCost": { "type": "STRING", "description": "The new total estimated cost of the whole plan." },
            "nextActivityTravelInfo": travel_info_schema(
                "Recalculated travel from the replacement to the activity that follows it. Omit if there is none."
            )
        },
        "required": ["replacementActivity", "updatedTotalCost"]
    })
}
