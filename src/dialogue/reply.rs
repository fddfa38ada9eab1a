//! Reply payload and the state-dependent option sets

use super::state::ConversationState;
use serde::{Deserialize, Serialize};

/// Actions offered alongside the outlet list.
pub const NEXT_ACTIONS: [&str; 3] = ["Menu", "Book Table", "FAQs"];

/// Follow-ups offered after a location is chosen.
pub const QUERY_TYPES: [&str; 2] = ["FAQs", "Booking"];

/// Structured choice set accompanying a reply. The variant (and therefore
/// the wire shape) is determined by the state the reply was rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyOptions {
    Cities { cities: Vec<String> },
    Outlets {
        locations: Vec<String>,
        next_actions: Vec<String>,
    },
    QueryTypes { query_types: Vec<String> },
    BookingFields { booking_fields: Vec<String> },
    Confirmation { confirmation: Vec<String> },
}

impl ReplyOptions {
    pub fn cities(cities: Vec<String>) -> Self {
        ReplyOptions::Cities { cities }
    }

    pub fn outlets(locations: Vec<String>) -> Self {
        ReplyOptions::Outlets {
            locations,
            next_actions: NEXT_ACTIONS.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn query_types() -> Self {
        ReplyOptions::QueryTypes {
            query_types: QUERY_TYPES.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn booking_fields(fields: &[&str]) -> Self {
        ReplyOptions::BookingFields {
            booking_fields: fields.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn confirmation() -> Self {
        ReplyOptions::Confirmation {
            confirmation: vec!["yes".to_string(), "no".to_string()],
        }
    }
}

/// What one turn sends back: reply text, the post-turn state, and the
/// selectable options (absent for terminal informational replies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub text: String,
    pub state: ConversationState,
    pub options: Option<ReplyOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_serialize_to_their_wire_shapes() {
        let json = serde_json::to_value(ReplyOptions::cities(vec!["delhi".into()])).unwrap();
        assert_eq!(json, serde_json::json!({"cities": ["delhi"]}));

        let json = serde_json::to_value(ReplyOptions::outlets(vec!["JP Nagar".into()])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "locations": ["JP Nagar"],
                "next_actions": ["Menu", "Book Table", "FAQs"],
            })
        );

        let json = serde_json::to_value(ReplyOptions::confirmation()).unwrap();
        assert_eq!(json, serde_json::json!({"confirmation": ["yes", "no"]}));
    }

    #[test]
    fn booking_fields_reflect_whats_missing() {
        let json = serde_json::to_value(ReplyOptions::booking_fields(&["date", "time"])).unwrap();
        assert_eq!(json, serde_json::json!({"booking_fields": ["date", "time"]}));
    }
}
