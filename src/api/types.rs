//! API request and response types

use crate::analytics::CallAnalysis;
use crate::bookings::BookingRecord;
use crate::dialogue::{ConversationState, ReplyOptions};
use crate::knowledge::SearchHit;
use serde::{Deserialize, Serialize};

/// One dialogue turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    /// Caller hint; ignored unless it names a valid state.
    #[serde(default)]
    pub current_state: Option<String>,
}

/// Reply for one dialogue turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ReplyOptions>,
}

/// Response with a city's outlets
#[derive(Debug, Serialize)]
pub struct RestaurantsResponse {
    pub restaurants: Vec<String>,
}

/// Response with a menu
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub menu: Vec<String>,
}

/// Response with FAQ entries
#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub faq: Vec<String>,
}

/// Response with the city list
#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<String>,
}

/// Response for a free-text knowledge search
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// Response with outlet opening hours
#[derive(Debug, Serialize)]
pub struct TimingsResponse {
    pub timings: String,
}

/// Response with outlet contact details
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub contact: String,
}

/// Response with confirmed bookings
#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingRecord>,
}

/// Response with stored call analyses
#[derive(Debug, Serialize)]
pub struct AnalysesResponse {
    pub analyses: Vec<CallAnalysis>,
}

/// Response with collected pending actions
#[derive(Debug, Serialize)]
pub struct PendingActionsResponse {
    pub pending_actions: Vec<String>,
}

/// Acknowledgement message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
