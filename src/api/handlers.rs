//! HTTP request handlers

use super::types::{
    AnalysesResponse, BookingsResponse, ChatRequest, ChatResponse, CitiesResponse, ContactResponse,
    ErrorResponse, FaqResponse, MenuResponse, MessageResponse, PendingActionsResponse,
    RestaurantsResponse, SearchResponse, TimingsResponse,
};
use super::AppState;
use crate::analytics::{AnalysisFilter, CallAnalysis, CallMetrics};
use crate::dialogue::{normalize, process_turn, ConversationState, SessionContext, TurnError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::fmt::Display;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/", get(root))
        .route("/version", get(get_version))
        // Dialogue turns
        .route("/api/chatbot/chat", post(chat))
        // Outlet reads used by the frontend alongside the conversation
        .route("/api/chatbot/restaurants/:city", get(restaurants_by_city))
        .route("/api/chatbot/restaurant/:name", get(restaurant_info))
        .route("/api/chatbot/restaurant/:name/menu", get(restaurant_menu))
        .route("/api/chatbot/restaurant/:name/faq", get(restaurant_faq))
        // Knowledge base reads
        .route("/api/knowledge/cities", get(list_cities))
        .route("/api/knowledge/restaurants", get(list_restaurants))
        .route("/api/knowledge/search", get(search_knowledge))
        .route("/api/knowledge/restaurant/:name/info", get(restaurant_info))
        .route(
            "/api/knowledge/restaurant/:name/timings",
            get(restaurant_timings),
        )
        .route(
            "/api/knowledge/restaurant/:name/contact",
            get(restaurant_contact),
        )
        // Confirmed bookings
        .route("/api/bookings", get(list_bookings))
        // Post-call analysis
        .route("/api/post-call/analyze", post(analyze_call))
        .route("/api/post-call/analysis/:session_id", get(get_call_analysis))
        .route("/api/post-call/analyses", get(list_call_analyses))
        .route("/api/post-call/metrics", get(get_metrics))
        .route("/api/post-call/pending-actions", get(get_pending_actions))
        .route("/api/post-call/export", get(export_analyses))
        .with_state(state)
}

// ============================================================
// Liveness
// ============================================================

async fn root() -> &'static str {
    "Chatbot server is running!"
}

async fn get_version() -> &'static str {
    concat!("grillbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Dialogue Turns
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    run_turn(&state, &req).await.map(Json)
}

/// One full turn: load-or-create the session, run the engine, persist.
///
/// Access per session id is serialized through the lock registry; the
/// read-compute-write below is not otherwise atomic.
async fn run_turn(state: &AppState, req: &ChatRequest) -> Result<ChatResponse, AppError> {
    let _guard = state.locks.acquire(&req.session_id).await;

    let hint = req
        .current_state
        .as_deref()
        .and_then(ConversationState::parse);

    let stored = match state.sessions.get(&req.session_id).await {
        Ok(stored) => stored,
        Err(err) => return Err(reset_session(state, &req.session_id, &err).await),
    };
    let context = match stored {
        Some(mut context) => {
            // An existing session keeps its stored context; a valid hint only
            // overrides the state, never the accumulated data.
            if let Some(hint) = hint {
                context.current_state = hint;
            }
            context
        }
        None => SessionContext::new(hint.unwrap_or_default()),
    };

    match process_turn(&state.dialogue, state.knowledge.as_ref(), &context, &req.message) {
        Ok(turn) => {
            if let Err(err) = state.sessions.put(&req.session_id, turn.context).await {
                return Err(reset_session(state, &req.session_id, &err).await);
            }
            if let Some(draft) = turn.booking {
                let record = state.bookings.confirm(draft).await;
                tracing::info!(
                    reference = %record.reference,
                    outlet = %record.outlet,
                    guests = record.guests,
                    "Booking confirmed"
                );
            }
            tracing::debug!(
                session_id = %req.session_id,
                state = turn.reply.state.as_str(),
                "Turn processed"
            );
            Ok(ChatResponse {
                response: turn.reply.text,
                state: turn.reply.state,
                options: turn.reply.options,
            })
        }
        Err(TurnError::Fatal(cause)) => Err(reset_session(state, &req.session_id, &cause).await),
    }
}

/// Forced-reset failure path: drop the session so the next turn starts
/// fresh, and hand the caller a generic turn-level failure.
async fn reset_session(
    state: &AppState,
    session_id: &str,
    cause: &(dyn Display + Send + Sync),
) -> AppError {
    tracing::error!(session_id, error = %cause, "Turn failed, resetting session");
    if let Err(err) = state.sessions.delete(session_id).await {
        tracing::error!(session_id, error = %err, "Failed to delete session after fault");
    }
    AppError::Internal(
        "Sorry, there was an error processing your request. Please try again.".to_string(),
    )
}

// ============================================================
// Outlet Reads
// ============================================================

async fn restaurants_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<RestaurantsResponse>, AppError> {
    let restaurants = state
        .knowledge
        .list_outlets(&normalize(&city))
        .map_err(internal)?;
    if restaurants.is_empty() {
        return Err(AppError::NotFound(format!("No restaurants found in {city}")));
    }
    Ok(Json(RestaurantsResponse { restaurants }))
}

async fn restaurant_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<crate::knowledge::OutletRecord>, AppError> {
    state
        .knowledge
        .outlet(&name)
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {name} not found")))
}

async fn restaurant_menu(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MenuResponse>, AppError> {
    let menu = state.knowledge.menu(&name).map_err(internal)?;
    if menu.is_empty() {
        return Err(AppError::NotFound(format!("Menu not found for {name}")));
    }
    Ok(Json(MenuResponse { menu }))
}

#[derive(Debug, Deserialize)]
struct FaqQuery {
    query: Option<String>,
}

async fn restaurant_faq(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<FaqQuery>,
) -> Result<Json<FaqResponse>, AppError> {
    let faq = state.knowledge.faqs(&name).map_err(internal)?;
    match params.query {
        Some(query) => {
            let needle = query.to_lowercase();
            let matched: Vec<String> = faq
                .into_iter()
                .filter(|entry| entry.to_lowercase().contains(&needle))
                .collect();
            if matched.is_empty() {
                return Err(AppError::NotFound(format!("No FAQ found matching '{query}'")));
            }
            Ok(Json(FaqResponse { faq: matched }))
        }
        None => {
            if faq.is_empty() {
                return Err(AppError::NotFound(format!("FAQ not found for {name}")));
            }
            Ok(Json(FaqResponse { faq }))
        }
    }
}

// ============================================================
// Knowledge Base Reads
// ============================================================

async fn list_cities(State(state): State<AppState>) -> Result<Json<CitiesResponse>, AppError> {
    let cities = state.knowledge.list_cities().map_err(internal)?;
    Ok(Json(CitiesResponse { cities }))
}

async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<RestaurantsResponse>, AppError> {
    let restaurants = state.knowledge.outlet_names().map_err(internal)?;
    Ok(Json(RestaurantsResponse { restaurants }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search_knowledge(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.knowledge.search(&params.query).map_err(internal)?;
    if results.is_empty() {
        return Err(AppError::NotFound(format!(
            "No results found for '{}'",
            params.query
        )));
    }
    Ok(Json(SearchResponse { results }))
}

async fn restaurant_timings(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TimingsResponse>, AppError> {
    state
        .knowledge
        .outlet(&name)
        .map_err(internal)?
        .filter(|record| !record.hours.is_empty())
        .map(|record| Json(TimingsResponse { timings: record.hours }))
        .ok_or_else(|| AppError::NotFound(format!("Timings not found for {name}")))
}

async fn restaurant_contact(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ContactResponse>, AppError> {
    state
        .knowledge
        .outlet(&name)
        .map_err(internal)?
        .filter(|record| !record.contact.is_empty())
        .map(|record| Json(ContactResponse { contact: record.contact }))
        .ok_or_else(|| AppError::NotFound(format!("Contact information not found for {name}")))
}

// ============================================================
// Bookings
// ============================================================

async fn list_bookings(State(state): State<AppState>) -> Json<BookingsResponse> {
    Json(BookingsResponse {
        bookings: state.bookings.list().await,
    })
}

// ============================================================
// Post-Call Analysis
// ============================================================

async fn analyze_call(
    State(state): State<AppState>,
    Json(analysis): Json<CallAnalysis>,
) -> Json<MessageResponse> {
    state.analytics.put(analysis).await;
    Json(MessageResponse {
        message: "Call analysis stored successfully".to_string(),
    })
}

async fn get_call_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CallAnalysis>, AppError> {
    state
        .analytics
        .get(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No analysis found for session {session_id}")))
}

async fn list_call_analyses(
    State(state): State<AppState>,
    Query(filter): Query<AnalysisFilter>,
) -> Json<AnalysesResponse> {
    Json(AnalysesResponse {
        analyses: state.analytics.list(&filter).await,
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<CallMetrics> {
    Json(state.analytics.metrics().await)
}

async fn get_pending_actions(State(state): State<AppState>) -> Json<PendingActionsResponse> {
    Json(PendingActionsResponse {
        pending_actions: state.analytics.pending_actions().await,
    })
}

async fn export_analyses(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let dump = state.analytics.export_json().await;
    let filename = format!("call_analyses_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));

    std::fs::create_dir_all("exports").map_err(internal)?;
    let pretty = serde_json::to_string_pretty(&dump).map_err(internal)?;
    std::fs::write(std::path::Path::new("exports").join(&filename), pretty).map_err(internal)?;

    Ok(Json(MessageResponse {
        message: format!("Analyses exported to {filename}"),
    }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

fn internal<E: Display>(err: E) -> AppError {
    AppError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::DialogueConfig;
    use crate::knowledge::{
        InMemoryKnowledge, KnowledgeData, KnowledgeError, KnowledgeResult, KnowledgeStore,
        OutletRecord, SearchHit,
    };
    use crate::sessions::{InMemorySessionStore, SessionStore};
    use std::sync::Arc;

    fn test_state() -> AppState {
        let data = KnowledgeData::builtin().unwrap();
        AppState::new(
            DialogueConfig::new(&data.chain),
            Arc::new(InMemoryKnowledge::from_data(&data)),
            Arc::new(InMemorySessionStore::new()),
        )
    }

    fn request(session_id: &str, message: &str, current_state: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
            current_state: current_state.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn first_turn_creates_session_and_advances() {
        let state = test_state();
        let response = run_turn(&state, &request("s1", "hi", None)).await.unwrap();

        assert_eq!(response.state, ConversationState::CitySelection);
        let stored = state.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(stored.current_state, ConversationState::CitySelection);
    }

    #[tokio::test]
    async fn new_session_honors_a_valid_state_hint() {
        let state = test_state();
        let response = run_turn(&state, &request("s1", "nonsense", Some("city_selection")))
            .await
            .unwrap();

        // Treated as a CitySelection turn, so unrecognized input re-prompts.
        assert_eq!(response.state, ConversationState::CitySelection);
        assert!(response.response.contains("don't recognize that city"));
    }

    #[tokio::test]
    async fn invalid_hint_is_ignored() {
        let state = test_state();
        let response = run_turn(&state, &request("s1", "hi", Some("not_a_state")))
            .await
            .unwrap();

        assert_eq!(response.state, ConversationState::CitySelection);
    }

    #[tokio::test]
    async fn existing_session_keeps_data_when_hint_overrides_state() {
        let state = test_state();
        run_turn(&state, &request("s1", "hi", None)).await.unwrap();
        run_turn(&state, &request("s1", "delhi", None)).await.unwrap();

        // Rewind the state; the accumulated city must survive.
        let response = run_turn(&state, &request("s1", "whatever", Some("outlet_selection")))
            .await
            .unwrap();
        assert_eq!(response.state, ConversationState::OutletSelection);

        let stored = state.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(stored.city.as_deref(), Some("Delhi"));
    }

    struct BrokenStore;

    impl KnowledgeStore for BrokenStore {
        fn list_cities(&self) -> KnowledgeResult<Vec<String>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn list_outlets(&self, _city: &str) -> KnowledgeResult<Vec<String>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn menu(&self, _outlet: &str) -> KnowledgeResult<Vec<String>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn faqs(&self, _outlet: &str) -> KnowledgeResult<Vec<String>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn outlet(&self, _outlet: &str) -> KnowledgeResult<Option<OutletRecord>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn outlet_names(&self) -> KnowledgeResult<Vec<String>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
        fn search(&self, _query: &str) -> KnowledgeResult<Vec<SearchHit>> {
            Err(KnowledgeError::Unavailable("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn processing_fault_deletes_the_session() {
        let sessions: Arc<InMemorySessionStore> = Arc::new(InMemorySessionStore::new());
        let state = AppState::new(
            DialogueConfig::new("Barbeque Nation"),
            Arc::new(BrokenStore),
            sessions.clone(),
        );
        sessions
            .put("s1", SessionContext::new(ConversationState::CitySelection))
            .await
            .unwrap();

        let result = run_turn(&state, &request("s1", "delhi", None)).await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        // The session is gone, so the next turn starts over from the greeting.
        assert!(sessions.get("s1").await.unwrap().is_none());
        let data = KnowledgeData::builtin().unwrap();
        let healthy = AppState::new(
            DialogueConfig::new(&data.chain),
            Arc::new(InMemoryKnowledge::from_data(&data)),
            sessions.clone(),
        );
        let response = run_turn(&healthy, &request("s1", "hello", None)).await.unwrap();
        assert_eq!(response.state, ConversationState::CitySelection);
    }
}
