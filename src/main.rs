//! grillbot - restaurant-enquiry chatbot backend
//!
//! A Rust backend implementing a per-session conversation state machine that
//! walks callers through city selection, outlet selection, and menu / FAQ /
//! table-booking enquiries.

mod analytics;
mod api;
mod bookings;
mod config;
mod dialogue;
mod knowledge;
mod sessions;

use api::{create_router, AppState};
use config::Settings;
use dialogue::DialogueConfig;
use knowledge::{InMemoryKnowledge, KnowledgeData};
use sessions::InMemorySessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grillbot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let settings = Settings::from_env();

    // Load the knowledge dataset
    let data = match &settings.dataset {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading knowledge dataset");
            KnowledgeData::from_path(path)?
        }
        None => KnowledgeData::builtin()?,
    };
    let dialogue = DialogueConfig::new(&data.chain);
    let knowledge = Arc::new(InMemoryKnowledge::from_data(&data));
    tracing::info!(
        chain = %dialogue.chain,
        cities = data.cities.len(),
        outlets = data.records.len(),
        "Knowledge store initialized"
    );

    let sessions = Arc::new(InMemorySessionStore::new());
    let state = AppState::new(dialogue, knowledge, sessions.clone());

    // Evict idle sessions so the in-memory store stays bounded
    let ttl = settings.session_ttl;
    let sweeper_sessions = sessions.clone();
    let sweeper_locks = state.locks.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            let evicted = sweeper_sessions.evict_idle(ttl).await;
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted idle sessions");
            }
            sweeper_locks.prune().await;
        }
    });

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("grillbot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
