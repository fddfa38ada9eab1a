//! HTTP API
//!
//! Thin adapter over the dialogue engine and the read-only stores. Handlers
//! hold no conversation logic beyond session load/persist.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::analytics::AnalyticsStore;
use crate::bookings::BookingLog;
use crate::dialogue::DialogueConfig;
use crate::knowledge::KnowledgeStore;
use crate::sessions::{SessionLocks, SessionStore};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dialogue: Arc<DialogueConfig>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub locks: Arc<SessionLocks>,
    pub bookings: Arc<BookingLog>,
    pub analytics: Arc<AnalyticsStore>,
}

impl AppState {
    pub fn new(
        dialogue: DialogueConfig,
        knowledge: Arc<dyn KnowledgeStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            dialogue: Arc::new(dialogue),
            knowledge,
            sessions,
            locks: Arc::new(SessionLocks::new()),
            bookings: Arc::new(BookingLog::new()),
            analytics: Arc::new(AnalyticsStore::new()),
        }
    }
}
