//! Confirmed-booking log
//!
//! Drafts emitted by the dialogue engine land here, picking up their
//! customer-facing reference on the way in.

use crate::dialogue::BookingDraft;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;

/// A confirmed booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    /// Reference shared with the customer, e.g. `BN20260815193045-4821`.
    pub reference: String,
    pub outlet: String,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: u32,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// In-memory log of confirmed bookings, oldest first.
#[derive(Default)]
pub struct BookingLog {
    records: RwLock<Vec<BookingRecord>>,
}

impl BookingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed booking, assigning its reference.
    pub async fn confirm(&self, draft: BookingDraft) -> BookingRecord {
        let record = BookingRecord {
            reference: generate_reference(),
            outlet: draft.outlet,
            name: draft.name,
            date: draft.date,
            time: draft.time,
            guests: draft.guests,
            contact: draft.contact,
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());
        record
    }

    pub async fn list(&self) -> Vec<BookingRecord> {
        self.records.read().await.clone()
    }
}

fn generate_reference() -> String {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("BN{stamp}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookingDraft {
        BookingDraft {
            outlet: "Barbeque Nation - Delhi".to_string(),
            name: "Priya".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
            time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            guests: 4,
            contact: None,
        }
    }

    #[tokio::test]
    async fn confirm_assigns_reference_and_logs() {
        let log = BookingLog::new();
        let record = log.confirm(draft()).await;

        assert!(record.reference.starts_with("BN"));
        // BN + 14-digit timestamp + dash + 4-digit suffix.
        assert_eq!(record.reference.len(), 21);

        let listed = log.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reference, record.reference);
        assert_eq!(listed[0].outlet, "Barbeque Nation - Delhi");
    }
}
