//! Booking-field extraction from free-text turns
//!
//! Users supply booking details in ordinary chat messages; recognized fields
//! are pulled out with narrow patterns and validated before they are kept.
//! Unparseable fragments are simply ignored and re-requested.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date pattern"));
static TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").expect("time pattern"));
static GUESTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:guests?|people|persons?)").expect("guests pattern"));
static CONTACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+?[1-9]\d{9}").expect("contact pattern"));
static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bname\s*(?:is\s+)?[:\-]?\s*([A-Za-z][A-Za-z .'-]{0,40})").expect("name pattern")
});

/// Booking fields collected so far for one session.
///
/// Fields are absorbed incrementally across turns and never removed; a later
/// turn may overwrite an earlier value (e.g. a corrected date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookingDetails {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub guests: Option<u32>,
    pub contact: Option<String>,
}

impl BookingDetails {
    /// Extract whatever recognizable fields the input carries.
    ///
    /// Dates must be `YYYY-MM-DD` and times `HH:MM`; both are validated as
    /// real calendar values, so `2026-13-40` is dropped rather than stored.
    pub fn absorb(&mut self, input: &str) {
        if let Some(m) = DATE.find(input) {
            if let Ok(date) = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
                self.date = Some(date);
            }
        }
        if let Some(m) = TIME.find(input) {
            if let Ok(time) = NaiveTime::parse_from_str(m.as_str(), "%H:%M") {
                self.time = Some(time);
            }
        }
        if let Some(caps) = GUESTS.captures(input) {
            if let Ok(guests) = caps[1].parse::<u32>() {
                if guests > 0 {
                    self.guests = Some(guests);
                }
            }
        }
        if let Some(m) = CONTACT.find(input) {
            self.contact = Some(m.as_str().to_string());
        }
        if let Some(caps) = NAME.captures(input) {
            let name = caps[1].trim().to_string();
            if !name.is_empty() {
                self.name = Some(name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.guests.is_none()
            && self.contact.is_none()
    }

    /// Required fields still to be collected. Contact is optional.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.time.is_none() {
            missing.push("time");
        }
        if self.guests.is_none() {
            missing.push("guests");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Freeze the collected fields into a draft for the given outlet.
    /// Returns `None` while any required field is still missing.
    pub fn draft_for(&self, outlet: &str) -> Option<BookingDraft> {
        Some(BookingDraft {
            outlet: outlet.to_string(),
            name: self.name.clone()?,
            date: self.date?,
            time: self.time?,
            guests: self.guests?,
            contact: self.contact.clone(),
        })
    }

    /// Human-readable recap shown before confirmation.
    pub fn summary(&self, restaurant: &str) -> String {
        format!(
            "Restaurant: {restaurant}\nDate: {}\nTime: {}\nGuests: {}\nContact: {}",
            self.date.map_or("N/A".to_string(), |date| date.to_string()),
            self.time
                .map_or("N/A".to_string(), |time| time.format("%H:%M").to_string()),
            self.guests.map_or("N/A".to_string(), |guests| guests.to_string()),
            self.contact.clone().unwrap_or_else(|| "N/A".to_string()),
        )
    }
}

/// A fully collected booking, ready to be recorded by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingDraft {
    pub outlet: String,
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: u32,
    pub contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbs_all_fields_from_one_message() {
        let mut details = BookingDetails::default();
        details.absorb("name: Priya, 2026-08-15, 19:30, 4 guests, 9876543210");

        assert_eq!(details.name.as_deref(), Some("Priya"));
        assert_eq!(details.date, NaiveDate::from_ymd_opt(2026, 8, 15));
        assert_eq!(details.time, NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(details.guests, Some(4));
        assert_eq!(details.contact.as_deref(), Some("9876543210"));
        assert!(details.is_complete());
    }

    #[test]
    fn accumulates_across_turns() {
        let mut details = BookingDetails::default();
        details.absorb("2026-08-15 please");
        assert_eq!(details.missing(), vec!["name", "time", "guests"]);

        details.absorb("my name is Arjun Rao, 2 people at 20:00");
        assert!(details.is_complete());
        assert_eq!(details.name.as_deref(), Some("Arjun Rao"));
        assert_eq!(details.guests, Some(2));
    }

    #[test]
    fn rejects_impossible_dates_and_times() {
        let mut details = BookingDetails::default();
        details.absorb("2026-13-40 at 99:99");
        assert_eq!(details.date, None);
        assert_eq!(details.time, None);
    }

    #[test]
    fn zero_guests_is_not_a_party() {
        let mut details = BookingDetails::default();
        details.absorb("0 guests");
        assert_eq!(details.guests, None);
    }

    #[test]
    fn later_values_overwrite_earlier_ones() {
        let mut details = BookingDetails::default();
        details.absorb("2026-08-15");
        details.absorb("actually 2026-08-16");
        assert_eq!(details.date, NaiveDate::from_ymd_opt(2026, 8, 16));
    }

    #[test]
    fn draft_requires_all_mandatory_fields() {
        let mut details = BookingDetails::default();
        details.absorb("name: Priya, 2026-08-15, 19:30");
        assert!(details.draft_for("Barbeque Nation - Delhi").is_none());

        details.absorb("4 guests");
        let draft = details.draft_for("Barbeque Nation - Delhi").unwrap();
        assert_eq!(draft.outlet, "Barbeque Nation - Delhi");
        assert_eq!(draft.guests, 4);
        assert_eq!(draft.contact, None);
    }

    #[test]
    fn summary_marks_absent_fields() {
        let mut details = BookingDetails::default();
        details.absorb("2026-08-15");
        let summary = details.summary("Barbeque Nation - Delhi");
        assert!(summary.contains("Restaurant: Barbeque Nation - Delhi"));
        assert!(summary.contains("Date: 2026-08-15"));
        assert!(summary.contains("Guests: N/A"));
    }
}
