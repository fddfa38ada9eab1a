//! Property-based tests for the dialogue engine
//!
//! These verify the closed-world and consistency guarantees across arbitrary
//! inputs, not just the scripted happy paths.

use super::booking::BookingDetails;
use super::reply::ReplyOptions;
use super::state::{ConversationState, DialogueConfig, QueryType, SessionContext};
use super::transition::process_turn;
use crate::knowledge::{CityOutlets, InMemoryKnowledge, KnowledgeData, OutletRecord};
use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn config() -> DialogueConfig {
    DialogueConfig::new("Barbeque Nation")
}

fn fixture() -> InMemoryKnowledge {
    InMemoryKnowledge::from_data(&KnowledgeData {
        chain: "Barbeque Nation".to_string(),
        cities: vec![
            CityOutlets {
                name: "delhi".to_string(),
                outlets: vec!["Connaught Place".to_string(), "Sector C, Vasant Kunj".to_string()],
            },
            CityOutlets {
                name: "bangalore".to_string(),
                outlets: vec!["JP Nagar".to_string()],
            },
        ],
        records: vec![OutletRecord {
            name: "Barbeque Nation - Delhi".to_string(),
            city: "Delhi".to_string(),
            address: "Connaught Place".to_string(),
            contact: "+91 8048087837".to_string(),
            hours: "12:00 PM - 11:00 PM".to_string(),
            menu: vec!["Grilled Paneer Tikka".to_string()],
            faqs: vec!["Q: Parking? A: Valet available.".to_string()],
        }],
    })
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_city() -> impl Strategy<Value = String> {
    prop_oneof![Just("Delhi".to_string()), Just("Bangalore".to_string())]
}

fn arb_query_type() -> impl Strategy<Value = QueryType> {
    prop_oneof![
        Just(QueryType::Menu),
        Just(QueryType::Faq),
        Just(QueryType::LocationInfo),
        Just(QueryType::Booking),
    ]
}

fn arb_partial_booking() -> impl Strategy<Value = BookingDetails> {
    (
        proptest::option::of(Just("Priya".to_string())),
        proptest::option::of(Just(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap())),
        proptest::option::of(Just(NaiveTime::from_hms_opt(19, 30, 0).unwrap())),
        proptest::option::of(1u32..12),
        proptest::option::of(Just("9876543210".to_string())),
    )
        .prop_map(|(name, date, time, guests, contact)| BookingDetails {
            name,
            date,
            time,
            guests,
            contact,
        })
}

fn complete_booking() -> BookingDetails {
    BookingDetails {
        name: Some("Priya".to_string()),
        date: NaiveDate::from_ymd_opt(2026, 8, 15),
        time: NaiveTime::from_hms_opt(19, 30, 0),
        guests: Some(4),
        contact: None,
    }
}

/// Contexts that satisfy the structural invariants, across every state.
fn arb_context() -> impl Strategy<Value = SessionContext> {
    prop_oneof![
        Just(SessionContext::default()),
        Just(SessionContext::new(ConversationState::CitySelection)),
        arb_city().prop_map(|city| {
            let mut context = SessionContext::new(ConversationState::OutletSelection);
            context.city = Some(city);
            context
        }),
        (arb_city(), arb_query_type()).prop_map(|(city, query_type)| {
            let mut context = SessionContext::new(ConversationState::QueryTypeSelection);
            if query_type.needs_outlet() {
                context.outlet = Some(format!("Barbeque Nation - {city}"));
            }
            context.city = Some(city);
            context.query_type = Some(query_type);
            context
        }),
        arb_city().prop_map(|city| {
            let mut context = SessionContext::new(ConversationState::FaqHandling);
            context.city = Some(city);
            context
        }),
        (arb_city(), arb_partial_booking()).prop_map(|(city, booking)| {
            let mut context = SessionContext::new(ConversationState::BookingCollection);
            context.city = Some(city);
            context.query_type = Some(QueryType::Booking);
            context.booking = booking;
            context
        }),
        arb_city().prop_map(|city| {
            let mut context = SessionContext::new(ConversationState::BookingConfirmation);
            context.city = Some(city);
            context.query_type = Some(QueryType::Booking);
            context.booking = complete_booking();
            context
        }),
        arb_city().prop_map(|city| {
            let mut context = SessionContext::new(ConversationState::Farewell);
            context.city = Some(city);
            context
        }),
    ]
}

fn arb_input() -> impl Strategy<Value = String> {
    "[ -~]{0,30}"
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every turn lands in a member of the closed state set with the
    /// structural invariants intact, and the reply always reports the
    /// post-turn state.
    #[test]
    fn turns_preserve_invariants(context in arb_context(), input in arb_input()) {
        let turn = process_turn(&config(), &fixture(), &context, &input).unwrap();

        prop_assert!(turn.context.is_consistent());
        prop_assert_eq!(turn.reply.state, turn.context.current_state);
        // The input context is never mutated, only derived from.
        prop_assert!(context.is_consistent());
    }

    /// Replaying the same input against the same context changes nothing:
    /// no hidden counters influence the output.
    #[test]
    fn turns_are_idempotent(context in arb_context(), input in arb_input()) {
        let first = process_turn(&config(), &fixture(), &context, &input).unwrap();
        let second = process_turn(&config(), &fixture(), &context, &input).unwrap();

        prop_assert_eq!(first.reply, second.reply);
        prop_assert_eq!(first.context, second.context);
        prop_assert_eq!(first.booking, second.booking);
    }

    /// Unrecognized city input never advances and always re-offers the full
    /// city list.
    #[test]
    fn unknown_city_always_reprompts(input in arb_input()) {
        prop_assume!(!["delhi", "bangalore"].contains(&input.trim().to_lowercase().as_str()));

        let context = SessionContext::new(ConversationState::CitySelection);
        let turn = process_turn(&config(), &fixture(), &context, &input).unwrap();

        prop_assert_eq!(turn.context.current_state, ConversationState::CitySelection);
        prop_assert_eq!(
            turn.reply.options,
            Some(ReplyOptions::cities(vec![
                "delhi".to_string(),
                "bangalore".to_string()
            ]))
        );
    }

    /// The menu keyword resolves the city's outlet and asks for its menu,
    /// whatever the city.
    #[test]
    fn menu_keyword_always_selects_menu(city in arb_city(), padding in "[ ]{0,3}") {
        let mut context = SessionContext::new(ConversationState::OutletSelection);
        context.city = Some(city.clone());

        let input = format!("{padding}MENU{padding}");
        let turn = process_turn(&config(), &fixture(), &context, &input).unwrap();

        prop_assert_eq!(turn.context.current_state, ConversationState::QueryTypeSelection);
        prop_assert_eq!(turn.context.query_type, Some(QueryType::Menu));
        prop_assert_eq!(turn.context.outlet, Some(format!("Barbeque Nation - {city}")));
    }
}
