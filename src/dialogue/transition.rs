//! Pure turn processing
//!
//! One call per user utterance: interpret the input under the current state,
//! derive the next context, render the reply for the post-transition state.
//! Malformed input is never an error; it re-issues the prompt for whatever
//! the conversation is currently waiting on.

use super::booking::BookingDraft;
use super::reply::{ReplyOptions, ReplyPayload};
use super::state::{
    normalize, title_case, ConversationState, DialogueConfig, QueryType, SessionContext,
};
use crate::knowledge::{KnowledgeError, KnowledgeStore};
use thiserror::Error;

/// Result of one processed turn.
#[derive(Debug)]
pub struct Turn {
    pub context: SessionContext,
    pub reply: ReplyPayload,
    /// Present only on the turn where the user confirms a booking.
    pub booking: Option<BookingDraft>,
}

impl Turn {
    fn reprompt(context: SessionContext, text: impl Into<String>, options: ReplyOptions) -> Self {
        let reply = ReplyPayload {
            text: text.into(),
            state: context.current_state,
            options: Some(options),
        };
        Turn {
            context,
            reply,
            booking: None,
        }
    }

    fn fallback(context: SessionContext) -> Self {
        let reply = fallback_reply(context.current_state);
        Turn {
            context,
            reply,
            booking: None,
        }
    }
}

/// Errors that abort a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The turn could not complete and the session cannot make progress;
    /// the caller is expected to discard it so the next turn starts fresh.
    #[error("turn aborted: {0}")]
    Fatal(#[from] KnowledgeError),
}

/// Process one user utterance against a session context.
///
/// Pure with respect to its inputs: the same context, input, and knowledge
/// contents always produce the same derived context and reply. The given
/// context is never mutated.
pub fn process_turn(
    config: &DialogueConfig,
    knowledge: &dyn KnowledgeStore,
    context: &SessionContext,
    raw_input: &str,
) -> Result<Turn, TurnError> {
    let input = normalize(raw_input);
    let mut next = context.clone();
    let mut confirmed: Option<BookingDraft> = None;

    // Phase 1: state-conditioned interpretation. Unrecognized input in a
    // selection state returns a re-prompt directly and skips rendering.
    match context.current_state {
        ConversationState::InitialGreeting => {
            if !input.is_empty() {
                next.current_state = ConversationState::CitySelection;
            }
        }
        ConversationState::CitySelection => {
            let cities = knowledge.list_cities()?;
            if let Some(city) = cities.iter().find(|city| normalize(city) == input) {
                next.city = Some(title_case(city));
                next.current_state = ConversationState::OutletSelection;
            } else {
                return Ok(Turn::reprompt(
                    next,
                    "Sorry, I don't recognize that city. Please select a city from the options.",
                    ReplyOptions::cities(cities),
                ));
            }
        }
        ConversationState::OutletSelection => {
            let Some(city) = next.city.clone() else {
                // Only reachable through a caller-supplied state hint on a
                // context that never picked a city.
                return Ok(Turn::fallback(next));
            };
            let outlets = knowledge.list_outlets(&normalize(&city))?;
            // Outlet names win over keywords: an outlet literally called
            // "Menu" is still a location.
            if outlets.iter().any(|outlet| normalize(outlet) == input) {
                next.outlet = Some(config.outlet_id(&city));
                next.query_type = Some(QueryType::LocationInfo);
                next.current_state = ConversationState::QueryTypeSelection;
            } else if input.contains("menu") {
                next.outlet = Some(config.outlet_id(&city));
                next.query_type = Some(QueryType::Menu);
                next.current_state = ConversationState::QueryTypeSelection;
            } else if input.contains("book table") || input.contains("booking") {
                next.query_type = Some(QueryType::Booking);
                next.current_state = ConversationState::BookingCollection;
            } else if input.contains("faq") {
                next.outlet = Some(config.outlet_id(&city));
                next.query_type = Some(QueryType::Faq);
                next.current_state = ConversationState::QueryTypeSelection;
            } else {
                return Ok(Turn::reprompt(
                    next,
                    "I didn't understand that. Please select a location or one of the actions \
                     (Menu, Book Table, FAQs).",
                    ReplyOptions::outlets(outlets),
                ));
            }
        }
        ConversationState::BookingCollection => {
            next.booking.absorb(raw_input);
            if next.booking.is_complete() {
                next.current_state = ConversationState::BookingConfirmation;
            }
        }
        ConversationState::BookingConfirmation => match input.as_str() {
            "yes" => {
                let Some(city) = next.city.clone() else {
                    return Ok(Turn::fallback(next));
                };
                if let Some(draft) = next.booking.draft_for(&config.outlet_id(&city)) {
                    confirmed = Some(draft);
                    next.current_state = ConversationState::Farewell;
                } else {
                    // Confirmation reached with incomplete details; collect
                    // the rest before asking again.
                    next.current_state = ConversationState::BookingCollection;
                }
            }
            "no" => next.current_state = ConversationState::BookingCollection,
            _ => {}
        },
        ConversationState::QueryTypeSelection
        | ConversationState::FaqHandling
        | ConversationState::Farewell => {}
    }

    // Phase 2: render for the post-transition state.
    let reply = render(config, knowledge, &next, confirmed.as_ref())?;
    Ok(Turn {
        context: next,
        reply,
        booking: confirmed,
    })
}

// ============================================================
// Rendering
// ============================================================

fn render(
    config: &DialogueConfig,
    knowledge: &dyn KnowledgeStore,
    context: &SessionContext,
    confirmed: Option<&BookingDraft>,
) -> Result<ReplyPayload, TurnError> {
    let state = context.current_state;
    let reply = match state {
        ConversationState::InitialGreeting => ReplyPayload {
            text: format!(
                "Welcome to {}! How can I help you today? Please select your city.",
                config.chain
            ),
            state,
            options: Some(ReplyOptions::cities(knowledge.list_cities()?)),
        },
        ConversationState::CitySelection => {
            let cities = knowledge.list_cities()?;
            let listed = cities
                .iter()
                .map(|city| title_case(city))
                .collect::<Vec<_>>()
                .join(" or ");
            ReplyPayload {
                text: format!("Please select a city ({listed}):"),
                state,
                options: Some(ReplyOptions::cities(cities)),
            }
        }
        ConversationState::OutletSelection => {
            let Some(city) = context.city.as_deref() else {
                return Ok(fallback_reply(state));
            };
            let outlets = knowledge.list_outlets(&normalize(city))?;
            if outlets.is_empty() {
                ReplyPayload {
                    text: format!("Sorry, no locations found for {city}. Please select another city."),
                    state,
                    options: Some(ReplyOptions::cities(knowledge.list_cities()?)),
                }
            } else {
                let listed = outlets
                    .iter()
                    .map(|outlet| format!("- {outlet}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                ReplyPayload {
                    text: format!(
                        "Here are the locations in {city}:\n{listed}\n\nPlease select a location \
                         or tell me what you'd like to do (e.g., view menu, book a table, FAQs)."
                    ),
                    state,
                    options: Some(ReplyOptions::outlets(outlets)),
                }
            }
        }
        ConversationState::QueryTypeSelection => render_query(knowledge, context)?,
        ConversationState::BookingCollection => {
            let missing = context.booking.missing();
            if context.booking.is_empty() {
                ReplyPayload {
                    text: "Please provide your booking details (name, date, time, guests). \
                           For example: name: Priya, 2026-08-15, 19:30, 4 guests."
                        .to_string(),
                    state,
                    options: Some(ReplyOptions::booking_fields(&["name", "date", "time", "guests"])),
                }
            } else if missing.is_empty() {
                // Back here after a declined confirmation; any corrected
                // detail re-triggers the confirmation prompt.
                ReplyPayload {
                    text: "Okay, let's adjust your booking. Send any corrected detail \
                           (name, date, time, guests)."
                        .to_string(),
                    state,
                    options: Some(ReplyOptions::booking_fields(&["name", "date", "time", "guests"])),
                }
            } else {
                ReplyPayload {
                    text: format!("Got it. I still need: {}.", missing.join(", ")),
                    state,
                    options: Some(ReplyOptions::booking_fields(&missing)),
                }
            }
        }
        ConversationState::BookingConfirmation => {
            let Some(city) = context.city.as_deref() else {
                return Ok(fallback_reply(state));
            };
            let summary = context.booking.summary(&config.outlet_id(city));
            ReplyPayload {
                text: format!("{summary}\nWould you like to confirm your booking? (yes/no)"),
                state,
                options: Some(ReplyOptions::confirmation()),
            }
        }
        ConversationState::Farewell => {
            let thanks = format!("Thank you for choosing {}! Have a great day!", config.chain);
            let text = match confirmed {
                Some(draft) => format!(
                    "Your table is booked for {} at {} ({} guests). {thanks}",
                    draft.date,
                    draft.time.format("%H:%M"),
                    draft.guests
                ),
                None => thanks,
            };
            ReplyPayload {
                text,
                state,
                options: None,
            }
        }
        // Declared but not routed to by any transition; answered with the
        // generic fallback like any state the engine has no script for.
        ConversationState::FaqHandling => fallback_reply(state),
    };
    Ok(reply)
}

fn render_query(
    knowledge: &dyn KnowledgeStore,
    context: &SessionContext,
) -> Result<ReplyPayload, TurnError> {
    let state = context.current_state;
    let reply = match context.query_type {
        Some(QueryType::Menu) => {
            let Some(outlet) = context.outlet.as_deref() else {
                return Ok(fallback_reply(state));
            };
            let menu = knowledge.menu(outlet)?;
            if menu.is_empty() {
                ReplyPayload {
                    text: format!("Sorry, I couldn't find the menu for {outlet}."),
                    state,
                    options: None,
                }
            } else {
                ReplyPayload {
                    text: format!("Here is the menu for {outlet}:\n{}", menu.join("\n")),
                    state,
                    options: None,
                }
            }
        }
        Some(QueryType::Faq) => {
            let Some(outlet) = context.outlet.as_deref() else {
                return Ok(fallback_reply(state));
            };
            let faqs = knowledge.faqs(outlet)?;
            if faqs.is_empty() {
                ReplyPayload {
                    text: format!("Sorry, I couldn't find FAQs for {outlet}."),
                    state,
                    options: None,
                }
            } else {
                ReplyPayload {
                    text: format!("Here are some FAQs for {outlet}:\n{}", faqs.join("\n")),
                    state,
                    options: None,
                }
            }
        }
        Some(QueryType::LocationInfo) => {
            let Some(city) = context.city.as_deref() else {
                return Ok(fallback_reply(state));
            };
            ReplyPayload {
                text: format!(
                    "You've selected a location in {city}. What specific information are you \
                     looking for about this location?"
                ),
                state,
                options: Some(ReplyOptions::query_types()),
            }
        }
        Some(QueryType::Booking) | None => ReplyPayload {
            text: "What would you like to know? (1 for FAQs, 2 for Booking)".to_string(),
            state,
            options: Some(ReplyOptions::query_types()),
        },
    };
    Ok(reply)
}

fn fallback_reply(state: ConversationState) -> ReplyPayload {
    ReplyPayload {
        text: "I'm not sure how to proceed. Can we start over?".to_string(),
        state,
        options: None,
    }
}
