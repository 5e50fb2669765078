use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::models::booking::format_booking_number;
use crate::models::{
    display_date, display_time, BookingEvent, CancelIntent, Conversation, ConversationState,
    TimeSpec,
};
use crate::services::notify;
use crate::services::parser;
use crate::services::scheduling::{BookingRequest, SchedulingError, SchedulingService};
use crate::state::AppState;

pub const GREETING: &str = "I can help you book an appointment. Please say, for example, 'Book for 25 May at 9:00 AM' or 'Book for 25th May morning'.";

pub struct TurnOutcome {
    pub reply: String,
    pub event: Option<BookingEvent>,
}

impl TurnOutcome {
    fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            event: None,
        }
    }
}

/// Runs one user turn through the conversation and publishes any resulting
/// ledger change.
pub async fn process_message(state: &AppState, conv: &mut Conversation, message: &str) -> String {
    let today = Local::now().date_naive();
    let outcome = handle_turn(conv, &state.scheduler, message, today);
    conv.last_activity = Utc::now().naive_utc();

    tracing::info!(
        session = %conv.session_id,
        state = conv.state.as_str(),
        "processed chat turn"
    );

    if let Some(event) = outcome.event {
        notify::publish(state, event).await;
    }
    outcome.reply
}

/// Same as `process_message` for transports without a long-lived task.
/// Turns for one session id run one at a time; idle sessions are pruned.
pub async fn process_session_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> (String, ConversationState) {
    let session = {
        let mut sessions = state.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = Utc::now().naive_utc() - Duration::minutes(state.config.session_ttl_minutes);
        // A session that is mid-turn is never pruned.
        sessions.retain(|_, s| s.try_lock().map_or(true, |c| c.last_activity > cutoff));
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(Conversation::new(session_id)))),
        )
    };

    let mut conv = session.lock().await;
    let reply = process_message(state, &mut conv, message).await;
    (reply, conv.state)
}

/// The conversation state machine. Pure apart from the scheduler calls.
pub fn handle_turn(
    conv: &mut Conversation,
    scheduler: &SchedulingService,
    message: &str,
    today: NaiveDate,
) -> TurnOutcome {
    if conv.state == ConversationState::Done {
        conv.reset();
    }

    let mut turn = parser::parse(message, today);

    if let Some(cancel) = turn.cancel {
        return handle_cancel(scheduler, cancel);
    }

    if conv.state == ConversationState::CollectingName && turn.is_empty() {
        turn.name = parser::bare_name(message);
    }

    let mut filled = false;
    if conv.state == ConversationState::CollectingTime {
        let same_day = turn.date.map_or(true, |d| Some(d) == conv.pending.date);
        if turn.time.is_none() && same_day {
            turn.time = pick_offered(message, &conv.offered).map(TimeSpec::At);
        }
        filled = conv.pending.revise(&turn);
        if turn.has_date_or_time() {
            conv.offered.clear();
        }
    }

    filled |= conv.pending.absorb(&turn);
    conv.state = conv.pending.next_state();

    match conv.state {
        ConversationState::Confirming => attempt_booking(conv, scheduler),
        ConversationState::CollectingName | ConversationState::CollectingPhone
            if turn.has_date_or_time() =>
        {
            check_availability(conv, scheduler)
        }
        ConversationState::CollectingTime if !conv.offered.is_empty() => {
            TurnOutcome::reply(offer_prompt(&conv.offered))
        }
        _ if !filled && conv.pending.is_empty() => TurnOutcome::reply(GREETING),
        _ => TurnOutcome::reply(prompt_for(conv.state)),
    }
}

/// "the earlier one" / "the later one" against the last suggestions.
fn pick_offered(message: &str, offered: &[NaiveTime]) -> Option<NaiveTime> {
    let lowered = message.to_lowercase();
    let said = |words: &[&str]| lowered.split(|c: char| !c.is_alphabetic()).any(|w| words.contains(&w));

    if said(&["earlier", "earliest", "first", "former", "before"]) {
        offered.first().copied()
    } else if said(&["later", "latest", "last", "latter", "after", "second"]) {
        offered.last().copied()
    } else {
        None
    }
}

fn offer_prompt(offered: &[NaiveTime]) -> String {
    let times: Vec<String> = offered.iter().map(|t| display_time(*t)).collect();
    format!(
        "The free times I found are {}. Which one would you like? You can also name another time or day.",
        times.join(" or ")
    )
}

fn prompt_for(state: ConversationState) -> &'static str {
    match state {
        ConversationState::CollectingDate => {
            "Which date would you like to come in? For example, 25 May or tomorrow."
        }
        ConversationState::CollectingTime => {
            "What time works for you? You can say an exact time like 9:00 AM, or morning, afternoon or evening."
        }
        ConversationState::CollectingName => "May I have your name, please?",
        ConversationState::CollectingPhone => "Please share a phone number we can reach you on.",
        ConversationState::Confirming => "Let me book that for you.",
        ConversationState::Done => "You're all set.",
    }
}

/// Checks the requested time before asking for name and phone.
fn check_availability(conv: &mut Conversation, scheduler: &SchedulingService) -> TurnOutcome {
    let (Some(date), Some(spec)) = (conv.pending.date, conv.pending.time) else {
        return TurnOutcome::reply(prompt_for(conv.state));
    };

    match scheduler.find_slot(date, &spec) {
        Ok(Some(slot)) => {
            let lead = match spec {
                TimeSpec::At(_) => format!(
                    "Good news, {} on {} is available.",
                    slot.display_time(),
                    display_date(date)
                ),
                TimeSpec::Bucket(bucket) => format!(
                    "The first available slot in the {} on {} is {}.",
                    bucket.as_str(),
                    display_date(date),
                    slot.display_time()
                ),
            };
            TurnOutcome::reply(format!("{lead} {}", prompt_for(conv.state)))
        }
        Ok(None) => {
            let alternatives = match spec {
                TimeSpec::At(time) => scheduler.alternatives(date, time).unwrap_or_default(),
                TimeSpec::Bucket(_) => vec![],
            };
            conv.pending.time = None;
            conv.offered = alternatives.clone();
            conv.state = conv.pending.next_state();
            let err = SchedulingError::Conflict {
                date,
                requested: spec,
                alternatives,
            };
            TurnOutcome::reply(err.to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, session = %conv.session_id, "availability check failed");
            TurnOutcome::reply(prompt_for(conv.state))
        }
    }
}

fn attempt_booking(conv: &mut Conversation, scheduler: &SchedulingService) -> TurnOutcome {
    let pending = &conv.pending;
    let (Some(date), Some(time), Some(name), Some(phone)) = (
        pending.date,
        pending.time,
        pending.name.clone(),
        pending.phone.clone(),
    ) else {
        conv.state = conv.pending.next_state();
        return TurnOutcome::reply(prompt_for(conv.state));
    };

    let request = BookingRequest {
        date,
        time,
        name,
        phone,
    };

    match scheduler.book(&request) {
        Ok(confirmation) => {
            conv.state = ConversationState::Done;
            TurnOutcome {
                reply: confirmation.message(),
                event: Some(BookingEvent::booked(&confirmation)),
            }
        }
        Err(err @ SchedulingError::Conflict { .. }) => {
            if let SchedulingError::Conflict { alternatives, .. } = &err {
                conv.offered = alternatives.clone();
            }
            conv.pending.time = None;
            conv.state = ConversationState::CollectingTime;
            TurnOutcome::reply(err.to_string())
        }
        Err(err @ SchedulingError::InvalidInput(_)) => {
            conv.pending.name = conv.pending.name.take().filter(|n| !n.trim().is_empty());
            conv.pending.phone = conv
                .pending
                .phone
                .take()
                .filter(|p| !parser::normalize_phone(p).is_empty());
            conv.state = conv.pending.next_state();
            TurnOutcome::reply(format!("{err} {}", prompt_for(conv.state)))
        }
        Err(e) => {
            tracing::error!(error = %e, session = %conv.session_id, "booking attempt failed");
            TurnOutcome::reply(
                "Sorry, I couldn't complete the booking just now. Please say 'try again' to retry.",
            )
        }
    }
}

fn handle_cancel(scheduler: &SchedulingService, cancel: CancelIntent) -> TurnOutcome {
    let booking_number = match cancel {
        CancelIntent::Booking(n) => n,
        CancelIntent::Unspecified => {
            return TurnOutcome::reply(
                "Please tell me the booking number you'd like to cancel, for example 'cancel booking 3'.",
            )
        }
    };

    match scheduler.cancel(booking_number) {
        Ok(outcome) if outcome.released => {
            let record = &outcome.record;
            TurnOutcome {
                reply: format!(
                    "Booking {} for {} at {} has been cancelled.",
                    format_booking_number(record.booking_number),
                    display_date(record.date),
                    display_time(record.time),
                ),
                event: Some(BookingEvent::cancelled(record)),
            }
        }
        Ok(outcome) => TurnOutcome::reply(format!(
            "Booking {} was already cancelled.",
            format_booking_number(outcome.record.booking_number)
        )),
        Err(err @ SchedulingError::NotFound(_)) => TurnOutcome::reply(err.to_string()),
        Err(e) => {
            tracing::error!(error = %e, booking_number, "cancellation failed");
            TurnOutcome::reply("Sorry, I couldn't cancel that booking just now. Please try again.")
        }
    }
}
