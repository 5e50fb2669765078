use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::intent::ParsedTurn;
use super::slot::TimeSpec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    CollectingDate,
    CollectingTime,
    CollectingName,
    CollectingPhone,
    Confirming,
    Done,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::CollectingDate => "collecting_date",
            ConversationState::CollectingTime => "collecting_time",
            ConversationState::CollectingName => "collecting_name",
            ConversationState::CollectingPhone => "collecting_phone",
            ConversationState::Confirming => "confirming",
            ConversationState::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PendingBooking {
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSpec>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl PendingBooking {
    /// Fills empty fields from the turn. Returns true if anything was filled.
    pub fn absorb(&mut self, turn: &ParsedTurn) -> bool {
        let mut filled = false;
        if self.date.is_none() && turn.date.is_some() {
            self.date = turn.date;
            filled = true;
        }
        if self.time.is_none() && turn.time.is_some() {
            self.time = turn.time;
            filled = true;
        }
        if self.name.is_none() && turn.name.is_some() {
            self.name = turn.name.clone();
            filled = true;
        }
        if self.phone.is_none() && turn.phone.is_some() {
            self.phone = turn.phone.clone();
            filled = true;
        }
        filled
    }

    /// Replaces date and time with whatever the turn carries. Used while
    /// the time is being renegotiated, so a new day can replace a full one.
    pub fn revise(&mut self, turn: &ParsedTurn) -> bool {
        let mut changed = false;
        if turn.date.is_some() && turn.date != self.date {
            self.date = turn.date;
            changed = true;
        }
        if turn.time.is_some() && turn.time != self.time {
            self.time = turn.time;
            changed = true;
        }
        changed
    }

    /// First outstanding field in date, time, name, phone order.
    pub fn next_state(&self) -> ConversationState {
        if self.date.is_none() {
            ConversationState::CollectingDate
        } else if self.time.is_none() {
            ConversationState::CollectingTime
        } else if self.name.is_none() {
            ConversationState::CollectingName
        } else if self.phone.is_none() {
            ConversationState::CollectingPhone
        } else {
            ConversationState::Confirming
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PendingBooking::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub session_id: String,
    pub state: ConversationState,
    pub pending: PendingBooking,
    /// Free times last suggested for `pending.date` after a conflict.
    #[serde(default)]
    pub offered: Vec<NaiveTime>,
    pub last_activity: NaiveDateTime,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: ConversationState::CollectingDate,
            pending: PendingBooking::default(),
            offered: vec![],
            last_activity: Utc::now().naive_utc(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ConversationState::CollectingDate;
        self.pending = PendingBooking::default();
        self.offered.clear();
    }
}
