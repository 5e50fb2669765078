use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slot::TimeSpec;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelIntent {
    Booking(i64),
    Unspecified,
}

/// Fields recognised in one user turn. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedTurn {
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSpec>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub cancel: Option<CancelIntent>,
}

impl ParsedTurn {
    pub fn is_empty(&self) -> bool {
        *self == ParsedTurn::default()
    }

    pub fn has_date_or_time(&self) -> bool {
        self.date.is_some() || self.time.is_some()
    }
}
