use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub available: bool,
}

impl Slot {
    pub fn display_time(&self) -> String {
        display_time(self.time)
    }
}

/// Coarse period of the day used when the caller gives no exact time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Morning => "morning",
            TimeBucket::Afternoon => "afternoon",
            TimeBucket::Evening => "evening",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Some(TimeBucket::Morning),
            "afternoon" => Some(TimeBucket::Afternoon),
            "evening" => Some(TimeBucket::Evening),
            _ => None,
        }
    }

    /// Inclusive start and end of the bucket.
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        match self {
            TimeBucket::Morning => (hm(9, 0), hm(12, 0)),
            TimeBucket::Afternoon => (hm(12, 30), hm(16, 0)),
            TimeBucket::Evening => (hm(16, 30), hm(19, 30)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum TimeSpec {
    At(NaiveTime),
    Bucket(TimeBucket),
}

impl TimeSpec {
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        match self {
            TimeSpec::At(t) => (*t, *t),
            TimeSpec::Bucket(b) => b.window(),
        }
    }

    /// Phrase that completes "at ..." / "in the ..." in prompts.
    pub fn describe(&self) -> String {
        match self {
            TimeSpec::At(t) => format!("at {}", display_time(*t)),
            TimeSpec::Bucket(b) => format!("in the {}", b.as_str()),
        }
    }
}

pub fn display_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

pub(crate) fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_time_is_twelve_hour() {
        assert_eq!(display_time(hm(9, 0)), "9:00 AM");
        assert_eq!(display_time(hm(12, 30)), "12:30 PM");
        assert_eq!(display_time(hm(19, 30)), "7:30 PM");
        assert_eq!(display_time(hm(0, 15)), "12:15 AM");
    }

    #[test]
    fn test_display_date() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 25).unwrap();
        assert_eq!(display_date(date), "Sunday, May 25");
    }

    #[test]
    fn test_bucket_windows() {
        assert_eq!(TimeBucket::Morning.window(), (hm(9, 0), hm(12, 0)));
        assert_eq!(TimeBucket::Afternoon.window(), (hm(12, 30), hm(16, 0)));
        assert_eq!(TimeBucket::Evening.window(), (hm(16, 30), hm(19, 30)));
        assert_eq!(TimeSpec::At(hm(10, 0)).window(), (hm(10, 0), hm(10, 0)));
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!(TimeBucket::parse(" Morning "), Some(TimeBucket::Morning));
        assert_eq!(TimeBucket::parse("evening"), Some(TimeBucket::Evening));
        assert_eq!(TimeBucket::parse("night"), None);
    }

    #[test]
    fn test_time_spec_describe() {
        assert_eq!(TimeSpec::At(hm(14, 0)).describe(), "at 2:00 PM");
        assert_eq!(TimeSpec::Bucket(TimeBucket::Afternoon).describe(), "in the afternoon");
    }
}
