use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::slot::{display_time, hm};

/// The doctor's fixed daily grid of bookable start times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            open: hm(9, 0),
            close: hm(19, 30),
            slot_minutes: 30,
        }
    }
}

impl Schedule {
    pub fn new(open: &str, close: &str, slot_minutes: u32) -> anyhow::Result<Self> {
        let open = parse_time(open)?;
        let close = parse_time(close)?;
        if close < open {
            return Err(anyhow::anyhow!(
                "closing time {close} is before opening time {open}"
            ));
        }
        if slot_minutes == 0 || slot_minutes > 24 * 60 {
            return Err(anyhow::anyhow!("invalid slot length: {slot_minutes} minutes"));
        }
        Ok(Self {
            open,
            close,
            slot_minutes,
        })
    }

    /// Every slot start from `open` up to and including `close`.
    pub fn slot_times(&self) -> Vec<NaiveTime> {
        let first = minutes_of(self.open);
        let last = minutes_of(self.close);

        (first..=last)
            .step_by(self.slot_minutes as usize)
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .collect()
    }

    pub fn to_human_readable(&self) -> String {
        format!(
            "{} - {}, every {} minutes",
            display_time(self.open),
            display_time(self.close),
            self.slot_minutes
        )
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}
