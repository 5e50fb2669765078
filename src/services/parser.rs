//! Free-form text to booking fields.
//!
//! Everything here is pure: the caller supplies `today` so relative dates
//! ("tomorrow", "friday", "25th May") resolve deterministically.

use std::ops::Range;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::models::{CancelIntent, ParsedTurn, TimeBucket, TimeSpec};

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Words that end a name or can never be one.
const NOT_NAME: &[&str] = &[
    "a", "an", "and", "appointment", "at", "available", "book", "booking", "but", "calling",
    "cancel", "doctor", "dr", "for", "free", "from", "going", "good", "great", "hello", "hey", "hi",
    "here", "in", "interested", "just", "looking", "morning", "afternoon", "evening", "my", "need",
    "no", "not", "number", "ok", "okay", "on", "phone", "please", "schedule", "so", "sure",
    "thanks", "thank", "the", "to", "today", "tomorrow", "trying", "want", "wanting", "with", "yes",
];

fn cached(cell: &'static OnceLock<Regex>, pattern: impl FnOnce() -> String) -> &'static Regex {
    cell.get_or_init(|| Regex::new(&pattern()).expect("static parser pattern"))
}

fn time_12h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        r"\b(\d{1,2})(?:[:.](\d{2}))?\s*(a\.?m\.?|p\.?m\.?)(?:[^a-z]|$)".to_string()
    })
}

fn time_24h() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\b([01]?\d|2[0-3]):([0-5]\d)\b".to_string())
}

fn noon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\b(noon|midday)\b".to_string())
}

fn bucket() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\b(morning|afternoon|evening)\b".to_string())
}

fn iso_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b".to_string())
}

fn day_month() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        format!(r"\b(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?")
    })
}

fn month_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        format!(r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?")
    })
}

fn relative_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\b(day after tomorrow|tomorrow|today)\b".to_string())
}

fn weekday() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        r"\b(?:next\s+|this\s+|on\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"
            .to_string()
    })
}

fn phone() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\+?\(?\d[\d\s().-]{5,}\d".to_string())
}

fn name_intro() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        r"\b(?:my name is|my name's|name is|name:|i am|i'm|this is|it's|call me)\s+([a-z][a-z'\s-]*)"
            .to_string()
    })
}

fn cancel_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || r"\bcancel".to_string())
}

fn booking_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, || {
        r"(?:book-|booking\s+(?:number\s+|no\.?\s*|#\s*)?|#\s*|number\s+|appointment\s+)(\d{1,9})\b"
            .to_string()
    })
}

/// Extracts whatever booking fields `text` contains.
pub fn parse(text: &str, today: NaiveDate) -> ParsedTurn {
    let mut work = text.to_lowercase();
    let mut turn = ParsedTurn::default();

    if cancel_word().is_match(&work) {
        let number = booking_ref()
            .captures(&work)
            .and_then(|c| c[1].parse::<i64>().ok());
        turn.cancel = Some(match number {
            Some(n) => CancelIntent::Booking(n),
            None => CancelIntent::Unspecified,
        });
        return turn;
    }

    if let Some((date, span)) = find_date(&work, today) {
        turn.date = Some(date);
        blank(&mut work, span);
    }
    if let Some((time, span)) = find_time(&work) {
        turn.time = Some(time);
        blank(&mut work, span);
    }
    if let Some((phone, span)) = find_phone(&work) {
        turn.phone = Some(phone);
        blank(&mut work, span);
    }
    turn.name = find_name(&work);

    turn
}

/// Date alone, for structured requests. Accepts the same forms as `parse`.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    find_date(&text.to_lowercase(), today).map(|(date, _)| date)
}

/// Exact time ("9:00 AM", "14:30") or bucket ("morning").
pub fn parse_time_spec(text: &str) -> Option<TimeSpec> {
    find_time(&text.to_lowercase()).map(|(spec, _)| spec)
}

/// Keeps digits and a leading `+`. Returns an empty string if there are no digits.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

/// Treats a short, purely alphabetic reply as a name ("jane doe").
pub fn bare_name(text: &str) -> Option<String> {
    let lowered = text.trim().trim_end_matches(['.', '!']).to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return None;
    }
    let plausible = words.iter().all(|w| {
        w.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-') && !NOT_NAME.contains(w)
    });
    if !plausible {
        return None;
    }
    Some(title_case(&words))
}

fn find_date(text: &str, today: NaiveDate) -> Option<(NaiveDate, Range<usize>)> {
    if let Some(c) = iso_date().captures(text) {
        let year: i32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let day: u32 = c[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some((date, c.get(0)?.range()));
        }
    }

    if let Some(c) = day_month().captures(text) {
        let day: u32 = c[1].parse().ok()?;
        let month = month_number(&c[2])?;
        let year = c.get(3).and_then(|y| y.as_str().parse().ok());
        if let Some(date) = resolve_date(day, month, year, today) {
            return Some((date, c.get(0)?.range()));
        }
    }

    if let Some(c) = month_day().captures(text) {
        let month = month_number(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        let year = c.get(3).and_then(|y| y.as_str().parse().ok());
        if let Some(date) = resolve_date(day, month, year, today) {
            return Some((date, c.get(0)?.range()));
        }
    }

    if let Some(c) = relative_day().captures(text) {
        let offset = match &c[1] {
            "today" => 0,
            "tomorrow" => 1,
            _ => 2,
        };
        return Some((today + Duration::days(offset), c.get(0)?.range()));
    }

    if let Some(c) = weekday().captures(text) {
        let target = WEEKDAYS.iter().find(|(name, _)| *name == &c[1])?.1;
        let ahead = (7 + target.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            % 7;
        let ahead = if ahead == 0 { 7 } else { ahead };
        return Some((today + Duration::days(ahead), c.get(0)?.range()));
    }

    None
}

/// Year-less dates land in `today`'s year, or the next one if already past.
fn resolve_date(day: u32, month: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match &name[..3.min(name.len())] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_time(text: &str) -> Option<(TimeSpec, Range<usize>)> {
    if let Some(c) = time_12h().captures(text) {
        let hour: u32 = c[1].parse().ok()?;
        let minute: u32 = c.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        let pm = c[3].starts_with('p');
        if (1..=12).contains(&hour) {
            let hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
            if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
                return Some((TimeSpec::At(time), c.get(0)?.range()));
            }
        }
    }

    if let Some(c) = time_24h().captures(text) {
        let hour: u32 = c[1].parse().ok()?;
        let minute: u32 = c[2].parse().ok()?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        return Some((TimeSpec::At(time), c.get(0)?.range()));
    }

    if let Some(m) = noon().find(text) {
        let time = NaiveTime::from_hms_opt(12, 0, 0)?;
        return Some((TimeSpec::At(time), m.range()));
    }

    let m = bucket().find(text)?;
    let bucket = TimeBucket::parse(m.as_str())?;
    Some((TimeSpec::Bucket(bucket), m.range()))
}

fn find_phone(text: &str) -> Option<(String, Range<usize>)> {
    phone().find_iter(text).find_map(|m| {
        let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
        if (7..=15).contains(&digits) {
            Some((normalize_phone(m.as_str()), m.range()))
        } else {
            None
        }
    })
}

fn find_name(text: &str) -> Option<String> {
    let c = name_intro().captures(text)?;
    let words: Vec<&str> = c[1]
        .split_whitespace()
        .take_while(|w| !NOT_NAME.contains(w))
        .take(4)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(title_case(&words))
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn blank(text: &mut String, span: Range<usize>) {
    let filler = " ".repeat(span.len());
    text.replace_range(span, &filler);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        // A Thursday.
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> Option<TimeSpec> {
        Some(TimeSpec::At(NaiveTime::from_hms_opt(h, m, 0).unwrap()))
    }

    #[test]
    fn test_full_request() {
        let turn = parse(
            "Book my appointment on 25th May at 9:00 AM, my name is jane doe, phone 555-1234",
            today(),
        );
        assert_eq!(turn.date, Some(ymd(2025, 5, 25)));
        assert_eq!(turn.time, at(9, 0));
        assert_eq!(turn.name.as_deref(), Some("Jane Doe"));
        assert_eq!(turn.phone.as_deref(), Some("5551234"));
        assert_eq!(turn.cancel, None);
    }

    #[test]
    fn test_bucket_request() {
        let turn = parse("Book for 25th May morning", today());
        assert_eq!(turn.date, Some(ymd(2025, 5, 25)));
        assert_eq!(turn.time, Some(TimeSpec::Bucket(TimeBucket::Morning)));
        assert_eq!(turn.name, None);
        assert_eq!(turn.phone, None);
    }

    #[test]
    fn test_exact_time_wins_over_bucket() {
        let turn = parse("tomorrow morning at 10:30 am", today());
        assert_eq!(turn.date, Some(ymd(2025, 5, 2)));
        assert_eq!(turn.time, at(10, 30));
    }

    #[test]
    fn test_date_forms() {
        assert_eq!(parse_date("May 25", today()), Some(ymd(2025, 5, 25)));
        assert_eq!(parse_date("25 may", today()), Some(ymd(2025, 5, 25)));
        assert_eq!(parse_date("the 3rd of june", today()), Some(ymd(2025, 6, 3)));
        assert_eq!(parse_date("2026-01-09", today()), Some(ymd(2026, 1, 9)));
        assert_eq!(parse_date("25th May 2027", today()), Some(ymd(2027, 5, 25)));
        assert_eq!(parse_date("today", today()), Some(today()));
        assert_eq!(parse_date("day after tomorrow", today()), Some(ymd(2025, 5, 3)));
        assert_eq!(parse_date("31st february", today()), None);
        assert_eq!(parse_date("whenever", today()), None);
    }

    #[test]
    fn test_past_yearless_date_rolls_forward() {
        assert_eq!(parse_date("2nd january", today()), Some(ymd(2026, 1, 2)));
        assert_eq!(parse_date("1 may", today()), Some(today()));
    }

    #[test]
    fn test_weekday_is_always_ahead() {
        assert_eq!(parse_date("next monday", today()), Some(ymd(2025, 5, 5)));
        assert_eq!(parse_date("on friday", today()), Some(ymd(2025, 5, 2)));
        assert_eq!(parse_date("thursday", today()), Some(ymd(2025, 5, 8)));
    }

    #[test]
    fn test_time_forms() {
        assert_eq!(parse_time_spec("9am"), at(9, 0));
        assert_eq!(parse_time_spec("2.30 pm"), at(14, 30));
        assert_eq!(parse_time_spec("12 pm"), at(12, 0));
        assert_eq!(parse_time_spec("12:15 a.m."), at(0, 15));
        assert_eq!(parse_time_spec("14:30"), at(14, 30));
        assert_eq!(parse_time_spec("noon"), at(12, 0));
        assert_eq!(
            parse_time_spec("Evening"),
            Some(TimeSpec::Bucket(TimeBucket::Evening))
        );
        assert_eq!(parse_time_spec("13 pm"), None);
        assert_eq!(parse_time_spec("whenever"), None);
    }

    #[test]
    fn test_date_digits_are_not_a_phone() {
        let turn = parse("2025-05-25 at 14:00", today());
        assert_eq!(turn.date, Some(ymd(2025, 5, 25)));
        assert_eq!(turn.time, at(14, 0));
        assert_eq!(turn.phone, None);
    }

    #[test]
    fn test_phone_forms() {
        assert_eq!(parse("call me on 987 654 3210", today()).phone.as_deref(), Some("9876543210"));
        assert_eq!(parse("+1 (555) 123-4567", today()).phone.as_deref(), Some("+15551234567"));
        assert_eq!(parse("room 42", today()).phone, None);
    }

    #[test]
    fn test_name_stops_at_connectors() {
        let turn = parse("I'm john smith and my number is 5551234567", today());
        assert_eq!(turn.name.as_deref(), Some("John Smith"));
        assert_eq!(turn.phone.as_deref(), Some("5551234567"));

        assert_eq!(parse("i am looking for a slot", today()).name, None);
    }

    #[test]
    fn test_cancel_intent() {
        assert_eq!(
            parse("please cancel booking 3", today()).cancel,
            Some(CancelIntent::Booking(3))
        );
        assert_eq!(
            parse("Cancel BOOK-12", today()).cancel,
            Some(CancelIntent::Booking(12))
        );
        assert_eq!(
            parse("cancel my appointment", today()).cancel,
            Some(CancelIntent::Unspecified)
        );
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("jane doe"), Some("Jane Doe".to_string()));
        assert_eq!(bare_name("Priya."), Some("Priya".to_string()));
        assert_eq!(bare_name("yes please"), None);
        assert_eq!(bare_name("5551234"), None);
        assert_eq!(bare_name(""), None);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" 555-1234 "), "5551234");
        assert_eq!(normalize_phone("+44 20 7946 0958"), "+442079460958");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_empty_turn() {
        assert!(parse("hello there", today()).is_empty());
    }
}
