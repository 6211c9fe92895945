//! Timestamp resolution for forum posts
//!
//! Forum timestamps arrive as free-form text: relative phrases such as
//! `3 days ago`, day keywords such as `Yesterday at 4:12 PM`, or absolute
//! dates such as `May 5, 2020 at 3:14 PM`. This module resolves them into
//! naive local instants and reduces the distance between two instants to a
//! single human-readable unit.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use forum_harvest::parser::timestamp::{RelativeCategory, TimestampResolver};
//!
//! let anchor = NaiveDate::from_ymd_opt(2024, 6, 15)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let resolver = TimestampResolver::with_reference(anchor);
//!
//! assert_eq!(resolver.diff(anchor, "3 days ago"), RelativeCategory::Days(3));
//! assert_eq!(resolver.diff(anchor, "not a date").to_string(), "N/A");
//! ```

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::utils::normalize_whitespace;

/// Output format for resolved query instants
pub const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Upper bound for a single relative amount (`100000 days ago` and beyond is noise)
const MAX_RELATIVE_AMOUNT: i64 = 100_000;

static UNIT_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d+|an|a|one)\s+(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?|yrs?)\b",
    )
    .unwrap()
});

static DAY_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(today|yesterday)(?:\s+at)?(?:\s+(.+))?$").unwrap());

/// Phrases that resolve to the anchor itself
const INSTANT_PHRASES: &[&str] = &[
    "just now",
    "now",
    "moments ago",
    "a moment ago",
    "a few seconds ago",
    "few seconds ago",
    "seconds ago",
];

/// Absolute date-time formats, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y at %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

/// Absolute date-only formats, tried in order
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%d %B %Y"];

/// Formats without a year; the anchor's year is appended before parsing
const YEARLESS_DATETIME_FORMATS: &[&str] = &["%B %d at %I:%M %p %Y", "%B %d %I:%M %p %Y"];
const YEARLESS_DATE_FORMATS: &[&str] = &["%B %d %Y"];

/// Time-of-day formats accepted after `today` / `yesterday`
const TIME_FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M:%S", "%H:%M"];

/// Coarsest non-zero unit of a calendar delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeCategory {
    Years(u32),
    Months(u32),
    Days(u32),
    Hours(u32),
    Minutes(u32),
    JustNow,
    Unresolved,
}

impl RelativeCategory {
    /// Whether the category carries a resolved delta
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for RelativeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(n) => write!(f, "{n} years ago"),
            Self::Months(n) => write!(f, "{n} months ago"),
            Self::Days(n) => write!(f, "{n} days ago"),
            Self::Hours(n) => write!(f, "{n} hours ago"),
            Self::Minutes(n) => write!(f, "{n} minutes ago"),
            Self::JustNow => f.write_str("just now"),
            Self::Unresolved => f.write_str("N/A"),
        }
    }
}

/// Calendar-aware difference between two instants
///
/// Whole months are counted first (with end-of-month clamping); the remainder
/// is split into days, hours and minutes. Seconds are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarDelta {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl CalendarDelta {
    /// Compute the delta between two instants, independent of their order
    pub fn between(a: NaiveDateTime, b: NaiveDateTime) -> Self {
        let (later, earlier) = if a >= b { (a, b) } else { (b, a) };

        let mut total_months = (later.year() - earlier.year()) * 12 + later.month() as i32
            - earlier.month() as i32;
        let mut shifted = shift_months(earlier, total_months);
        while total_months > 0 && shifted > later {
            total_months -= 1;
            shifted = shift_months(earlier, total_months);
        }

        let rest = later - shifted;
        let days = rest.num_days();
        let hours = rest.num_hours() - days * 24;
        let minutes = rest.num_minutes() - rest.num_hours() * 60;

        Self {
            years: (total_months / 12) as u32,
            months: (total_months % 12) as u32,
            days: days as u32,
            hours: hours as u32,
            minutes: minutes as u32,
        }
    }

    /// Reduce the delta to its coarsest non-zero unit
    pub fn coarsest(&self) -> RelativeCategory {
        if self.years > 0 {
            RelativeCategory::Years(self.years)
        } else if self.months > 0 {
            RelativeCategory::Months(self.months)
        } else if self.days > 0 {
            RelativeCategory::Days(self.days)
        } else if self.hours > 0 {
            RelativeCategory::Hours(self.hours)
        } else if self.minutes > 0 {
            RelativeCategory::Minutes(self.minutes)
        } else {
            RelativeCategory::JustNow
        }
    }
}

fn shift_months(instant: NaiveDateTime, months: i32) -> NaiveDateTime {
    instant
        .checked_add_months(Months::new(months.max(0) as u32))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Resolves free-form timestamp text against a reference clock
#[derive(Debug, Clone, Default)]
pub struct TimestampResolver {
    reference: Option<NaiveDateTime>,
}

impl TimestampResolver {
    /// Resolver anchored to the local wall clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver anchored to a fixed instant (deterministic replays)
    pub fn with_reference(reference: NaiveDateTime) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    /// Current instant according to the reference clock
    pub fn now(&self) -> NaiveDateTime {
        self.reference
            .unwrap_or_else(|| Local::now().naive_local())
    }

    /// Resolve text relative to the reference clock
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        self.parse_relative_to(text, self.now())
    }

    /// Resolve text relative to an explicit anchor
    ///
    /// Returns `None` when the text cannot be interpreted.
    pub fn parse_relative_to(&self, text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
        let original = normalize_whitespace(text);
        if original.is_empty() {
            return None;
        }
        let cleaned = original.to_lowercase();

        if INSTANT_PHRASES.contains(&cleaned.as_str()) {
            return Some(anchor);
        }

        parse_relative(&cleaned, anchor)
            .or_else(|| parse_day_keyword(&cleaned, anchor))
            .or_else(|| parse_absolute(&cleaned, anchor))
            .or_else(|| {
                DateTime::parse_from_rfc3339(&original)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }

    /// Coarsest-unit category for the distance between two instants
    pub fn relative_category(anchor: NaiveDateTime, other: NaiveDateTime) -> RelativeCategory {
        CalendarDelta::between(anchor, other).coarsest()
    }

    /// Resolve `response_text` against `query_instant` and categorize the gap
    pub fn diff(&self, query_instant: NaiveDateTime, response_text: &str) -> RelativeCategory {
        match self.parse_relative_to(response_text, query_instant) {
            Some(response_instant) => Self::relative_category(query_instant, response_instant),
            None => RelativeCategory::Unresolved,
        }
    }

    /// Format an instant for the query timestamp column
    pub fn format_instant(instant: NaiveDateTime) -> String {
        instant.format(INSTANT_FORMAT).to_string()
    }
}

/// `3 days ago`, `1 year, 2 months ago`, `in 5 minutes`
fn parse_relative(text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    let (body, forward) = if let Some(body) = text.strip_suffix("ago") {
        (body.trim(), false)
    } else if let Some(body) = text.strip_prefix("in ") {
        (body.trim(), true)
    } else {
        return None;
    };

    let leftover = UNIT_PAIR_RE.replace_all(body, "");
    let fully_matched = leftover
        .split(|c: char| c == ',' || c.is_whitespace())
        .all(|word| word.is_empty() || word == "and");
    if !fully_matched {
        return None;
    }

    let mut months: i64 = 0;
    let mut offset = Duration::zero();
    let mut matched = false;

    for caps in UNIT_PAIR_RE.captures_iter(body) {
        matched = true;
        let amount: i64 = match &caps[1] {
            "a" | "an" | "one" => 1,
            digits => digits.parse().ok()?,
        };
        if amount > MAX_RELATIVE_AMOUNT {
            return None;
        }

        let unit = &caps[2];
        if unit.starts_with("sec") {
            offset += Duration::seconds(amount);
        } else if unit.starts_with("min") {
            offset += Duration::minutes(amount);
        } else if unit.starts_with("h") {
            offset += Duration::hours(amount);
        } else if unit.starts_with("day") {
            offset += Duration::days(amount);
        } else if unit.starts_with("week") {
            offset += Duration::weeks(amount);
        } else if unit.starts_with("month") {
            months += amount;
        } else {
            months += amount * 12;
        }
    }

    if !matched {
        return None;
    }

    let months = Months::new(u32::try_from(months).ok()?);
    if forward {
        anchor
            .checked_add_months(months)?
            .checked_add_signed(offset)
    } else {
        anchor
            .checked_sub_months(months)?
            .checked_sub_signed(offset)
    }
}

/// `today`, `yesterday at 4:12 pm`
fn parse_day_keyword(text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = DAY_KEYWORD_RE.captures(text)?;
    let day_offset = if &caps[1] == "yesterday" { 1 } else { 0 };
    let base = anchor.checked_sub_signed(Duration::days(day_offset))?;

    match caps.get(2) {
        None => Some(base),
        Some(time_text) => {
            let time = TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(time_text.as_str(), fmt).ok())?;
            Some(base.date().and_time(time))
        }
    }
}

fn parse_absolute(text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(instant) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(instant);
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return date.and_hms_opt(0, 0, 0);
    }

    let with_year = format!("{text} {}", anchor.year());
    if let Some(instant) = YEARLESS_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&with_year, fmt).ok())
    {
        return Some(instant);
    }

    YEARLESS_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
