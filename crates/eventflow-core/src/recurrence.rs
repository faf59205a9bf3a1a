//! Recurrence rule types.
//!
//! A recurring event carries a [`RecurrenceRule`] describing how it repeats.
//! The rule itself is only a description: expanding it into concrete
//! occurrences is the job of the remote event store.
//!
//! Two shapes exist for every rule:
//! - [`RecurrenceRule`]: the validated form, as stored by the collaborator
//! - [`RuleDraft`]: the candidate form edited by a user, which may still be invalid
//!
//! [`Recurrence`] is the form-level switch between "does not repeat" and
//! "repeats according to this draft".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

static RELATIVE_DAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)([A-Z]{2})$").expect("Invalid relative day regex")
});

/// Largest absolute ordinal accepted in a relative day ("fifth Monday").
const MAX_ORDINAL: i8 = 5;

/// Errors produced when parsing the textual forms of rule components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("unknown weekday code: {0}")]
    UnknownWeekday(String),

    #[error("invalid relative day '{0}' (expected e.g. 1MO or -1SU)")]
    InvalidRelativeDay(String),
}

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// All frequencies in ascending period order.
    pub const ALL: [Frequency; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    /// Returns the wire name of this frequency.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Returns the singular unit name used in human-readable summaries.
    fn unit(&self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
            Self::Yearly => "year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|freq| freq.as_str() == upper)
            .ok_or_else(|| RuleParseError::UnknownFrequency(s.to_string()))
    }
}

/// Two-letter RFC 5545 code for a weekday.
fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parses a weekday from its two- or three-letter code (`MO`, `MON`).
fn parse_weekday_code(code: &str) -> Result<Weekday, RuleParseError> {
    let upper = code.trim().to_ascii_uppercase();
    let day = match upper.as_str() {
        "MO" | "MON" => Weekday::Mon,
        "TU" | "TUE" => Weekday::Tue,
        "WE" | "WED" => Weekday::Wed,
        "TH" | "THU" => Weekday::Thu,
        "FR" | "FRI" => Weekday::Fri,
        "SA" | "SAT" => Weekday::Sat,
        "SU" | "SUN" => Weekday::Sun,
        _ => return Err(RuleParseError::UnknownWeekday(code.trim().to_string())),
    };
    Ok(day)
}

/// An ordered, duplicate-free set of weekdays for weekly rules.
///
/// The textual form is a comma-separated list of codes. Both `MON,WED` and
/// `MO,WE` are accepted; the canonical output is always the two-letter form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet {
    days: Vec<Weekday>,
}

impl WeekdaySet {
    /// Builds a set from any sequence of weekdays.
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        Self { days }
    }

    /// Returns true if the set contains the given day.
    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// Returns true if no day is selected.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Iterates the selected days, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.iter().copied()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.days.iter().map(|d| weekday_code(*d)).collect();
        f.write_str(&codes.join(","))
    }
}

impl FromStr for WeekdaySet {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(parse_weekday_code)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(days))
    }
}

/// An ordinal weekday within a month, such as "first Monday" (`1MO`) or
/// "last Sunday" (`-1SU`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeDay {
    ordinal: i8,
    weekday: Weekday,
}

impl RelativeDay {
    /// Creates a relative day. The ordinal must be non-zero and within ±5.
    pub fn new(ordinal: i8, weekday: Weekday) -> Result<Self, RuleParseError> {
        if ordinal == 0 || ordinal.abs() > MAX_ORDINAL {
            return Err(RuleParseError::InvalidRelativeDay(format!(
                "{}{}",
                ordinal,
                weekday_code(weekday)
            )));
        }
        Ok(Self { ordinal, weekday })
    }

    /// Signed position in the month; negative counts from the end.
    pub fn ordinal(&self) -> i8 {
        self.ordinal
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }
}

impl fmt::Display for RelativeDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.ordinal, weekday_code(self.weekday))
    }
}

impl FromStr for RelativeDay {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuleParseError::InvalidRelativeDay(s.to_string());
        let upper = s.trim().to_ascii_uppercase();
        let caps = RELATIVE_DAY_REGEX.captures(&upper).ok_or_else(invalid)?;
        let ordinal: i8 = caps[1].parse().map_err(|_| invalid())?;
        let weekday = parse_weekday_code(&caps[2]).map_err(|_| invalid())?;
        Self::new(ordinal, weekday).map_err(|_| invalid())
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(WeekdaySet);
string_serde!(RelativeDay);

/// Serde adapter for optional code fields where the store may send `""`
/// instead of `null`.
///
/// Reading is lenient: a stored value that does not parse is logged and
/// dropped so one odd record cannot fail a whole listing. Strict parsing
/// stays on the input path through `FromStr`.
mod optional_code {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => match s.parse() {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    warn!(value = s, error = %err, "ignoring unreadable rule field");
                    Ok(None)
                }
            },
        }
    }
}

/// A validated recurrence rule, as persisted by the event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Unit of repetition.
    pub frequency: Frequency,
    /// Repeat every `interval` units of `frequency`; always at least 1.
    pub interval: u32,
    /// Days of the week, meaningful for weekly rules.
    #[serde(default, with = "optional_code")]
    pub weekdays: Option<WeekdaySet>,
    /// Ordinal weekday, meaningful for monthly rules.
    #[serde(default, with = "optional_code")]
    pub relative_day: Option<RelativeDay>,
    /// No occurrence starts after this date. Absent means unbounded.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Creates a rule repeating every unit of `frequency`.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            weekdays: None,
            relative_day: None,
            end_date: None,
        }
    }

    /// Short human-readable summary, e.g. "every 2 weeks on MO,WE until 2024-03-01".
    pub fn summary(&self) -> String {
        let unit = self.frequency.unit();
        let mut out = if self.interval == 1 {
            format!("every {}", unit)
        } else {
            format!("every {} {}s", self.interval, unit)
        };
        if self.frequency == Frequency::Weekly
            && let Some(days) = self.weekdays.as_ref().filter(|d| !d.is_empty())
        {
            out.push_str(&format!(" on {}", days));
        }
        if self.frequency == Frequency::Monthly
            && let Some(day) = self.relative_day
        {
            out.push_str(&format!(" on {}", day));
        }
        if let Some(end) = self.end_date {
            out.push_str(&format!(" until {}", end));
        }
        out
    }
}

/// A recurrence rule as edited in a form, before validation.
///
/// Unlike [`RecurrenceRule`], the frequency may be unset and the interval may
/// hold any integer, so that invalid input can be represented and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    pub frequency: Option<Frequency>,
    pub interval: i64,
    pub weekdays: Option<WeekdaySet>,
    pub relative_day: Option<RelativeDay>,
    pub end_date: Option<NaiveDate>,
}

impl Default for RuleDraft {
    /// The initial state when a user first turns recurrence on: daily, every day.
    fn default() -> Self {
        Self {
            frequency: Some(Frequency::Daily),
            interval: 1,
            weekdays: None,
            relative_day: None,
            end_date: None,
        }
    }
}

impl From<RecurrenceRule> for RuleDraft {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            frequency: Some(rule.frequency),
            interval: i64::from(rule.interval),
            weekdays: rule.weekdays,
            relative_day: rule.relative_day,
            end_date: rule.end_date,
        }
    }
}

/// Form-level recurrence state: either the event does not repeat, or it
/// repeats according to a draft rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Recurrence {
    #[default]
    None,
    Recurring(RuleDraft),
}

impl Recurrence {
    /// Returns true if recurrence is switched on.
    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::Recurring(_))
    }

    /// Flips the recurrence toggle. Turning it on starts from the default
    /// draft; turning it off discards the draft.
    pub fn toggle(&mut self) {
        *self = match self {
            Self::None => Self::Recurring(RuleDraft::default()),
            Self::Recurring(_) => Self::None,
        };
    }
}

impl From<Option<RecurrenceRule>> for Recurrence {
    fn from(rule: Option<RecurrenceRule>) -> Self {
        match rule {
            Some(rule) => Self::Recurring(rule.into()),
            None => Self::None,
        }
    }
}
