//! Field-level validation for event and recurrence drafts.
//!
//! Validation never stops at the first problem: every check runs and all
//! violations are returned together so a form can show them at once.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::EventDraft;
use crate::recurrence::{Recurrence, RecurrenceRule, RuleDraft};

/// A form field that can carry a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    StartTime,
    EndTime,
    Frequency,
    Interval,
    EndDate,
}

impl Field {
    /// Returns the field name as used in error output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::Frequency => "frequency",
            Self::Interval => "interval",
            Self::EndDate => "end_date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The full set of violations found in a draft. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct Violations(Vec<FieldViolation>);

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if any violation targets `field`.
    pub fn contains(&self, field: Field) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// Returns the message for `field`, if it has one.
    pub fn message_for(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|v| v.field == field).map(|v| v.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldViolation> {
        self.0.iter()
    }

    fn push(&mut self, field: Field, message: &'static str) {
        self.0.push(FieldViolation { field, message });
    }

    fn merge(&mut self, other: Violations) {
        self.0.extend(other.0);
    }
}

impl IntoIterator for Violations {
    type Item = FieldViolation;
    type IntoIter = std::vec::IntoIter<FieldViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Checks a candidate recurrence rule against the owning event's start.
///
/// The end-date check is skipped when `start` is unknown; the missing start
/// is reported by [`validate_event`].
pub fn validate_rule(rule: &RuleDraft, start: Option<DateTime<Utc>>) -> Violations {
    let mut violations = Violations::default();
    if rule.frequency.is_none() {
        violations.push(Field::Frequency, "Frequency is required");
    }
    if rule.interval < 1 || u32::try_from(rule.interval).is_err() {
        violations.push(Field::Interval, "Interval must be at least 1");
    }
    if let (Some(end_date), Some(start)) = (rule.end_date, start)
        && end_date < start.date_naive()
    {
        violations.push(Field::EndDate, "End date must be after start time");
    }
    violations
}

/// Checks an event draft, including its recurrence rule when switched on.
pub fn validate_event(draft: &EventDraft) -> Violations {
    let mut violations = Violations::default();
    if draft.title.trim().is_empty() {
        violations.push(Field::Title, "Title is required");
    }
    if draft.start_time.is_none() {
        violations.push(Field::StartTime, "Start time is required");
    }
    match (draft.start_time, draft.end_time) {
        (_, None) => violations.push(Field::EndTime, "End time is required"),
        (Some(start), Some(end)) if start >= end => {
            violations.push(Field::EndTime, "End time must be after start time")
        }
        _ => {}
    }
    if let Recurrence::Recurring(rule) = &draft.recurrence {
        violations.merge(validate_rule(rule, draft.start_time));
    }
    violations
}

/// Turns a rule draft into a persisted rule, or returns its violations.
pub(crate) fn finish_rule(
    draft: RuleDraft,
    start: DateTime<Utc>,
) -> Result<RecurrenceRule, Violations> {
    let violations = validate_rule(&draft, Some(start));
    let (Some(frequency), Ok(interval)) = (draft.frequency, u32::try_from(draft.interval)) else {
        return Err(violations);
    };
    if !violations.is_empty() {
        return Err(violations);
    }
    Ok(RecurrenceRule {
        frequency,
        interval,
        weekdays: draft.weekdays,
        relative_day: draft.relative_day,
        end_date: draft.end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Frequency;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, min, 0).unwrap()
    }

    fn weekly() -> RuleDraft {
        RuleDraft {
            frequency: Some(Frequency::Weekly),
            interval: 1,
            weekdays: Some("MON,WED".parse().unwrap()),
            relative_day: None,
            end_date: NaiveDate::from_ymd_opt(2024, 1, 8),
        }
    }

    mod rule {
        use super::*;

        #[test]
        fn valid_rules_have_no_violations() {
            for frequency in Frequency::ALL {
                for interval in [1, 2, 52] {
                    let draft = RuleDraft {
                        frequency: Some(frequency),
                        interval,
                        ..weekly()
                    };
                    assert!(validate_rule(&draft, Some(at(9, 0))).is_empty());
                }
            }
        }

        #[test]
        fn non_positive_interval_is_rejected() {
            for interval in [0, -1, -100] {
                let draft = RuleDraft { interval, ..weekly() };
                let violations = validate_rule(&draft, Some(at(9, 0)));
                assert_eq!(
                    violations.message_for(Field::Interval),
                    Some("Interval must be at least 1")
                );
            }
        }

        #[test]
        fn missing_frequency_is_rejected() {
            let draft = RuleDraft {
                frequency: None,
                ..weekly()
            };
            let violations = validate_rule(&draft, Some(at(9, 0)));
            assert!(violations.contains(Field::Frequency));
            assert_eq!(violations.len(), 1);
        }

        #[test]
        fn end_date_before_start_date_is_rejected() {
            let draft = RuleDraft {
                end_date: NaiveDate::from_ymd_opt(2023, 12, 31),
                ..weekly()
            };
            let violations = validate_rule(&draft, Some(at(9, 0)));
            assert_eq!(
                violations.message_for(Field::EndDate),
                Some("End date must be after start time")
            );
        }

        #[test]
        fn end_date_on_start_date_is_accepted() {
            let draft = RuleDraft {
                end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..weekly()
            };
            assert!(validate_rule(&draft, Some(at(23, 0))).is_empty());
        }

        #[test]
        fn finish_rule_converts_interval() {
            let rule = finish_rule(RuleDraft { interval: 3, ..weekly() }, at(9, 0)).unwrap();
            assert_eq!(rule.interval, 3);
            assert_eq!(rule.weekdays.unwrap().to_string(), "MO,WE");
        }
    }

    mod event {
        use super::*;

        #[test]
        fn standup_is_valid() {
            let draft = EventDraft::new("Standup", at(9, 0), at(9, 15));
            assert!(validate_event(&draft).is_empty());
        }

        #[test]
        fn start_not_before_end_is_rejected() {
            for (start, end) in [(at(9, 0), at(9, 0)), (at(10, 0), at(9, 0))] {
                let draft = EventDraft::new("Standup", start, end);
                assert_eq!(
                    validate_event(&draft).message_for(Field::EndTime),
                    Some("End time must be after start time")
                );
            }
        }

        #[test]
        fn reports_every_violation_at_once() {
            let draft = EventDraft {
                title: "   ".to_string(),
                recurrence: Recurrence::Recurring(RuleDraft {
                    frequency: None,
                    interval: 0,
                    ..weekly()
                }),
                ..Default::default()
            };
            let violations = validate_event(&draft);
            let fields: Vec<Field> = violations.iter().map(|v| v.field).collect();
            assert_eq!(
                fields,
                vec![
                    Field::Title,
                    Field::StartTime,
                    Field::EndTime,
                    Field::Frequency,
                    Field::Interval,
                ]
            );
        }

        #[test]
        fn recurrence_switched_off_is_not_validated() {
            let mut draft = EventDraft::new("Standup", at(9, 0), at(9, 15));
            draft.recurrence = Recurrence::None;
            assert!(validate_event(&draft).is_empty());
        }

        #[test]
        fn display_joins_messages() {
            let draft = EventDraft::new("", at(9, 0), at(8, 0));
            assert_eq!(
                validate_event(&draft).to_string(),
                "title: Title is required; end_time: End time must be after start time"
            );
        }
    }
}
