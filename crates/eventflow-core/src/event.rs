//! Event types.
//!
//! - [`EventRecord`]: an event as persisted by the event store
//! - [`EventDraft`]: the editable form state for creating or updating an event
//! - [`EventPayload`]: a validated draft, the only thing that may be sent to the store
//! - [`EventId`]: the store-assigned identifier

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::{Recurrence, RecurrenceRule};
use crate::validation::{self, Violations};

/// Opaque identifier assigned to an event by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier as used in store URLs.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A logical event as persisted by the event store.
///
/// A record carrying a [`RecurrenceRule`] is a series root; every occurrence
/// generated from the rule refers back to it by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
}

impl EventRecord {
    /// Returns true if this record is a series root.
    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }

    /// Returns the description, treating an empty string as absent.
    pub fn description(&self) -> Option<&str> {
        Some(self.description.as_str()).filter(|d| !d.is_empty())
    }

    /// Builds the edit-form state for this record.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            start_time: Some(self.start_time),
            end_time: Some(self.end_time),
            is_all_day: self.is_all_day,
            description: self.description().map(str::to_string),
            recurrence: Recurrence::from(self.recurrence_rule.clone()),
        }
    }
}

/// The editable state of an event form.
///
/// Every field may hold invalid input; call [`EventDraft::into_payload`] to
/// obtain something that can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_all_day: bool,
    pub description: Option<String>,
    pub recurrence: Recurrence,
}

impl EventDraft {
    /// Creates a non-recurring draft with the given title and time window.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start_time: Some(start),
            end_time: Some(end),
            ..Default::default()
        }
    }

    /// Builder method to set the recurrence state.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to mark the event as all-day.
    pub fn with_all_day(mut self, is_all_day: bool) -> Self {
        self.is_all_day = is_all_day;
        self
    }

    /// Returns every field violation in this draft. Empty means valid.
    pub fn validate(&self) -> Violations {
        validation::validate_event(self)
    }

    /// Converts the draft into a submittable payload, or returns the full set
    /// of violations.
    pub fn into_payload(self) -> Result<EventPayload, Violations> {
        let violations = self.validate();
        match (self.start_time, self.end_time) {
            (Some(start_time), Some(end_time)) if violations.is_empty() => {
                let recurrence_rule = match self.recurrence {
                    Recurrence::None => None,
                    Recurrence::Recurring(draft) => {
                        Some(validation::finish_rule(draft, start_time)?)
                    }
                };
                Ok(EventPayload {
                    title: self.title.trim().to_string(),
                    start_time,
                    end_time,
                    is_all_day: self.is_all_day,
                    description: self.description.unwrap_or_default(),
                    recurrence_rule,
                })
            }
            _ => Err(violations),
        }
    }
}

/// A validated event, ready to be sent to the store on create or update.
///
/// The only constructor is [`EventDraft::into_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    title: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_all_day: bool,
    description: String,
    recurrence_rule: Option<RecurrenceRule>,
}

impl EventPayload {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn is_all_day(&self) -> bool {
        self.is_all_day
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        self.recurrence_rule.as_ref()
    }

    /// Materialises the record the store would hold for this payload under `id`.
    pub fn into_record(self, id: EventId) -> EventRecord {
        EventRecord {
            id,
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            is_all_day: self.is_all_day,
            description: self.description,
            recurrence_rule: self.recurrence_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RuleDraft};
    use crate::validation::Field;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn standup() -> EventDraft {
        EventDraft::new("Standup", utc(2024, 1, 1, 9, 0), utc(2024, 1, 1, 9, 15))
    }

    #[test]
    fn event_id_parse_and_display() {
        let id: EventId = " 42 ".parse().unwrap();
        assert_eq!(id, EventId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<EventId>().is_err());
    }

    #[test]
    fn record_from_store_json() {
        let json = r#"{
            "id": 3,
            "title": "Gym",
            "start_time": "2024-01-02T18:00:00Z",
            "end_time": "2024-01-02T19:00:00Z",
            "user": 1,
            "is_all_day": false,
            "description": "",
            "created_at": "2023-12-30T10:00:00Z",
            "recurrence_rule": {
                "id": 9,
                "frequency": "WEEKLY",
                "interval": 1,
                "weekdays": "TU,TH",
                "relative_day": "",
                "end_date": "2024-06-30"
            }
        }"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, EventId::new(3));
        assert!(record.is_recurring());
        assert!(record.description().is_none());
        let rule = record.recurrence_rule.as_ref().unwrap();
        assert_eq!(rule.weekdays.as_ref().unwrap().to_string(), "TU,TH");
        assert_eq!(rule.end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn free_form_rule_fields_do_not_fail_the_listing() {
        let json = r#"[
            {
                "id": 1,
                "title": "Standup",
                "start_time": "2024-01-01T09:00:00Z",
                "end_time": "2024-01-01T09:15:00Z"
            },
            {
                "id": 2,
                "title": "Gym",
                "start_time": "2024-01-02T18:00:00Z",
                "end_time": "2024-01-02T19:00:00Z",
                "recurrence_rule": {
                    "frequency": "WEEKLY",
                    "interval": 1,
                    "weekdays": "Monday, Wednesday",
                    "relative_day": "6MO",
                    "end_date": null
                }
            }
        ]"#;
        let records: Vec<EventRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Standup");
        assert!(!records[0].is_recurring());

        let rule = records[1].recurrence_rule.as_ref().unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert!(rule.weekdays.is_none());
        assert!(rule.relative_day.is_none());
    }

    #[test]
    fn record_round_trips_through_draft() {
        let record = standup()
            .with_description("daily sync")
            .into_payload()
            .unwrap()
            .into_record(EventId::new(1));
        let draft = record.to_draft();
        assert_eq!(draft.title, "Standup");
        assert_eq!(draft.description.as_deref(), Some("daily sync"));
        assert_eq!(draft.recurrence, Recurrence::None);
        assert_eq!(draft.into_payload().unwrap().into_record(EventId::new(1)), record);
    }

    #[test]
    fn invalid_draft_yields_violations_not_payload() {
        let mut draft = standup();
        draft.title.clear();
        draft.end_time = draft.start_time;
        let violations = draft.into_payload().unwrap_err();
        assert!(violations.contains(Field::Title));
        assert!(violations.contains(Field::EndTime));
    }

    #[test]
    fn recurring_payload_carries_validated_rule() {
        let draft = standup().with_recurrence(Recurrence::Recurring(RuleDraft {
            frequency: Some(Frequency::Weekly),
            interval: 1,
            weekdays: Some("MON,WED".parse().unwrap()),
            relative_day: None,
            end_date: NaiveDate::from_ymd_opt(2024, 1, 8),
        }));
        let payload = draft.into_payload().unwrap();
        let rule = payload.recurrence_rule().unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 1);
    }

    #[test]
    fn payload_wire_format() {
        let payload = standup().into_payload().unwrap();
        insta::assert_json_snapshot!(payload, @r###"
        {
          "title": "Standup",
          "start_time": "2024-01-01T09:00:00Z",
          "end_time": "2024-01-01T09:15:00Z",
          "is_all_day": false,
          "description": "",
          "recurrence_rule": null
        }
        "###);
    }

    #[test]
    fn recurring_payload_wire_format() {
        let payload = standup()
            .with_recurrence(Recurrence::Recurring(RuleDraft {
                frequency: Some(Frequency::Weekly),
                interval: 1,
                weekdays: Some("MON,WED".parse().unwrap()),
                relative_day: None,
                end_date: NaiveDate::from_ymd_opt(2024, 1, 8),
            }))
            .into_payload()
            .unwrap();
        insta::assert_json_snapshot!(payload, @r###"
        {
          "title": "Standup",
          "start_time": "2024-01-01T09:00:00Z",
          "end_time": "2024-01-01T09:15:00Z",
          "is_all_day": false,
          "description": "",
          "recurrence_rule": {
            "frequency": "WEEKLY",
            "interval": 1,
            "weekdays": "MO,WE",
            "relative_day": null,
            "end_date": "2024-01-08"
          }
        }
        "###);
    }
}
