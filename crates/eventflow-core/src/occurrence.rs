//! Concrete calendar appearances of events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventId, EventRecord};

/// One generated instance time window, as returned by the store when it
/// expands a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSpan {
    #[serde(alias = "start_time")]
    pub start: DateTime<Utc>,
    #[serde(alias = "end_time")]
    pub end: DateTime<Utc>,
}

/// A single entry in the calendar display list.
///
/// Occurrences are derived from [`EventRecord`]s and never persisted.
/// `series_id` always refers back to the owning record, so several
/// occurrences of one recurring series share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub series_id: EventId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub is_recurring_instance: bool,
}

impl Occurrence {
    /// The sole appearance of a record, using its own time window.
    ///
    /// Also used as the fallback for a recurring record whose expansion failed;
    /// the root is then shown as a plain event until the next refresh.
    pub fn from_record(record: &EventRecord) -> Self {
        Self {
            series_id: record.id,
            title: record.title.clone(),
            start: record.start_time,
            end: record.end_time,
            is_all_day: record.is_all_day,
            is_recurring_instance: false,
        }
    }

    /// One generated instance of a recurring record.
    pub fn instance_of(record: &EventRecord, span: OccurrenceSpan) -> Self {
        Self {
            series_id: record.id,
            title: record.title.clone(),
            start: span.start,
            end: span.end,
            is_all_day: record.is_all_day,
            is_recurring_instance: true,
        }
    }

    /// Returns true if the occurrence has not finished at `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.end >= now
    }

    /// Moves the occurrence to a new window.
    pub fn moved_to(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}
