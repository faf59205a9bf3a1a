//! Core types: recurrence rules, events, occurrences, validation

pub mod event;
pub mod occurrence;
pub mod recurrence;
pub mod tracing;
pub mod validation;

pub use event::{EventDraft, EventId, EventPayload, EventRecord};
pub use occurrence::{Occurrence, OccurrenceSpan};
pub use recurrence::{
    Frequency, Recurrence, RecurrenceRule, RelativeDay, RuleDraft, RuleParseError, WeekdaySet,
};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
pub use validation::{Field, FieldViolation, Violations, validate_event, validate_rule};
