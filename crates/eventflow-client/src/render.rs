//! Terminal output for occurrences, events and users.

use chrono::{DateTime, Utc};
use eventflow_core::{EventRecord, Occurrence, Violations};
use eventflow_remote::UserProfile;

const NO_EVENTS_TEXT: &str = "No events";

/// Formats a time window in UTC, collapsing the end date when it matches the
/// start date.
pub fn format_window(start: DateTime<Utc>, end: DateTime<Utc>, is_all_day: bool) -> String {
    let same_day = start.date_naive() == end.date_naive();
    match (is_all_day, same_day) {
        (true, true) => format!("{} all day", start.format("%Y-%m-%d")),
        (true, false) => format!("{} - {} all day", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
        (false, true) => format!(
            "{} {}-{} UTC",
            start.format("%Y-%m-%d"),
            start.format("%H:%M"),
            end.format("%H:%M")
        ),
        (false, false) => format!(
            "{} - {} UTC",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        ),
    }
}

/// One display line: `[id] window  title`, with a marker for series instances.
pub fn format_occurrence(occurrence: &Occurrence) -> String {
    let marker = if occurrence.is_recurring_instance {
        " (repeats)"
    } else {
        ""
    };
    format!(
        "[{}] {}  {}{}",
        occurrence.series_id,
        format_window(occurrence.start, occurrence.end, occurrence.is_all_day),
        occurrence.title,
        marker
    )
}

/// Formats a list of occurrences, or a placeholder line when it is empty.
pub fn format_occurrences(occurrences: &[Occurrence]) -> Vec<String> {
    if occurrences.is_empty() {
        return vec![NO_EVENTS_TEXT.to_string()];
    }
    occurrences.iter().map(format_occurrence).collect()
}

/// Multi-line summary of a stored record, printed after it changes.
pub fn format_record(record: &EventRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}  {}",
        record.id,
        format_window(record.start_time, record.end_time, record.is_all_day),
        record.title
    )];
    if let Some(rule) = &record.recurrence_rule {
        lines.push(format!("    repeats {}", rule.summary()));
    }
    if let Some(description) = record.description() {
        lines.push(format!("    {}", description));
    }
    lines
}

pub fn format_user(user: &UserProfile) -> String {
    match &user.email {
        Some(email) => format!("{} <{}> (id {})", user.username, email, user.id),
        None => format!("{} (id {})", user.username, user.id),
    }
}

/// One line per violation, in the order they were found.
pub fn format_violations(violations: &Violations) -> Vec<String> {
    violations.iter().map(|v| format!("  {}", v)).collect()
}
