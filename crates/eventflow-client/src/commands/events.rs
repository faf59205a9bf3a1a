//! Event commands.

use chrono::{DateTime, Utc};
use eventflow_core::{EventDraft, EventId, Occurrence};
use eventflow_engine::ControllerError;
use tracing::debug;

use crate::cli::RecurrenceArgs;
use crate::commands::App;
use crate::error::{ClientError, ClientResult};
use crate::render;

/// Changes requested by `update`; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EventEdits {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub all_day: Option<bool>,
    pub recurrence: RecurrenceArgs,
}

impl EventEdits {
    pub fn apply(self, mut draft: EventDraft) -> EventDraft {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(start) = self.start {
            draft.start_time = Some(start);
        }
        if let Some(end) = self.end {
            draft.end_time = Some(end);
        }
        if let Some(description) = self.description {
            draft.description = Some(description);
        }
        if let Some(all_day) = self.all_day {
            draft.is_all_day = all_day;
        }
        draft.recurrence = self.recurrence.apply(draft.recurrence);
        draft
    }
}

/// The displayed occurrence of `id` that starts at `start`.
pub fn find_occurrence(
    occurrences: &[Occurrence],
    id: EventId,
    start: DateTime<Utc>,
) -> Option<&Occurrence> {
    occurrences
        .iter()
        .find(|o| o.series_id == id && o.start == start)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub async fn list(app: &App, json: bool) -> ClientResult<()> {
    app.require_user().await?;
    let occurrences = app.catalog().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        print_lines(render::format_occurrences(&occurrences));
    }
    Ok(())
}

pub async fn upcoming(app: &App, limit: usize, json: bool) -> ClientResult<()> {
    app.require_user().await?;
    app.catalog().await?;
    let mut occurrences = app.controller().upcoming(Utc::now()).await;
    occurrences.truncate(limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        print_lines(render::format_occurrences(&occurrences));
    }
    Ok(())
}

pub async fn create(app: &App, draft: EventDraft) -> ClientResult<()> {
    app.require_user().await?;
    let record = app.controller().create(draft).await?;
    println!("Created event {}.", record.id);
    print_lines(render::format_record(&record));
    Ok(())
}

pub async fn update(app: &App, id: EventId, edits: EventEdits) -> ClientResult<()> {
    app.require_user().await?;
    let current = app
        .store()
        .get_event(id)
        .await
        .map_err(ControllerError::from)?;
    debug!(id = %id, "loaded event for update");

    let record = app.controller().update(id, edits.apply(current.to_draft())).await?;
    println!("Updated event {}.", record.id);
    print_lines(render::format_record(&record));
    Ok(())
}

/// Moves the occurrence of `id` starting at `from`.
pub async fn reschedule(
    app: &App,
    id: EventId,
    from: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ClientResult<()> {
    app.require_user().await?;
    let occurrences = app.catalog().await?;
    let occurrence = find_occurrence(&occurrences, id, from).ok_or_else(|| {
        ClientError::NoSuchOccurrence {
            id,
            start: from.to_rfc3339(),
        }
    })?;

    let record = app.controller().reschedule(occurrence, start, end).await?;
    println!("Moved event {}.", record.id);
    print_lines(render::format_record(&record));
    Ok(())
}

pub async fn delete(app: &App, id: EventId) -> ClientResult<()> {
    app.require_user().await?;
    app.controller().delete_series(id).await?;
    println!("Deleted event {}.", id);
    Ok(())
}

pub async fn delete_instance(app: &App, id: EventId, start: DateTime<Utc>) -> ClientResult<()> {
    app.require_user().await?;
    app.controller().delete_instance(id, start).await?;
    println!(
        "Deleted the occurrence of event {} at {}.",
        id,
        start.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}
