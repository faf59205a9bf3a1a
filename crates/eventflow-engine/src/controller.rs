//! The event lifecycle controller.
//!
//! Owns the display list of occurrences and every operation that changes
//! events: create, update, delete (whole series or one instance), and
//! drag-to-reschedule. Each operation checks the session first, validates
//! second, and only then talks to the store.
//!
//! Fetches carry a sequence number. A fetch whose number is no longer the
//! latest when it completes is dropped, so an older, slower fetch can never
//! overwrite the result of a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use eventflow_core::{EventDraft, EventId, EventRecord, Occurrence};
use eventflow_remote::{EventStore, RemoteResult};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::{ControllerError, ControllerResult};
use crate::expander::OccurrenceExpander;
use crate::session::SessionView;

/// What the controller currently has to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    Ready(Vec<Occurrence>),
    Unauthenticated(String),
    Error(String),
}

impl CatalogState {
    pub fn occurrences(&self) -> &[Occurrence] {
        match self {
            Self::Ready(list) => list,
            _ => &[],
        }
    }
}

/// Outcome of clicking an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// A recurring instance was clicked: ask whether to delete that instance.
    ConfirmInstanceDeletion {
        series_id: EventId,
        start: DateTime<Utc>,
    },
    /// A plain event was clicked: open it for editing.
    Edit { id: EventId, draft: EventDraft },
}

pub struct EventController {
    store: Arc<dyn EventStore>,
    session: SessionView,
    expander: OccurrenceExpander,
    catalog: RwLock<CatalogState>,
    sequence: AtomicU64,
}

impl EventController {
    pub fn new(store: Arc<dyn EventStore>, session: SessionView, config: ControllerConfig) -> Self {
        let expander = OccurrenceExpander::new(store.clone(), config.occurrence_limit);
        let catalog = if session.is_authenticated() {
            CatalogState::Loading
        } else {
            CatalogState::Unauthenticated("not logged in".to_string())
        };
        Self {
            store,
            session,
            expander,
            catalog: RwLock::new(catalog),
            sequence: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> CatalogState {
        self.catalog.read().await.clone()
    }

    /// The displayed occurrences; empty unless the catalog is ready.
    pub async fn occurrences(&self) -> Vec<Occurrence> {
        self.catalog.read().await.occurrences().to_vec()
    }

    /// Occurrences that have not ended at `now`, earliest first.
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Vec<Occurrence> {
        let mut list: Vec<Occurrence> = self
            .catalog
            .read()
            .await
            .occurrences()
            .iter()
            .filter(|o| o.is_upcoming(now))
            .cloned()
            .collect();
        list.sort_by_key(|o| o.start);
        list
    }

    fn require_session(&self) -> ControllerResult<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            debug!("rejecting operation without a session");
            Err(ControllerError::Unauthorized)
        }
    }

    /// Drops the list without touching the store, and invalidates any fetch
    /// still in flight.
    async fn clear(&self, reason: &str) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        *self.catalog.write().await = CatalogState::Unauthenticated(reason.to_string());
    }

    /// Re-reads every event and rebuilds the display list.
    ///
    /// Returns the catalog as it stands afterwards, which may be the result
    /// of a newer fetch if this one was superseded.
    pub async fn refresh(&self) -> CatalogState {
        if !self.session.is_authenticated() {
            self.clear("not logged in").await;
            return self.state().await;
        }

        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut catalog = self.catalog.write().await;
            if self.sequence.load(Ordering::SeqCst) == ticket {
                *catalog = CatalogState::Loading;
            }
        }

        let fetched = self.fetch_all().await;

        let mut catalog = self.catalog.write().await;
        if self.sequence.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "discarding superseded fetch");
            return catalog.clone();
        }
        if !self.session.is_authenticated() {
            debug!(ticket, "session ended during fetch, discarding result");
            *catalog = CatalogState::Unauthenticated("not logged in".to_string());
            return catalog.clone();
        }

        *catalog = match fetched {
            Ok(list) => {
                info!(count = list.len(), "event list refreshed");
                CatalogState::Ready(list)
            }
            Err(err) if err.is_authentication() => {
                warn!(error = %err, "store rejected the session credential");
                CatalogState::Unauthenticated("session expired".to_string())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch events");
                CatalogState::Error(err.to_string())
            }
        };
        catalog.clone()
    }

    async fn fetch_all(&self) -> RemoteResult<Vec<Occurrence>> {
        let records = self.store.list_events().await?;
        debug!(count = records.len(), "fetched records");
        Ok(self.expander.expand_all(&records).await)
    }

    /// Aligns the catalog with the current session: fetch when logged in,
    /// clear without a store call otherwise.
    pub async fn sync_session(&self) -> CatalogState {
        if self.session.is_authenticated() {
            self.refresh().await
        } else {
            self.clear("not logged in").await;
            self.state().await
        }
    }

    /// Keeps the catalog in step with the session until the gate goes away.
    pub fn watch_session(self: Arc<Self>) -> JoinHandle<()> {
        let mut view = self.session.clone();
        tokio::spawn(async move {
            let mut last = view.is_authenticated();
            self.sync_session().await;
            while view.changed().await {
                let now = view.is_authenticated();
                if now != last {
                    last = now;
                    self.sync_session().await;
                }
            }
            debug!("session gate dropped, no longer watching");
        })
    }

    pub async fn create(&self, draft: EventDraft) -> ControllerResult<EventRecord> {
        self.require_session()?;
        let payload = draft.into_payload()?;
        let record = self.store.create_event(payload).await?;
        info!(id = %record.id, title = %record.title, "event created");
        self.refresh().await;
        Ok(record)
    }

    pub async fn update(&self, id: EventId, draft: EventDraft) -> ControllerResult<EventRecord> {
        self.require_session()?;
        let payload = draft.into_payload()?;
        let record = self.store.update_event(id, payload).await?;
        info!(id = %id, "event updated");
        self.refresh().await;
        Ok(record)
    }

    /// Deletes a record and, for a series, every one of its occurrences.
    pub async fn delete_series(&self, id: EventId) -> ControllerResult<()> {
        self.require_session()?;
        self.store.delete_event(id).await?;
        info!(id = %id, "event deleted");
        self.refresh().await;
        Ok(())
    }

    /// Deletes the one occurrence of `series_id` that starts at `start`.
    pub async fn delete_instance(
        &self,
        series_id: EventId,
        start: DateTime<Utc>,
    ) -> ControllerResult<()> {
        self.require_session()?;
        self.store.delete_occurrence(series_id, start).await?;
        info!(id = %series_id, start = %start, "occurrence deleted");
        self.refresh().await;
        Ok(())
    }

    /// Routes a click: recurring instances go to instance deletion, anything
    /// else opens the edit form with the record loaded from the store.
    pub async fn click(&self, occurrence: &Occurrence) -> ControllerResult<ClickAction> {
        if occurrence.is_recurring_instance {
            return Ok(ClickAction::ConfirmInstanceDeletion {
                series_id: occurrence.series_id,
                start: occurrence.start,
            });
        }
        self.require_session()?;
        let record = self.store.get_event(occurrence.series_id).await?;
        Ok(ClickAction::Edit {
            id: record.id,
            draft: record.to_draft(),
        })
    }

    /// Moves an occurrence to a new window.
    ///
    /// The display list shows the move at once. The owning record is then
    /// rewritten in the store; for an instance of a series this moves the
    /// series root. If that fails the occurrence is put back where it was,
    /// unless a newer fetch has replaced the list in the meantime.
    pub async fn reschedule(
        &self,
        occurrence: &Occurrence,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> ControllerResult<EventRecord> {
        self.require_session()?;
        let violations = EventDraft::new(occurrence.title.clone(), new_start, new_end).validate();
        if !violations.is_empty() {
            return Err(ControllerError::Validation(violations));
        }

        let moved = occurrence.moved_to(new_start, new_end);
        let generation = self.replace_displayed(occurrence, &moved).await;

        match self.confirm_move(occurrence.series_id, new_start, new_end).await {
            Ok(record) => {
                info!(id = %record.id, start = %new_start, "event rescheduled");
                self.refresh().await;
                Ok(record)
            }
            Err(err) => {
                warn!(id = %occurrence.series_id, error = %err, "reschedule failed, reverting");
                if self.sequence.load(Ordering::SeqCst) == generation {
                    self.replace_displayed(&moved, occurrence).await;
                }
                Err(err)
            }
        }
    }

    async fn confirm_move(
        &self,
        id: EventId,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> ControllerResult<EventRecord> {
        let mut record = self.store.get_event(id).await?;
        record.start_time = new_start;
        record.end_time = new_end;
        let payload = record.to_draft().into_payload()?;
        Ok(self.store.update_event(id, payload).await?)
    }

    /// Swaps `from` for `to` in the displayed list, if present. Returns the
    /// fetch sequence the list belongs to.
    async fn replace_displayed(&self, from: &Occurrence, to: &Occurrence) -> u64 {
        let mut catalog = self.catalog.write().await;
        if let CatalogState::Ready(list) = &mut *catalog
            && let Some(slot) = list.iter_mut().find(|o| **o == *from)
        {
            *slot = to.clone();
        }
        self.sequence.load(Ordering::SeqCst)
    }
}
