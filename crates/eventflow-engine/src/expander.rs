//! Turning event records into display occurrences.

use std::sync::Arc;

use eventflow_core::{EventRecord, Occurrence};
use eventflow_remote::EventStore;
use tracing::{debug, warn};

/// Expands records into occurrences, asking the store for the instances of
/// recurring series.
#[derive(Clone)]
pub struct OccurrenceExpander {
    store: Arc<dyn EventStore>,
    limit: usize,
}

impl OccurrenceExpander {
    pub fn new(store: Arc<dyn EventStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Occurrences of a single record.
    ///
    /// A non-recurring record maps to itself without a store call. If the
    /// store cannot expand a series, the series root is shown on its own so
    /// the event stays visible; this never fails.
    pub async fn expand(&self, record: &EventRecord) -> Vec<Occurrence> {
        if !record.is_recurring() {
            return vec![Occurrence::from_record(record)];
        }

        match self.store.list_occurrences(record.id, self.limit).await {
            Ok(spans) => {
                debug!(id = %record.id, count = spans.len(), "expanded series");
                spans
                    .into_iter()
                    .map(|span| Occurrence::instance_of(record, span))
                    .collect()
            }
            Err(err) => {
                warn!(id = %record.id, error = %err, "series expansion failed, showing series root");
                vec![Occurrence::from_record(record)]
            }
        }
    }

    /// Concatenates the occurrences of every record, in record order.
    pub async fn expand_all(&self, records: &[EventRecord]) -> Vec<Occurrence> {
        let mut occurrences = Vec::with_capacity(records.len());
        for record in records {
            occurrences.extend(self.expand(record).await);
        }
        occurrences
    }
}
