//! In-memory fakes of the store traits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, Utc};
use eventflow_core::{EventId, EventPayload, EventRecord, Frequency, OccurrenceSpan};
use eventflow_remote::{
    BoxFuture, Credentials, EventStore, Registration, RemoteError, RemoteResult, SessionApi,
    TokenPair, UserProfile,
};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    Occurrences,
    DeleteOccurrence,
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<EventId, EventRecord>,
    next_id: i64,
    deleted_instances: Vec<(EventId, DateTime<Utc>)>,
    failing: HashMap<Op, RemoteError>,
    calls: Vec<Op>,
    hold_list: Option<Arc<Notify>>,
    hold_update: Option<Arc<Notify>>,
}

/// Event store that keeps records in memory and expands rules itself.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stores a payload directly, bypassing call accounting.
    pub fn seed(&self, payload: EventPayload) -> EventRecord {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let record = payload.into_record(EventId::new(state.next_id));
        state.records.insert(record.id, record.clone());
        record
    }

    /// Makes every later call of `op` fail with `err`.
    pub fn fail(&self, op: Op, err: RemoteError) {
        self.state.lock().unwrap().failing.insert(op, err);
    }

    /// Makes the next `list_events` call wait until the returned handle is
    /// notified. The records it returns are those present when it was called.
    pub fn hold_next_list(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().hold_list = Some(notify.clone());
        notify
    }

    /// Makes the next `update_event` call wait until the returned handle is
    /// notified. Its outcome, failure included, is fixed when it is called.
    pub fn hold_next_update(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().hold_update = Some(notify.clone());
        notify
    }

    pub fn heal(&self, op: Op) {
        self.state.lock().unwrap().failing.remove(&op);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub fn record(&self, id: EventId) -> Option<EventRecord> {
        self.state.lock().unwrap().records.get(&id).cloned()
    }

    fn enter(&self, op: Op) -> RemoteResult<std::sync::MutexGuard<'_, StoreState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        match state.failing.get(&op) {
            Some(err) => Err(err.duplicate()),
            None => Ok(state),
        }
    }
}

/// Expands a rule one day at a time from the record's start.
fn expand(
    record: &EventRecord,
    limit: usize,
    deleted: &[(EventId, DateTime<Utc>)],
) -> Vec<OccurrenceSpan> {
    let Some(rule) = &record.recurrence_rule else {
        return Vec::new();
    };
    let duration = record.end_time - record.start_time;
    let first = record.start_time.date_naive();
    let interval = i64::from(rule.interval);
    let mut spans = Vec::new();

    for offset in 0..(366 * 10) {
        if spans.len() >= limit {
            break;
        }
        let start = record.start_time + Duration::days(offset);
        let date = start.date_naive();
        if rule.end_date.is_some_and(|end| date > end) {
            break;
        }
        let days = (date - first).num_days();
        let months = i64::from(date.year() - first.year()) * 12 + i64::from(date.month())
            - i64::from(first.month());
        let on_rule = match rule.frequency {
            Frequency::Daily => days % interval == 0,
            Frequency::Weekly => {
                let on_day = match &rule.weekdays {
                    Some(days) if !days.is_empty() => days.contains(date.weekday()),
                    _ => date.weekday() == first.weekday(),
                };
                on_day && (days / 7) % interval == 0
            }
            Frequency::Monthly => date.day() == first.day() && months % interval == 0,
            Frequency::Yearly => {
                date.day() == first.day() && date.month() == first.month() && (months / 12) % interval == 0
            }
        };
        if on_rule && !deleted.contains(&(record.id, start)) {
            spans.push(OccurrenceSpan {
                start,
                end: start + duration,
            });
        }
    }
    spans
}

impl EventStore for FakeStore {
    fn list_events(&self) -> BoxFuture<'_, RemoteResult<Vec<EventRecord>>> {
        let result = self.enter(Op::List).map(|mut state| {
            let records: Vec<EventRecord> = state.records.values().cloned().collect();
            (state.hold_list.take(), records)
        });
        Box::pin(async move {
            let (hold, records) = result?;
            if let Some(hold) = hold {
                hold.notified().await;
            }
            Ok(records)
        })
    }

    fn get_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        let result = self.enter(Op::Get).and_then(|state| {
            state
                .records
                .get(&id)
                .cloned()
                .ok_or_else(|| RemoteError::not_found(format!("event {}", id)))
        });
        Box::pin(async move { result })
    }

    fn create_event(&self, payload: EventPayload) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        let result = self.enter(Op::Create).map(|mut state| {
            state.next_id += 1;
            let record = payload.into_record(EventId::new(state.next_id));
            state.records.insert(record.id, record.clone());
            record
        });
        Box::pin(async move { result })
    }

    fn update_event(
        &self,
        id: EventId,
        payload: EventPayload,
    ) -> BoxFuture<'_, RemoteResult<EventRecord>> {
        let hold = self.state.lock().unwrap().hold_update.take();
        let result = self.enter(Op::Update).and_then(|mut state| {
            if !state.records.contains_key(&id) {
                return Err(RemoteError::not_found(format!("event {}", id)));
            }
            let record = payload.into_record(id);
            state.records.insert(id, record.clone());
            Ok(record)
        });
        Box::pin(async move {
            if let Some(hold) = hold {
                hold.notified().await;
            }
            result
        })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'_, RemoteResult<()>> {
        let result = self.enter(Op::Delete).and_then(|mut state| {
            state
                .records
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| RemoteError::not_found(format!("event {}", id)))
        });
        Box::pin(async move { result })
    }

    fn list_occurrences(
        &self,
        id: EventId,
        max_count: usize,
    ) -> BoxFuture<'_, RemoteResult<Vec<OccurrenceSpan>>> {
        let result = self.enter(Op::Occurrences).and_then(|state| {
            let record = state
                .records
                .get(&id)
                .ok_or_else(|| RemoteError::not_found(format!("event {}", id)))?;
            if record.recurrence_rule.is_none() {
                return Err(RemoteError::bad_request("event does not recur"));
            }
            Ok(expand(record, max_count, &state.deleted_instances))
        });
        Box::pin(async move { result })
    }

    fn delete_occurrence(
        &self,
        id: EventId,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, RemoteResult<()>> {
        let result = self.enter(Op::DeleteOccurrence).map(|mut state| {
            state.deleted_instances.push((id, start));
        });
        Box::pin(async move { result })
    }
}

#[derive(Default)]
struct Accounts {
    users: HashMap<String, (String, UserProfile)>,
    tokens: HashMap<String, String>,
    issued: usize,
}

/// Session API backed by an in-memory account table.
#[derive(Default)]
pub(crate) struct FakeSession {
    accounts: Mutex<Accounts>,
    calls: AtomicUsize,
    hold_user: Mutex<Option<Arc<Notify>>>,
}

impl FakeSession {
    pub fn with_user(username: &str, password: &str) -> Arc<Self> {
        let fake = Self::default();
        fake.add(username, password, None);
        Arc::new(fake)
    }

    fn add(&self, username: &str, password: &str, email: Option<String>) {
        let mut accounts = self.accounts.lock().unwrap();
        let id = accounts.users.len() as i64 + 1;
        let profile = UserProfile {
            id,
            username: username.to_string(),
            email,
        };
        accounts
            .users
            .insert(username.to_string(), (password.to_string(), profile));
    }

    /// Invalidates every token handed out so far.
    pub fn revoke_all(&self) {
        self.accounts.lock().unwrap().tokens.clear();
    }

    /// Makes the next `current_user` call wait until the returned handle is
    /// notified.
    pub fn hold_next_current_user(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold_user.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SessionApi for FakeSession {
    fn obtain_token(&self, credentials: Credentials) -> BoxFuture<'_, RemoteResult<TokenPair>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        let known = accounts
            .users
            .get(&credentials.username)
            .is_some_and(|(password, _)| *password == credentials.password);
        let result = if known {
            accounts.issued += 1;
            let access = format!("token-{}-{}", credentials.username, accounts.issued);
            accounts
                .tokens
                .insert(access.clone(), credentials.username.clone());
            Ok(TokenPair {
                access,
                refresh: None,
            })
        } else {
            Err(RemoteError::authentication("invalid username or password"))
        };
        Box::pin(async move { result })
    }

    fn current_user(&self, access_token: String) -> BoxFuture<'_, RemoteResult<UserProfile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock().unwrap();
        let result = accounts
            .tokens
            .get(&access_token)
            .and_then(|username| accounts.users.get(username))
            .map(|(_, profile)| profile.clone())
            .ok_or_else(|| RemoteError::authentication("token not valid"));
        let hold = self.hold_user.lock().unwrap().take();
        Box::pin(async move {
            if let Some(hold) = hold {
                hold.notified().await;
            }
            result
        })
    }

    fn register(&self, registration: Registration) -> BoxFuture<'_, RemoteResult<()>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let exists = self
            .accounts
            .lock()
            .unwrap()
            .users
            .contains_key(&registration.credentials.username);
        let result = if exists {
            Err(RemoteError::bad_request("username already taken"))
        } else {
            self.add(
                &registration.credentials.username,
                &registration.credentials.password,
                registration.email,
            );
            Ok(())
        };
        Box::pin(async move { result })
    }
}
