//! In-memory store for tests.

use std::sync::Mutex;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use crate::{
    Error, Result,
    due::is_due,
    store::SubscriberStore,
    types::{
        DigestLogEntry, DueSubscriber, NewSubscriber, Subscriber, SubscriberPatch, stored_interval,
    },
};

#[derive(Default)]
struct State {
    subscribers: Vec<Subscriber>,
    log: Vec<DigestLogEntry>,
    next_id: i64,
}

impl State {
    fn latest(&self, subscriber_id: i64) -> Option<DateTime<Utc>> {
        self.log
            .iter()
            .filter(|e| e.subscriber_id == subscriber_id)
            .map(|e| e.sent_at)
            .max()
    }
}

/// In-memory store backed by `Vec`s, used by job tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch a subscriber's active flag.
    pub fn set_active(&self, email: &str, active: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = state.subscribers.iter_mut().find(|s| s.email == email) {
            s.active = active;
        }
    }

    /// Every log entry across all subscribers, in append order.
    pub fn all_log_entries(&self) -> Vec<DigestLogEntry> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.log.clone()
    }
}

#[async_trait]
impl SubscriberStore for InMemoryStore {
    async fn create_subscriber(&self, new: &NewSubscriber) -> Result<Subscriber> {
        let interval = stored_interval(new.interval)?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.subscribers.iter().any(|s| s.email == new.email) {
            return Err(Error::SubscriberExists {
                email: new.email.clone(),
            });
        }
        state.next_id += 1;
        let subscriber = Subscriber {
            id: state.next_id,
            email: new.email.clone(),
            handle: new.handle.clone(),
            interval,
            active: true,
        };
        state.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.subscribers.iter().find(|s| s.email == email).cloned())
    }

    async fn update_subscriber(&self, email: &str, patch: &SubscriberPatch) -> Result<Subscriber> {
        let interval = patch.interval.map(stored_interval).transpose()?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let subscriber = state
            .subscribers
            .iter_mut()
            .find(|s| s.email == email)
            .ok_or_else(|| Error::subscriber_not_found(email))?;
        if let Some(handle) = &patch.handle {
            subscriber.handle = handle.clone();
        }
        if let Some(interval) = interval {
            subscriber.interval = interval;
        }
        Ok(subscriber.clone())
    }

    async fn delete_subscriber(&self, email: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(pos) = state.subscribers.iter().position(|s| s.email == email) else {
            return Ok(false);
        };
        let removed = state.subscribers.remove(pos);
        state.log.retain(|e| e.subscriber_id != removed.id);
        Ok(true)
    }

    async fn due_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<DueSubscriber>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut due: Vec<DueSubscriber> = state
            .subscribers
            .iter()
            .filter(|s| s.active)
            .filter_map(|s| {
                let last_sent = state.latest(s.id);
                is_due(last_sent, s.interval, now).then(|| DueSubscriber {
                    id: s.id,
                    email: s.email.clone(),
                    handle: s.handle.clone(),
                    last_sent,
                })
            })
            .collect();
        due.sort_by_key(|d| d.id);
        Ok(due)
    }

    async fn append_log(
        &self,
        subscriber_id: i64,
        at: DateTime<Utc>,
        skipped: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.subscribers.iter().any(|s| s.id == subscriber_id) {
            return Err(Error::message(format!(
                "no subscriber with id {subscriber_id}"
            )));
        }
        if state.latest(subscriber_id).is_some_and(|latest| latest > at) {
            return Err(Error::LogOutOfOrder { subscriber_id });
        }
        state.log.push(DigestLogEntry {
            subscriber_id,
            sent_at: at,
            skipped,
        });
        Ok(())
    }

    async fn log_entries(&self, subscriber_id: i64) -> Result<Vec<DigestLogEntry>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .log
            .iter()
            .filter(|e| e.subscriber_id == subscriber_id)
            .cloned()
            .collect())
    }
}
