//! Persistence trait for subscribers and their digest log.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use crate::{
    Result,
    types::{DigestLogEntry, DueSubscriber, NewSubscriber, Subscriber, SubscriberPatch},
};

/// Backend for the subscriber table and the append-only digest log.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Insert an active subscriber. Fails if the interval is zero or the
    /// email is already subscribed.
    async fn create_subscriber(&self, new: &NewSubscriber) -> Result<Subscriber>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    /// Apply the present fields of `patch`.
    async fn update_subscriber(&self, email: &str, patch: &SubscriberPatch) -> Result<Subscriber>;

    /// Delete a subscriber and its whole digest log. Returns `false` when
    /// no subscriber had that email.
    async fn delete_subscriber(&self, email: &str) -> Result<bool>;

    /// Active subscribers with no log entry, or whose latest entry plus
    /// their interval is at or before `now`, ordered by id.
    async fn due_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<DueSubscriber>>;

    /// Append a log entry. Entries for one subscriber never go backwards in
    /// time.
    async fn append_log(&self, subscriber_id: i64, at: DateTime<Utc>, skipped: bool)
    -> Result<()>;

    /// Log entries for a subscriber, oldest first.
    async fn log_entries(&self, subscriber_id: i64) -> Result<Vec<DigestLogEntry>>;
}
