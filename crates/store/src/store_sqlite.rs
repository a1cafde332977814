//! SQLite-backed subscriber store using sqlx.

use std::time::Duration;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions, sqlite::SqliteRow},
    tracing::debug,
};

use crate::{
    Error, Result,
    store::SubscriberStore,
    types::{
        DigestLogEntry, DueSubscriber, NewSubscriber, Subscriber, SubscriberPatch, stored_interval,
    },
};

/// SQLite-backed persistence for subscribers and the digest log.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store with its own connection pool. Migrations are not run;
    /// see [`crate::migrations::run_migrations`].
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create a store using an existing pool.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn interval_to_ms(interval: Duration) -> Result<i64> {
    let interval = stored_interval(interval)?;
    i64::try_from(interval.as_millis())
        .map_err(|_| Error::message(format!("interval too large: {interval:?}")))
}

fn ms_to_time(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::message(format!("timestamp out of range: {ms}")))
}

fn subscriber_from_row(row: &SqliteRow) -> Subscriber {
    let interval_ms: i64 = row.get("interval_ms");
    Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        handle: row.get("handle"),
        interval: Duration::from_millis(interval_ms.max(0) as u64),
        active: row.get("active"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn create_subscriber(&self, new: &NewSubscriber) -> Result<Subscriber> {
        let interval_ms = interval_to_ms(new.interval)?;
        let row = sqlx::query(
            "INSERT INTO subscriber (email, handle, interval_ms, active)
             VALUES (?, ?, ?, 1)
             RETURNING id, email, handle, interval_ms, active",
        )
        .bind(&new.email)
        .bind(&new.handle)
        .bind(interval_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::SubscriberExists {
                    email: new.email.clone(),
                }
            } else {
                Error::from(e)
            }
        })?;
        Ok(subscriber_from_row(&row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let row = sqlx::query(
            "SELECT id, email, handle, interval_ms, active FROM subscriber WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(subscriber_from_row))
    }

    async fn update_subscriber(&self, email: &str, patch: &SubscriberPatch) -> Result<Subscriber> {
        let interval_ms = patch.interval.map(interval_to_ms).transpose()?;
        let (set_handle, handle) = match &patch.handle {
            Some(handle) => (true, handle.clone()),
            None => (false, None),
        };

        let row = sqlx::query(
            "UPDATE subscriber
             SET handle = CASE WHEN ? THEN ? ELSE handle END,
                 interval_ms = COALESCE(?, interval_ms)
             WHERE email = ?
             RETURNING id, email, handle, interval_ms, active",
        )
        .bind(set_handle)
        .bind(handle)
        .bind(interval_ms)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(subscriber_from_row)
            .ok_or_else(|| Error::subscriber_not_found(email))
    }

    async fn delete_subscriber(&self, email: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let log_rows = sqlx::query(
            "DELETE FROM digest_log
             WHERE subscriber_id IN (SELECT id FROM subscriber WHERE email = ?)",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        let subscriber_rows = sqlx::query("DELETE FROM subscriber WHERE email = ?")
            .bind(email)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        debug!(email, log_rows, subscriber_rows, "deleted subscriber");
        Ok(subscriber_rows > 0)
    }

    async fn due_subscribers(&self, now: DateTime<Utc>) -> Result<Vec<DueSubscriber>> {
        let rows = sqlx::query(
            "SELECT s.id, s.email, s.handle, MAX(l.sent_at_ms) AS last_sent_ms
             FROM subscriber s
             LEFT JOIN digest_log l ON l.subscriber_id = s.id
             WHERE s.active = 1
             GROUP BY s.id, s.email, s.handle, s.interval_ms
             HAVING COUNT(l.subscriber_id) = 0
                 OR MAX(l.sent_at_ms) + s.interval_ms <= ?
             ORDER BY s.id",
        )
        .bind(now.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DueSubscriber> {
                let last_sent = row
                    .try_get::<Option<i64>, _>("last_sent_ms")?
                    .map(ms_to_time)
                    .transpose()?;
                Ok(DueSubscriber {
                    id: row.get("id"),
                    email: row.get("email"),
                    handle: row.get("handle"),
                    last_sent,
                })
            })
            .collect()
    }

    async fn append_log(
        &self,
        subscriber_id: i64,
        at: DateTime<Utc>,
        skipped: bool,
    ) -> Result<()> {
        let at_ms = at.timestamp_millis();
        let result = sqlx::query(
            "INSERT INTO digest_log (subscriber_id, sent_at_ms, skipped)
             SELECT ?, ?, ?
             WHERE NOT EXISTS (
                 SELECT 1 FROM digest_log WHERE subscriber_id = ? AND sent_at_ms > ?
             )",
        )
        .bind(subscriber_id)
        .bind(at_ms)
        .bind(skipped)
        .bind(subscriber_id)
        .bind(at_ms)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::LogOutOfOrder { subscriber_id });
        }
        Ok(())
    }

    async fn log_entries(&self, subscriber_id: i64) -> Result<Vec<DigestLogEntry>> {
        let rows = sqlx::query(
            "SELECT subscriber_id, sent_at_ms, skipped
             FROM digest_log
             WHERE subscriber_id = ?
             ORDER BY sent_at_ms, id",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DigestLogEntry> {
                Ok(DigestLogEntry {
                    subscriber_id: row.get("subscriber_id"),
                    sent_at: ms_to_time(row.get("sent_at_ms"))?,
                    skipped: row.get("skipped"),
                })
            })
            .collect()
    }
}
