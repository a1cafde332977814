//! The digest job: decide who is due, pick what is new for them, send or
//! skip, and log the outcome.

use std::{result::Result as StdResult, sync::Arc};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    operator_mail::{MailSender, OutgoingMail},
    operator_scheduler::{BoxError, Job, JobKind},
    operator_store::{DueSubscriber, SubscriberStore},
    operator_submissions::{Catalog, CatalogEntry},
    tracing::{debug, info, warn},
};

use crate::{Result, clock::Clock, render::render_digest};

pub const DIGEST_SUBJECT: &str = "Updated Dalamud Plugin Pull Requests";

/// Counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Sent,
    Skipped,
}

/// Entries updated strictly after `since`; everything when `since` is `None`.
#[must_use]
pub fn select_updates(
    entries: &[CatalogEntry],
    since: Option<DateTime<Utc>>,
) -> Vec<&CatalogEntry> {
    entries
        .iter()
        .filter(|e| since.is_none_or(|since| e.submission.updated_at > since))
        .collect()
}

pub struct DigestJob {
    store: Arc<dyn SubscriberStore>,
    catalog: Arc<Catalog>,
    sender: Arc<dyn MailSender>,
    clock: Arc<dyn Clock>,
}

impl DigestJob {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        catalog: Arc<Catalog>,
        sender: Arc<dyn MailSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            sender,
            clock,
        }
    }

    /// Run one tick.
    ///
    /// Failing to enumerate subscribers or to list submissions aborts the
    /// tick. Anything that goes wrong for a single subscriber is logged and
    /// leaves that subscriber due for the next tick.
    pub async fn run_once(&self) -> Result<TickSummary> {
        let now = self.clock.now();
        let due = self.store.due_subscribers(now).await?;
        let mut summary = TickSummary {
            due: due.len(),
            ..Default::default()
        };
        if due.is_empty() {
            debug!("no subscribers due");
            return Ok(summary);
        }

        let entries = self.catalog.build().await?;

        for subscriber in &due {
            match self.deliver(subscriber, &entries, now).await {
                Ok(Outcome::Sent) => summary.sent += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        subscriber_id = subscriber.id,
                        email = %subscriber.email,
                        error = %e,
                        "digest failed, subscriber stays due"
                    );
                },
            }
        }

        info!(
            due = summary.due,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "digest tick finished"
        );
        Ok(summary)
    }

    async fn deliver(
        &self,
        subscriber: &DueSubscriber,
        entries: &[CatalogEntry],
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let selected = select_updates(entries, subscriber.last_sent);

        if selected.is_empty() {
            // The skip entry advances the due clock without sending.
            self.store.append_log(subscriber.id, now, true).await?;
            debug!(subscriber_id = subscriber.id, "nothing new, skipped");
            return Ok(Outcome::Skipped);
        }

        let body = render_digest(&selected)?;
        self.sender
            .send(&OutgoingMail::new(&subscriber.email, DIGEST_SUBJECT, body))
            .await?;
        info!(
            subscriber_id = subscriber.id,
            email = %subscriber.email,
            count = selected.len(),
            "sent digest"
        );
        self.store.append_log(subscriber.id, now, false).await?;
        Ok(Outcome::Sent)
    }
}

#[async_trait]
impl Job for DigestJob {
    fn kind(&self) -> JobKind {
        JobKind::Digest
    }

    async fn execute(&self) -> StdResult<(), BoxError> {
        self.run_once().await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::clock::FixedClock,
        chrono::{TimeDelta, TimeZone},
        operator_mail::MemoryOutbox,
        operator_store::{DigestLogEntry, InMemoryStore, NewSubscriber, Subscriber, SubscriberPatch},
        operator_submissions::{StaticSource, Submission, Validator},
        std::time::Duration,
        url::Url,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn submission(number: u64, updated_at: DateTime<Utc>) -> Submission {
        Submission {
            number,
            title: format!("Plugin {number}"),
            url: format!("https://github.example/pull/{number}"),
            diff_url: format!("https://github.example/pull/{number}.diff"),
            labels: Vec::new(),
            submitter: "someone".into(),
            updated_at,
            base: None,
            head: None,
        }
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        source: Arc<StaticSource>,
        outbox: Arc<MemoryOutbox>,
        clock: Arc<FixedClock>,
        job: DigestJob,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let source = Arc::new(StaticSource::new());
        let outbox = Arc::new(MemoryOutbox::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let validator = Validator::new(source.clone(), Url::parse("https://raw.example").unwrap());
        let catalog = Arc::new(Catalog::new(validator, 2));
        let job = DigestJob::new(store.clone(), catalog, outbox.clone(), clock.clone());
        Harness {
            store,
            source,
            outbox,
            clock,
            job,
        }
    }

    async fn subscribe(h: &Harness, email: &str, minutes: u64) -> i64 {
        h.store
            .create_subscriber(&NewSubscriber {
                email: email.into(),
                handle: None,
                interval: Duration::from_secs(minutes * 60),
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn selection_is_strictly_after_last_send() {
        let entries: Vec<CatalogEntry> = [t0() - TimeDelta::hours(1), t0(), t0() + TimeDelta::hours(1)]
            .into_iter()
            .enumerate()
            .map(|(i, at)| CatalogEntry {
                submission: submission(i as u64, at),
                validation: Err(operator_submissions::Error::MissingEntry),
            })
            .collect();

        assert_eq!(select_updates(&entries, None).len(), 3);
        let after_t0: Vec<_> = select_updates(&entries, Some(t0()))
            .iter()
            .map(|e| e.submission.number)
            .collect();
        assert_eq!(after_t0, [2]);
    }

    #[tokio::test]
    async fn nothing_due_sends_nothing_and_skips_listing() {
        let h = harness();
        h.source.fail_listing(true);
        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary, TickSummary::default());
    }

    #[tokio::test]
    async fn first_digest_sends_everything() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.source
            .set_submissions(vec![submission(1, t0() - TimeDelta::days(3))]);

        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.sent, 1);

        let sent = h.outbox.sent_to("reader@example.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, DIGEST_SUBJECT);
        assert!(sent[0].html_body.contains("Plugin 1"));

        let log = h.store.log_entries(id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(!log[0].skipped);
        assert_eq!(log[0].sent_at, t0());
    }

    #[tokio::test]
    async fn empty_selection_appends_one_skip_entry() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.store
            .append_log(id, t0() - TimeDelta::hours(2), false)
            .await
            .unwrap();
        h.source
            .set_submissions(vec![submission(1, t0() - TimeDelta::hours(3))]);

        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(h.outbox.sent().is_empty());

        let log = h.store.log_entries(id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[1].skipped);
        assert_eq!(log[1].sent_at, t0());

        // The skip entry makes the subscriber not due on the next tick.
        h.clock.advance(TimeDelta::minutes(2));
        assert_eq!(h.job.run_once().await.unwrap().due, 0);
    }

    #[tokio::test]
    async fn only_newer_submissions_are_sent() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.store
            .append_log(id, t0() - TimeDelta::hours(2), false)
            .await
            .unwrap();
        h.source.set_submissions(vec![
            submission(1, t0() - TimeDelta::hours(3)),
            submission(2, t0() - TimeDelta::hours(1)),
        ]);

        h.job.run_once().await.unwrap();
        let sent = h.outbox.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html_body.contains("Plugin 2"));
        assert!(!sent[0].html_body.contains("Plugin 1"));
    }

    #[tokio::test]
    async fn send_failure_logs_nothing_and_retries_next_tick() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.source.set_submissions(vec![submission(1, t0())]);
        h.outbox.fail_for("reader@example.com");

        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(h.store.log_entries(id).await.unwrap().is_empty());

        h.outbox.clear_failures();
        h.clock.advance(TimeDelta::minutes(2));
        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(h.store.log_entries(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let h = harness();
        let a = subscribe(&h, "a@example.com", 60).await;
        let b = subscribe(&h, "b@example.com", 60).await;
        let c = subscribe(&h, "c@example.com", 60).await;
        h.source.set_submissions(vec![submission(1, t0())]);
        h.outbox.fail_for("b@example.com");

        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary, TickSummary {
            due: 3,
            sent: 2,
            skipped: 0,
            failed: 1,
        });
        assert_eq!(h.store.log_entries(a).await.unwrap().len(), 1);
        assert!(h.store.log_entries(b).await.unwrap().is_empty());
        assert_eq!(h.store.log_entries(c).await.unwrap().len(), 1);
    }

    /// Delegates to an in-memory store but refuses log appends for one id.
    struct RefusingLog {
        inner: Arc<InMemoryStore>,
        refuse: i64,
    }

    #[async_trait]
    impl SubscriberStore for RefusingLog {
        async fn create_subscriber(&self, new: &NewSubscriber) -> operator_store::Result<Subscriber> {
            self.inner.create_subscriber(new).await
        }

        async fn find_by_email(&self, email: &str) -> operator_store::Result<Option<Subscriber>> {
            self.inner.find_by_email(email).await
        }

        async fn update_subscriber(
            &self,
            email: &str,
            patch: &SubscriberPatch,
        ) -> operator_store::Result<Subscriber> {
            self.inner.update_subscriber(email, patch).await
        }

        async fn delete_subscriber(&self, email: &str) -> operator_store::Result<bool> {
            self.inner.delete_subscriber(email).await
        }

        async fn due_subscribers(
            &self,
            now: DateTime<Utc>,
        ) -> operator_store::Result<Vec<DueSubscriber>> {
            self.inner.due_subscribers(now).await
        }

        async fn append_log(
            &self,
            subscriber_id: i64,
            at: DateTime<Utc>,
            skipped: bool,
        ) -> operator_store::Result<()> {
            if subscriber_id == self.refuse {
                return Err(operator_store::Error::message("disk full"));
            }
            self.inner.append_log(subscriber_id, at, skipped).await
        }

        async fn log_entries(&self, subscriber_id: i64) -> operator_store::Result<Vec<DigestLogEntry>> {
            self.inner.log_entries(subscriber_id).await
        }
    }

    #[tokio::test]
    async fn persistence_failure_is_isolated() {
        let h = harness();
        let a = subscribe(&h, "a@example.com", 60).await;
        let b = subscribe(&h, "b@example.com", 60).await;
        h.source.set_submissions(vec![submission(1, t0())]);

        let validator = Validator::new(h.source.clone(), Url::parse("https://raw.example").unwrap());
        let job = DigestJob::new(
            Arc::new(RefusingLog {
                inner: h.store.clone(),
                refuse: a,
            }),
            Arc::new(Catalog::new(validator, 1)),
            h.outbox.clone(),
            h.clock.clone(),
        );

        let summary = job.run_once().await.unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        // The mail went out, but without a log entry `a` stays due.
        assert_eq!(h.outbox.sent().len(), 2);
        assert!(h.store.log_entries(a).await.unwrap().is_empty());
        assert_eq!(h.store.log_entries(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_aborts_tick() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.source.fail_listing(true);
        assert!(h.job.run_once().await.is_err());
        assert!(h.store.log_entries(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_subscribers_are_ignored() {
        let h = harness();
        subscribe(&h, "reader@example.com", 60).await;
        h.store.set_active("reader@example.com", false);
        h.source.set_submissions(vec![submission(1, t0())]);
        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.due, 0);
        assert!(h.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn due_again_after_interval() {
        let h = harness();
        let id = subscribe(&h, "reader@example.com", 60).await;
        h.source.set_submissions(vec![submission(1, t0())]);
        h.job.run_once().await.unwrap();

        h.clock.advance(TimeDelta::minutes(59));
        assert_eq!(h.job.run_once().await.unwrap().due, 0);

        h.clock.advance(TimeDelta::minutes(1));
        h.source
            .set_submissions(vec![submission(1, t0()), submission(2, t0() + TimeDelta::minutes(30))]);
        let summary = h.job.run_once().await.unwrap();
        assert_eq!(summary.sent, 1);
        let log = h.store.log_entries(id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].sent_at, t0() + TimeDelta::hours(1));
    }
}
