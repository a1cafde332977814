//! The intake job: read unread requests and apply them to the store.

use std::{result::Result as StdResult, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    chrono::TimeDelta,
    operator_mail::{InboundMessage, MailFetcher, MailSender, OutgoingMail, Sanitizer},
    operator_scheduler::{BoxError, Job, JobKind},
    operator_store::{NewSubscriber, SubscriberPatch, SubscriberStore, stored_interval},
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    body::parse_body,
    command::{Command, classify},
    render::{
        SUBSCRIBE_SUBJECT, UNSUBSCRIBE_SUBJECT, UPDATE_SUBJECT, render_subscribed,
        render_unsubscribed, render_updated,
    },
};

/// Counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeSummary {
    pub received: usize,
    pub applied: usize,
    pub ignored: usize,
    pub failed: usize,
}

enum Outcome {
    Applied,
    Ignored,
}

pub struct IntakeJob {
    store: Arc<dyn SubscriberStore>,
    fetcher: Arc<dyn MailFetcher>,
    sender: Arc<dyn MailSender>,
    sanitizer: Arc<dyn Sanitizer>,
    folders: Vec<String>,
}

impl IntakeJob {
    /// Messages are read from `inbox_folder` first, then `junk_folder`.
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        fetcher: Arc<dyn MailFetcher>,
        sender: Arc<dyn MailSender>,
        sanitizer: Arc<dyn Sanitizer>,
        inbox_folder: impl Into<String>,
        junk_folder: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            sender,
            sanitizer,
            folders: vec![inbox_folder.into(), junk_folder.into()],
        }
    }

    /// Run one tick. A folder that cannot be read is logged and skipped;
    /// a message that cannot be applied is logged and skipped.
    pub async fn run_once(&self) -> IntakeSummary {
        let mut summary = IntakeSummary::default();
        for folder in &self.folders {
            let messages = match self.fetcher.fetch_unread(folder).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(folder = %folder, error = %e, "failed to read folder");
                    continue;
                },
            };
            debug!(folder = %folder, count = messages.len(), "read unread messages");

            for message in &messages {
                summary.received += 1;
                match self.process(message).await {
                    Ok(Outcome::Applied) => summary.applied += 1,
                    Ok(Outcome::Ignored) => summary.ignored += 1,
                    Err(e) => {
                        summary.failed += 1;
                        warn!(
                            from = %message.from_address,
                            subject = %message.subject,
                            error = %e,
                            "failed to apply request"
                        );
                    },
                }
            }
        }
        if summary.received > 0 {
            info!(
                received = summary.received,
                applied = summary.applied,
                ignored = summary.ignored,
                failed = summary.failed,
                "intake tick finished"
            );
        }
        summary
    }

    async fn process(&self, message: &InboundMessage) -> Result<Outcome> {
        match classify(&message.subject) {
            Some(Command::Subscribe) => self.subscribe(message).await,
            Some(Command::Update) => self.update(message).await,
            Some(Command::Unsubscribe) => self.unsubscribe(message).await,
            None => Ok(Outcome::Ignored),
        }
    }

    async fn subscribe(&self, message: &InboundMessage) -> Result<Outcome> {
        let info = parse_body(message, self.sanitizer.as_ref());
        let interval = info
            .interval
            .and_then(positive)
            .ok_or(Error::NonPositiveInterval)?;

        let subscriber = self
            .store
            .create_subscriber(&NewSubscriber {
                email: info.email,
                handle: info.handle.filter(|h| !h.is_empty()),
                interval,
            })
            .await?;
        info!(subscriber_id = subscriber.id, email = %subscriber.email, "added reader");

        self.confirm(&subscriber.email, SUBSCRIBE_SUBJECT, render_subscribed(&subscriber))
            .await;
        Ok(Outcome::Applied)
    }

    async fn update(&self, message: &InboundMessage) -> Result<Outcome> {
        let info = parse_body(message, self.sanitizer.as_ref());
        let patch = SubscriberPatch {
            handle: info.handle.map(|h| Some(h).filter(|h| !h.is_empty())),
            interval: info.interval.and_then(positive),
        };

        let subscriber = self.store.update_subscriber(&info.email, &patch).await?;
        info!(
            subscriber_id = subscriber.id,
            email = %subscriber.email,
            handle_changed = patch.handle.is_some(),
            interval_changed = patch.interval.is_some(),
            "updated reader"
        );

        self.confirm(&subscriber.email, UPDATE_SUBJECT, render_updated(&subscriber))
            .await;
        Ok(Outcome::Applied)
    }

    async fn unsubscribe(&self, message: &InboundMessage) -> Result<Outcome> {
        let email = self.sanitizer.sanitize(&message.from_address);
        if !self.store.delete_subscriber(&email).await? {
            debug!(email = %email, "unsubscribe from unknown reader");
            return Ok(Outcome::Ignored);
        }
        info!(email = %email, "deleted reader");

        self.confirm(&email, UNSUBSCRIBE_SUBJECT, render_unsubscribed())
            .await;
        Ok(Outcome::Applied)
    }

    /// Confirmation happens after the change is stored; failing to send it
    /// does not undo the change.
    async fn confirm(&self, to: &str, subject: &str, body: Result<String>) {
        let sent = match body {
            Ok(body) => self
                .sender
                .send(&OutgoingMail::new(to, subject, body))
                .await
                .map_err(Error::from),
            Err(e) => Err(e),
        };
        match sent {
            Ok(()) => debug!(to = %to, subject, "sent confirmation"),
            Err(e) => warn!(to = %to, subject, error = %e, "failed to send confirmation"),
        }
    }
}

/// The interval as the store will keep it, or `None` unless it is positive.
fn positive(interval: TimeDelta) -> Option<Duration> {
    if interval <= TimeDelta::zero() {
        return None;
    }
    stored_interval(interval.to_std().ok()?).ok()
}

#[async_trait]
impl Job for IntakeJob {
    fn kind(&self) -> JobKind {
        JobKind::Intake
    }

    async fn execute(&self) -> StdResult<(), BoxError> {
        self.run_once().await;
        Ok(())
    }
}
