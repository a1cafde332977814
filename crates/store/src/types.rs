//! Rows of the subscriber store.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Round an interval up to the whole milliseconds both stores keep.
///
/// Zero is rejected. Any positive interval, however small, keeps at least
/// one millisecond, so a value accepted here is never lost on the way to disk.
pub fn stored_interval(interval: Duration) -> Result<Duration> {
    if interval.is_zero() {
        return Err(Error::NonPositiveInterval);
    }
    let ms = u64::try_from(interval.as_nanos().div_ceil(1_000_000))
        .map_err(|_| Error::message(format!("interval too large: {interval:?}")))?;
    Ok(Duration::from_millis(ms))
}

/// A reader receiving digests at a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub handle: Option<String>,
    /// Whole milliseconds, always greater than zero.
    pub interval: Duration,
    pub active: bool,
}

/// Input for creating a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscriber {
    pub email: String,
    pub handle: Option<String>,
    pub interval: Duration,
}

/// Fields to change on an existing subscriber; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberPatch {
    /// `Some(None)` clears the handle.
    pub handle: Option<Option<String>>,
    pub interval: Option<Duration>,
}

impl SubscriberPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handle.is_none() && self.interval.is_none()
    }
}

/// One evaluation of a subscriber by the digest job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestLogEntry {
    pub subscriber_id: i64,
    pub sent_at: DateTime<Utc>,
    /// `true` when nothing was sent because there was nothing new.
    pub skipped: bool,
}

/// A subscriber selected by the due query, with its latest log time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSubscriber {
    pub id: i64,
    pub email: String,
    pub handle: Option<String>,
    pub last_sent: Option<DateTime<Utc>>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case::sub_millisecond(Duration::from_micros(500), Duration::from_millis(1))]
    #[case::fraction(Duration::from_micros(1_500), Duration::from_millis(2))]
    #[case::one_nanosecond(Duration::from_nanos(1), Duration::from_millis(1))]
    #[case::whole(Duration::from_secs(3_600), Duration::from_secs(3_600))]
    fn intervals_round_up_to_millis(#[case] input: Duration, #[case] expected: Duration) {
        assert_eq!(stored_interval(input).unwrap(), expected);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            stored_interval(Duration::ZERO),
            Err(Error::NonPositiveInterval)
        ));
    }
}
