use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Whether a subscriber should be evaluated at `now`.
///
/// Due when there is no previous entry, or when `last + interval <= now`.
/// An interval too large to represent never comes due.
#[must_use]
pub fn is_due(last_sent: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> bool {
    let Some(last) = last_sent else {
        return true;
    };
    TimeDelta::from_std(interval)
        .ok()
        .and_then(|delta| last.checked_add_signed(delta))
        .is_some_and(|next| next <= now)
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, rstest::rstest};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn never_logged_is_due() {
        assert!(is_due(None, Duration::from_secs(3600), at(0)));
    }

    #[rstest]
    #[case(60, 0, false)]
    #[case(60, 59, false)]
    #[case(60, 60, true)]
    #[case(60, 61, true)]
    #[case(1, 1, true)]
    #[case(86_400, 3_600, false)]
    fn due_exactly_when_interval_elapsed(
        #[case] interval_secs: u64,
        #[case] elapsed_secs: i64,
        #[case] expected: bool,
    ) {
        let last = at(0);
        assert_eq!(
            is_due(
                Some(last),
                Duration::from_secs(interval_secs),
                at(elapsed_secs)
            ),
            expected
        );
    }

    #[test]
    fn sweep_of_intervals_matches_arithmetic() {
        for interval in [1_u64, 7, 60, 3_599, 3_600, 86_400] {
            for offset in -2_i64..=2 {
                let now_secs = interval as i64 + offset;
                let due = is_due(Some(at(0)), Duration::from_secs(interval), at(now_secs));
                assert_eq!(due, offset >= 0, "interval {interval} offset {offset}");
            }
        }
    }

    #[test]
    fn unrepresentable_interval_is_never_due() {
        assert!(!is_due(Some(at(0)), Duration::MAX, at(1_000_000)));
    }
}
