//! Interval strings as readers write them: `90m`, `1h30m`, `1.5h`, `45s`.

use std::time::Duration;

use chrono::TimeDelta;

use crate::{Error, Result};

const NANOS_PER_SEC: u128 = 1_000_000_000;

const UNITS: [(&str, u128); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
];

/// Fraction digits beyond this cannot change a nanosecond result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a signed sequence of decimal numbers, each with a unit suffix.
///
/// A bare `0` is accepted without a unit. Supported units are `ns`, `us`
/// (`µs`), `ms`, `s`, `m` and `h`.
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(Error::invalid_duration(input, "empty"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after) => split_digits(after),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(Error::invalid_duration(input, "expected a number"));
        }

        let unit_end = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_end);
        if unit.is_empty() {
            return Err(Error::invalid_duration(input, "missing unit"));
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| Error::invalid_duration(input, "unknown unit"))?;

        let component = whole_nanos(whole, scale)
            .and_then(|n| n.checked_add(fraction_nanos(fraction, scale)))
            .ok_or_else(|| Error::invalid_duration(input, "overflow"))?;
        total = total
            .checked_add(component)
            .ok_or_else(|| Error::invalid_duration(input, "overflow"))?;
        rest = after;
    }

    let nanos = i64::try_from(total).map_err(|_| Error::invalid_duration(input, "overflow"))?;
    let delta = TimeDelta::nanoseconds(nanos);
    Ok(if negative { -delta } else { delta })
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn whole_nanos(digits: &str, scale: u128) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse::<u128>().ok()?.checked_mul(scale)
}

fn fraction_nanos(digits: &str, scale: u128) -> u128 {
    let digits = &digits[..digits.len().min(MAX_FRACTION_DIGITS)];
    if digits.is_empty() {
        return 0;
    }
    let numerator: u128 = digits.parse().unwrap_or(0);
    let denominator = 10u128.pow(digits.len() as u32);
    numerator * scale / denominator
}

/// Compact rendering for confirmations, e.g. `1h30m`, `45s`.
#[must_use]
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    let (hours, minutes, seconds) = (secs / 3_600, secs % 3_600 / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    let millis = interval.subsec_millis();
    if millis > 0 && secs == 0 {
        out.push_str(&format!("{millis}ms"));
    } else if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}s", fraction.trim_end_matches('0')));
    } else if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{seconds}s"));
    }
    out
}
