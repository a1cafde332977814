//! Extracting reader details from a request body.

use std::sync::LazyLock;

use {
    chrono::TimeDelta,
    operator_mail::{InboundMessage, Sanitizer},
    regex::Regex,
};

use crate::duration::parse_duration;

#[allow(clippy::expect_used)]
static GITHUB_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)github:\s*(\S*)").expect("valid regex"));

#[allow(clippy::expect_used)]
static INTERVAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)interval:\s*(\S*)").expect("valid regex"));

/// What a reader told us about themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderInfo {
    /// Sanitized sender address.
    pub email: String,
    /// `Some("")` when a `github:` line was present with no value.
    pub handle: Option<String>,
    /// Signed; positivity is checked by the caller.
    pub interval: Option<TimeDelta>,
}

/// Scan trimmed body lines for the first `github:` line and the first
/// `interval:` line that parses. Other lines are ignored.
pub fn parse_body(message: &InboundMessage, sanitizer: &dyn Sanitizer) -> ReaderInfo {
    let mut info = ReaderInfo {
        email: sanitizer.sanitize(&message.from_address),
        handle: None,
        interval: None,
    };

    for line in message.text_body.lines().map(str::trim) {
        if let Some(captures) = GITHUB_LINE.captures(line) {
            if info.handle.is_none() {
                info.handle = Some(sanitizer.sanitize(&captures[1]));
            }
            continue;
        }
        if info.interval.is_none()
            && let Some(captures) = INTERVAL_LINE.captures(line)
        {
            info.interval = parse_duration(&captures[1]).ok();
        }
    }
    info
}
