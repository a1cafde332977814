//! Semantic checks on a loaded configuration.

use crate::schema::OperatorConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "schedule.digest_interval_secs"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Check a config for values the jobs cannot run with.
///
/// Missing mail settings are warnings: the jobs still start, but every send
/// or fetch fails until they are provided.
#[must_use]
pub fn validate(config: &OperatorConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.schedule.digest_interval_secs == 0 {
        result.push(
            Severity::Error,
            "schedule.digest_interval_secs",
            "must be greater than zero",
        );
    }
    if config.schedule.intake_interval_secs == 0 {
        result.push(
            Severity::Error,
            "schedule.intake_interval_secs",
            "must be greater than zero",
        );
    }
    if config.validation.concurrency == 0 {
        result.push(
            Severity::Error,
            "validation.concurrency",
            "must be greater than zero",
        );
    }
    if config.storage.max_connections == 0 {
        result.push(
            Severity::Error,
            "storage.max_connections",
            "must be greater than zero",
        );
    }
    if config.upstream.owner.trim().is_empty() || config.upstream.repo.trim().is_empty() {
        result.push(
            Severity::Error,
            "upstream",
            "owner and repo must both be set",
        );
    }
    if url_has_placeholder(&config.storage.database_url) {
        result.push(
            Severity::Error,
            "storage.database_url",
            "contains an unresolved ${...} placeholder",
        );
    }

    let mail = &config.mail;
    if mail.address.is_none() {
        result.push(Severity::Warning, "mail.address", "not set (OPERATOR_EMAIL)");
    }
    if mail.password.is_none() {
        result.push(
            Severity::Warning,
            "mail.password",
            "not set (OPERATOR_PASSWORD)",
        );
    }
    if mail.smtp_server.is_none() {
        result.push(
            Severity::Warning,
            "mail.smtp_server",
            "not set (OPERATOR_SMTP_SERVER), digests cannot be sent",
        );
    }
    if mail.imap_server.is_none() {
        result.push(
            Severity::Warning,
            "mail.imap_server",
            "not set (OPERATOR_IMAP_SERVER), subscriptions cannot be read",
        );
    }

    result
}

fn url_has_placeholder(value: &str) -> bool {
    value.contains("${")
}
