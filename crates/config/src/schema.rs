/// Config schema types (upstream repository, mail, storage, schedule, validation).
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub upstream: UpstreamConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub validation: ValidationConfig,
}

/// The plugin repository whose open pull requests are reviewed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub owner: String,
    pub repo: String,
    /// Base URL of the hosting REST API.
    pub api_url: String,
    /// Base URL that serves raw file content as `{base}/{owner}/{repo}/{ref}/{path}`.
    pub raw_content_url: String,
    pub user_agent: String,
    /// Optional API token. Unauthenticated requests are rate limited harder.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            owner: "goatcorp".into(),
            repo: "DalamudPlugins".into(),
            api_url: "https://api.github.com".into(),
            raw_content_url: "https://raw.githubusercontent.com".into(),
            user_agent: "operator".into(),
            token: None,
        }
    }
}

/// Outbound (SMTP) and inbound (IMAP) mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Account address; used as the login and as the From address.
    pub address: Option<String>,
    pub display_name: String,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
    /// `host:port` of the submission server.
    pub smtp_server: Option<String>,
    /// `host[:port]` of the IMAP server; port defaults to 993.
    pub imap_server: Option<String>,
    pub inbox_folder: String,
    pub junk_folder: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            address: None,
            display_name: "Caprine Operator".into(),
            password: None,
            smtp_server: None,
            imap_server: None,
            inbox_folder: "INBOX".into(),
            junk_folder: "Junk".into(),
        }
    }
}

impl MailConfig {
    /// `Display Name <address>`, or `None` when no address is configured.
    #[must_use]
    pub fn from_header(&self) -> Option<String> {
        self.address
            .as_deref()
            .map(|addr| format!("{} <{addr}>", self.display_name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Apply the bundled migrations on start-up.
    pub migrate_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://operator.db?mode=rwc".into(),
            max_connections: 4,
            migrate_on_start: true,
        }
    }
}

/// Fixed trigger periods for the two jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub digest_interval_secs: u64,
    pub intake_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            digest_interval_secs: 120,
            intake_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// How many submissions are validated at once.
    pub concurrency: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
