use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{env_subst::substitute_env, schema::OperatorConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "operator.toml",
    "operator.yaml",
    "operator.yml",
    "operator.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<OperatorConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./operator.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/operator/operator.{toml,yaml,yml,json}` (user-global)
///
/// Returns `OperatorConfig::default()` if no config file is found.
pub fn discover_and_load() -> OperatorConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    OperatorConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/operator/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "operator").map(|d| d.config_dir().to_path_buf())
}

/// Apply `OPERATOR_*` environment variables on top of a loaded config.
pub fn apply_env_overrides(config: OperatorConfig) -> OperatorConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: OperatorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> OperatorConfig {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("OPERATOR_EMAIL") {
        config.mail.address = Some(v);
    }
    if let Some(v) = get("OPERATOR_PASSWORD") {
        config.mail.password = Some(Secret::new(v));
    }
    if let Some(v) = get("OPERATOR_SMTP_SERVER") {
        config.mail.smtp_server = Some(v);
    }
    if let Some(v) = get("OPERATOR_IMAP_SERVER") {
        config.mail.imap_server = Some(v);
    }
    if let Some(v) = get("OPERATOR_INBOX") {
        config.mail.inbox_folder = v;
    }
    if let Some(v) = get("OPERATOR_JUNK") {
        config.mail.junk_folder = v;
    }
    if let Some(v) = get("OPERATOR_REPO_OWNER") {
        config.upstream.owner = v;
    }
    if let Some(v) = get("OPERATOR_REPO_NAME") {
        config.upstream.repo = v;
    }
    if let Some(v) = get("OPERATOR_GITHUB_TOKEN") {
        config.upstream.token = Some(Secret::new(v));
    }

    // OPERATOR_POSTGRES used to carry a bare host name; only a full URL can
    // stand in for the database URL.
    if let Some(v) = get("OPERATOR_POSTGRES") {
        if v.contains("://") {
            info!("using storage URL from OPERATOR_POSTGRES");
            config.storage.database_url = v;
        } else {
            warn!(host = %v, "OPERATOR_POSTGRES is not a URL, ignoring");
        }
    }
    if let Some(v) = get("OPERATOR_DATABASE_URL") {
        config.storage.database_url = v;
    }

    config
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<OperatorConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
