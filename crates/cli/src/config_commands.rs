use std::path::Path;

use {
    anyhow::{Context, bail},
    operator_config::{
        OperatorConfig, Severity, ValidationResult, apply_env_overrides, discover_and_load,
        load_config, validate,
    },
    tracing::{error, warn},
};

use crate::Cli;

/// Load, apply `OPERATOR_*` overrides and validate. Errors are fatal.
pub fn load(cli: &Cli) -> anyhow::Result<OperatorConfig> {
    let config = read(cli.config.as_deref())?;
    let result = validate(&config);
    log_diagnostics(&result);
    if result.has_errors() {
        bail!("configuration is invalid");
    }
    Ok(config)
}

/// Print every diagnostic and fail when any of them is an error.
pub fn check(cli: &Cli) -> anyhow::Result<()> {
    let config = read(cli.config.as_deref())?;
    let result = validate(&config);
    if result.diagnostics.is_empty() {
        println!("Configuration OK.");
        return Ok(());
    }
    for diagnostic in &result.diagnostics {
        println!("{diagnostic}");
    }
    if result.has_errors() {
        bail!("configuration is invalid");
    }
    Ok(())
}

fn read(path: Option<&Path>) -> anyhow::Result<OperatorConfig> {
    let config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => discover_and_load(),
    };
    Ok(apply_env_overrides(config))
}

fn log_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
        }
    }
}
