//! Configuration loading, validation, env substitution, and `OPERATOR_*`
//! environment overrides.
//!
//! Config files: `operator.toml`, `operator.yaml`, or `operator.json`
//! Searched in `./` then `~/.config/operator/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        MailConfig, OperatorConfig, ScheduleConfig, StorageConfig, UpstreamConfig,
        ValidationConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
