//! Wiring the long-lived collaborators both jobs share.

use std::sync::Arc;

use {
    anyhow::Context,
    operator_config::OperatorConfig,
    operator_digest::{DigestJob, SystemClock},
    operator_inbox::IntakeJob,
    operator_mail::{HtmlSanitizer, ImapFetcher, SmtpSender},
    operator_store::{SqliteStore, migrations::run_migrations},
    operator_submissions::{Catalog, GitHubSource, Validator},
    tracing::info,
};

pub struct Services {
    config: OperatorConfig,
    store: Arc<SqliteStore>,
    catalog: Arc<Catalog>,
    sender: Arc<SmtpSender>,
    fetcher: Arc<ImapFetcher>,
}

/// Listing and validation only; needs no database or mail account.
pub fn build_catalog(config: &OperatorConfig) -> anyhow::Result<Catalog> {
    let source = GitHubSource::from_config(&config.upstream)
        .context("invalid upstream configuration")?;
    let validator = Validator::from_config(Arc::new(source), &config.upstream)
        .context("invalid upstream raw content URL")?;
    Ok(Catalog::new(validator, config.validation.concurrency))
}

/// Open the configured database, optionally applying the bundled migrations.
pub async fn connect_store(config: &OperatorConfig, migrate: bool) -> anyhow::Result<SqliteStore> {
    let storage = &config.storage;
    let store = SqliteStore::connect(&storage.database_url, storage.max_connections)
        .await
        .with_context(|| format!("failed to open database {}", storage.database_url))?;
    if migrate || storage.migrate_on_start {
        run_migrations(store.pool())
            .await
            .context("failed to apply migrations")?;
        info!("database migrations applied");
    }
    Ok(store)
}

impl Services {
    pub async fn connect(config: OperatorConfig, migrate: bool) -> anyhow::Result<Self> {
        let store = connect_store(&config, migrate).await?;
        let catalog = build_catalog(&config)?;
        let sender = SmtpSender::from_config(&config.mail).context("invalid SMTP settings")?;
        let fetcher = ImapFetcher::from_config(&config.mail).context("invalid IMAP settings")?;
        Ok(Self {
            config,
            store: Arc::new(store),
            catalog: Arc::new(catalog),
            sender: Arc::new(sender),
            fetcher: Arc::new(fetcher),
        })
    }

    pub fn digest_job(&self) -> DigestJob {
        DigestJob::new(
            self.store.clone(),
            Arc::clone(&self.catalog),
            self.sender.clone(),
            Arc::new(SystemClock),
        )
    }

    pub fn intake_job(&self) -> IntakeJob {
        IntakeJob::new(
            self.store.clone(),
            self.fetcher.clone(),
            self.sender.clone(),
            Arc::new(HtmlSanitizer::new()),
            self.config.mail.inbox_folder.clone(),
            self.config.mail.junk_folder.clone(),
        )
    }
}
