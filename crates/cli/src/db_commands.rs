use tracing::info;

use crate::{Cli, config_commands, services::connect_store};

/// Apply the bundled migrations regardless of `storage.migrate_on_start`.
pub async fn migrate(cli: &Cli) -> anyhow::Result<()> {
    let config = config_commands::load(cli)?;
    connect_store(&config, true).await?;
    info!(database = %config.storage.database_url, "migrations complete");
    Ok(())
}
