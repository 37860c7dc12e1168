use anyhow::Result;
use punk_indexer::config::Config;
use punk_indexer::repository::Database;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let config = Config::from_env()?;
    info!("Running migrations on database: {}", config.database_url);

    let _db = Database::new(&config.database_url)?;

    info!("Migrations completed successfully");

    Ok(())
}
