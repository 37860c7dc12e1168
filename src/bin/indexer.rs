use anyhow::Result;
use punk_indexer::config::{Config, SinkKind};
use punk_indexer::repository::Database;
use punk_indexer::sink::{LogSink, SqliteSink, TransferSink};
use punk_indexer::source::{message_stream, open_input};
use punk_indexer::{EventMatcher, Pipeline, TransferDecoder};
use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting punk transfer indexer");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("Contract address: {:?}", config.indexer.contract_address);
    info!("Deployment block: {}", config.indexer.deployment_block);
    info!("Failure policy: {:?}", config.failure_policy);

    match config.sink {
        SinkKind::Log => {
            run_pipeline(&config, LogSink::new(info_span!("sink", kind = "log"))).await?;
        }
        SinkKind::Sqlite => {
            let db = Database::new(&config.database_url)?;
            info!("Database initialized at {}", config.database_url);

            let sink = run_pipeline(
                &config,
                SqliteSink::new(db, info_span!("sink", kind = "sqlite")),
            )
            .await?;
            info!(
                inserted = sink.inserted(),
                duplicates = sink.duplicates(),
                "SQLite sink finished"
            );
        }
    }

    Ok(())
}

async fn run_pipeline<S: TransferSink>(config: &Config, sink: S) -> Result<S> {
    let reader = open_input(config.input_path.as_deref()).await?;
    match &config.input_path {
        Some(path) => info!("Reading log records from {}", path.display()),
        None => info!("Reading log records from stdin"),
    }

    let mut pipeline = Pipeline::new(
        EventMatcher::new(&config.indexer),
        TransferDecoder::new(&config.indexer),
        sink,
        config.failure_policy,
        info_span!("pipeline"),
    );

    if let Err(e) = pipeline.run(message_stream(reader)).await {
        error!("Pipeline error: {:#}", e);
        return Err(e);
    }

    Ok(pipeline.into_sink())
}
