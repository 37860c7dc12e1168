use anyhow::Result;
use clap::{Parser, Subcommand};
use punk_indexer::config::Config;
use punk_indexer::query::commands::{
    AddressHistoryQuery, TransferQuery, cmd_address_history, cmd_history, cmd_stats,
    cmd_transfers,
};
use punk_indexer::query::formatters::OutputFormat;
use punk_indexer::repository::{Database, TransferRepository};

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Query indexed punk transfers", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Transfers {
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        asset: Option<u64>,

        #[arg(long)]
        block: Option<u64>,

        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        block_range: Option<Vec<u64>>,

        #[arg(long, default_value = "false")]
        mints_only: bool,

        #[arg(long, default_value = "100")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },
    History {
        asset: u64,
    },
    AddressHistory {
        address: String,
        #[arg(long, default_value = "100")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url)?;
    let transfer_repo = TransferRepository::new(&db.conn);

    match cli.command {
        Commands::Transfers {
            from,
            to,
            asset,
            block,
            block_range,
            mints_only,
            limit,
            offset,
        } => {
            let block_range = block_range.and_then(|v| match v.as_slice() {
                [start, end] => Some((*start, *end)),
                _ => None,
            });
            let query = TransferQuery {
                from,
                to,
                asset,
                block,
                block_range,
                mints_only,
                limit,
                offset,
            };
            cmd_transfers(&transfer_repo, query, &format)?;
        }
        Commands::History { asset } => {
            cmd_history(&transfer_repo, asset, &format)?;
        }
        Commands::AddressHistory {
            address,
            limit,
            offset,
        } => {
            let query = AddressHistoryQuery {
                address,
                limit,
                offset,
            };
            cmd_address_history(&transfer_repo, query, &format)?;
        }
        Commands::Stats => {
            cmd_stats(&transfer_repo, &format)?;
        }
    }

    Ok(())
}
