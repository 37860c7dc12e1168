use crate::models::TransferRecord;
use crate::repository::TransferStats;
use alloy_primitives::Address;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

pub fn format_transfers(transfers: &[TransferRecord], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_transfers_table(transfers),
        OutputFormat::Json => format_transfers_json(transfers),
        OutputFormat::Csv => format_transfers_csv(transfers),
    }
}

fn format_transfers_table(transfers: &[TransferRecord]) -> String {
    if transfers.is_empty() {
        return "No transfers found.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Block", "Kind", "Punk", "From", "To", "Tx Hash", "Log"]);

    for transfer in transfers {
        table.add_row(vec![
            Cell::new(transfer.block_number),
            Cell::new(transfer.kind),
            Cell::new(transfer.asset_index),
            Cell::new(format_party(&transfer.from_address, transfer.is_mint())),
            Cell::new(format!("{:#}", transfer.to_address)),
            Cell::new(format_tx_hash(&transfer.transaction_hash)),
            Cell::new(transfer.log_index),
        ]);
    }

    table.to_string()
}

fn format_transfers_json(transfers: &[TransferRecord]) -> String {
    let json_transfers: Vec<_> = transfers
        .iter()
        .map(|t| {
            json!({
                "block_number": t.block_number,
                "transaction_index": t.transaction_index,
                "log_index": t.log_index,
                "transaction_hash": t.transaction_hash,
                "kind": t.kind,
                "asset_index": t.asset_index,
                "from": format!("{:?}", t.from_address),
                "to": format!("{:?}", t.to_address),
            })
        })
        .collect();

    serde_json::to_string_pretty(&json_transfers).unwrap_or_else(|_| "[]".to_string())
}

fn format_transfers_csv(transfers: &[TransferRecord]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "block_number",
        "transaction_index",
        "log_index",
        "kind",
        "asset_index",
        "from",
        "to",
        "transaction_hash",
    ]);

    for transfer in transfers {
        let _ = wtr.write_record([
            &transfer.block_number.to_string(),
            &transfer.transaction_index.to_string(),
            &transfer.log_index.to_string(),
            transfer.kind.as_str(),
            &transfer.asset_index.to_string(),
            &format!("{:?}", transfer.from_address),
            &format!("{:?}", transfer.to_address),
            &transfer.transaction_hash,
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

/// Ownership summary for one asset: its current holder plus the transfer chain.
pub fn format_asset_history(
    asset_index: u64,
    owner: Option<Address>,
    transfers: &[TransferRecord],
    format: &OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            let header = match owner {
                Some(owner) => format!("Punk #{asset_index} is held by {owner:#}"),
                None => format!("Punk #{asset_index} has no recorded transfers"),
            };
            format!("{header}\n{}", format_transfers_table(transfers))
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "asset_index": asset_index,
            "owner": owner.map(|o| format!("{o:?}")),
            "transfers": serde_json::from_str::<serde_json::Value>(&format_transfers_json(transfers))
                .unwrap_or_default(),
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => format_transfers_csv(transfers),
    }
}

pub fn format_stats(stats: &TransferStats, format: &OutputFormat) -> String {
    let earliest = stats
        .earliest_block
        .map_or("N/A".to_string(), |b| b.to_string());
    let latest = stats
        .latest_block
        .map_or("N/A".to_string(), |b| b.to_string());

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Metric", "Value"]);

            table.add_row(vec![
                Cell::new("Total Transfers"),
                Cell::new(stats.total_transfers),
            ]);
            table.add_row(vec![Cell::new("Mints"), Cell::new(stats.mints)]);
            table.add_row(vec![
                Cell::new("Unique Punks"),
                Cell::new(stats.unique_assets),
            ]);
            table.add_row(vec![
                Cell::new("Unique Owners"),
                Cell::new(stats.unique_owners),
            ]);
            table.add_row(vec![Cell::new("Earliest Block"), Cell::new(&earliest)]);
            table.add_row(vec![Cell::new("Latest Block"), Cell::new(&latest)]);

            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "total_transfers": stats.total_transfers,
            "mints": stats.mints,
            "unique_assets": stats.unique_assets,
            "unique_owners": stats.unique_owners,
            "earliest_block": stats.earliest_block,
            "latest_block": stats.latest_block,
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["metric", "value"]);
            let _ = wtr.write_record(["total_transfers", &stats.total_transfers.to_string()]);
            let _ = wtr.write_record(["mints", &stats.mints.to_string()]);
            let _ = wtr.write_record(["unique_assets", &stats.unique_assets.to_string()]);
            let _ = wtr.write_record(["unique_owners", &stats.unique_owners.to_string()]);
            let _ = wtr.write_record(["earliest_block", &earliest]);
            let _ = wtr.write_record(["latest_block", &latest]);
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}

fn format_party(address: &Address, minted: bool) -> String {
    if minted {
        "(minted)".to_string()
    } else {
        format!("{address:#}")
    }
}

fn format_tx_hash(hash: &str) -> String {
    if hash.len() <= 12 || !hash.is_ascii() {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}
