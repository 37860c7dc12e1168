use crate::query::formatters::{
    OutputFormat, format_asset_history, format_stats, format_transfers,
};
use crate::repository::{TransferFilter, TransferRepository};
use alloy_primitives::Address;
use anyhow::Result;
use std::str::FromStr;

#[derive(Default)]
pub struct TransferQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub asset: Option<u64>,
    pub block: Option<u64>,
    pub block_range: Option<(u64, u64)>,
    pub mints_only: bool,
    pub limit: usize,
    pub offset: usize,
}

pub struct AddressHistoryQuery {
    pub address: String,
    pub limit: usize,
    pub offset: usize,
}

fn parse_address(label: &str, value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|_| anyhow::anyhow!("Invalid {} address: {}", label, value))
}

pub fn build_filter(query: &TransferQuery) -> Result<TransferFilter> {
    let from_address = query
        .from
        .as_deref()
        .map(|addr| parse_address("from", addr))
        .transpose()?;

    let to_address = query
        .to
        .as_deref()
        .map(|addr| parse_address("to", addr))
        .transpose()?;

    let block_range = match (query.block, query.block_range) {
        (Some(block), _) => Some((block, block)),
        (None, Some((start, end))) if start > end => {
            anyhow::bail!("Invalid block range: {} is after {}", start, end)
        }
        (None, range) => range,
    };

    let filter = TransferFilter {
        from_address,
        to_address,
        asset_index: query.asset,
        block_range,
        mints_only: query.mints_only,
    };

    if filter.is_empty() {
        anyhow::bail!(
            "Please specify at least one filter: --from, --to, --asset, --block, --block-range or --mints-only"
        );
    }

    Ok(filter)
}

pub fn cmd_transfers(
    transfer_repo: &TransferRepository,
    query: TransferQuery,
    format: &OutputFormat,
) -> Result<()> {
    let filter = build_filter(&query)?;
    let transfers = transfer_repo.query_transfers(&filter, query.limit, query.offset)?;
    println!("{}", format_transfers(&transfers, format));
    Ok(())
}

pub fn cmd_history(
    transfer_repo: &TransferRepository,
    asset_index: u64,
    format: &OutputFormat,
) -> Result<()> {
    let transfers = transfer_repo.get_asset_history(asset_index)?;
    let owner = transfer_repo.get_current_owner(asset_index)?;
    println!(
        "{}",
        format_asset_history(asset_index, owner, &transfers, format)
    );
    Ok(())
}

pub fn cmd_address_history(
    transfer_repo: &TransferRepository,
    query: AddressHistoryQuery,
    format: &OutputFormat,
) -> Result<()> {
    let address = parse_address("account", &query.address)?;
    let transfers = transfer_repo.get_address_history(&address, query.limit, query.offset)?;
    println!("{}", format_transfers(&transfers, format));
    Ok(())
}

pub fn cmd_stats(repo: &TransferRepository, format: &OutputFormat) -> Result<()> {
    let stats = repo.get_statistics()?;
    println!("{}", format_stats(&stats, format));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_requires_at_least_one_condition() {
        assert!(build_filter(&TransferQuery::default()).is_err());
    }

    #[test]
    fn test_single_block_overrides_range() {
        let query = TransferQuery {
            block: Some(10),
            block_range: Some((1, 5)),
            ..Default::default()
        };
        assert_eq!(build_filter(&query).unwrap().block_range, Some((10, 10)));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let query = TransferQuery {
            block_range: Some((5, 1)),
            ..Default::default()
        };
        assert!(build_filter(&query).is_err());
    }

    #[test]
    fn test_addresses_are_parsed() {
        let query = TransferQuery {
            from: Some(format!("0x{}", "AB".repeat(20))),
            ..Default::default()
        };
        assert_eq!(
            build_filter(&query).unwrap().from_address,
            Some(Address::repeat_byte(0xab))
        );

        let query = TransferQuery {
            to: Some("0x1234".to_string()),
            ..Default::default()
        };
        assert!(build_filter(&query).is_err());
    }
}
