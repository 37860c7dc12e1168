use crate::events::EventKind;
use crate::models::TransferRecord;
use alloy_primitives::Address;
use anyhow::Result;
use rusqlite::{Row, ToSql, params, params_from_iter};
use std::str::FromStr;

/// Optional filters for [`TransferRepository::query_transfers`]; all set filters must hold.
#[derive(Debug, Default, Clone)]
pub struct TransferFilter {
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
    pub asset_index: Option<u64>,
    pub block_range: Option<(u64, u64)>,
    pub mints_only: bool,
}

impl TransferFilter {
    pub fn is_empty(&self) -> bool {
        self.from_address.is_none()
            && self.to_address.is_none()
            && self.asset_index.is_none()
            && self.block_range.is_none()
            && !self.mints_only
    }
}

pub struct TransferRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TransferRepository<'a> {
    const INSERT_TRANSFER: &'static str = "INSERT OR IGNORE INTO transfers (
            transaction_hash, log_index, transaction_index, block_number,
            kind, asset_index, from_address, to_address
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

    const SELECT_TRANSFER: &'static str = "SELECT transaction_hash, log_index, transaction_index, block_number, kind, asset_index, from_address, to_address FROM transfers";

    const CHAIN_ORDER: &'static str = " ORDER BY block_number, transaction_index, log_index";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Returns whether a new row was written; replays of a stored log are ignored.
    pub fn insert(&self, transfer: &TransferRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            Self::INSERT_TRANSFER,
            params_from_iter(Self::insert_params(transfer)?),
        )?;
        Ok(inserted > 0)
    }

    pub fn query_transfers(
        &self,
        filter: &TransferFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransferRecord>> {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(from) = &filter.from_address {
            conditions.push("from_address = ?");
            params.push(Box::new(format!("{from:?}")));
        }

        if let Some(to) = &filter.to_address {
            conditions.push("to_address = ?");
            params.push(Box::new(format!("{to:?}")));
        }

        if let Some(asset_index) = filter.asset_index {
            conditions.push("asset_index = ?");
            params.push(Box::new(to_sql_int(asset_index)?));
        }

        if let Some((start, end)) = filter.block_range {
            conditions.push("block_number >= ?");
            params.push(Box::new(to_sql_int(start)?));
            conditions.push("block_number <= ?");
            params.push(Box::new(to_sql_int(end)?));
        }

        if filter.mints_only {
            conditions.push("kind = ?");
            params.push(Box::new(EventKind::Assign.as_str()));
        }

        self.execute_paginated_query(conditions, params, limit, offset)
    }

    /// Ownership chain of a single asset, oldest first.
    pub fn get_asset_history(&self, asset_index: u64) -> Result<Vec<TransferRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE asset_index = ?1{}",
            Self::SELECT_TRANSFER,
            Self::CHAIN_ORDER
        ))?;
        let transfers = stmt
            .query_map(params![to_sql_int(asset_index)?], Self::row_to_transfer)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transfers)
    }

    pub fn get_address_history(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransferRecord>> {
        let address_str = format!("{address:?}");
        let conditions = vec!["(from_address = ? OR to_address = ?)"];
        let params: Vec<Box<dyn ToSql>> =
            vec![Box::new(address_str.clone()), Box::new(address_str)];

        self.execute_paginated_query(conditions, params, limit, offset)
    }

    /// Current holder of an asset, taken from its most recent stored transfer.
    pub fn get_current_owner(&self, asset_index: u64) -> Result<Option<Address>> {
        let history = self.get_asset_history(asset_index)?;
        Ok(history.last().map(|transfer| transfer.to_address))
    }

    pub fn get_statistics(&self) -> Result<TransferStats> {
        let (total_transfers, mints, unique_assets) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(kind = ?1), 0), COUNT(DISTINCT asset_index) FROM transfers",
            params![EventKind::Assign.as_str()],
            |row| Ok((get_count(row, 0)?, get_count(row, 1)?, get_count(row, 2)?)),
        )?;

        let unique_owners = self.conn.query_row(
            "SELECT COUNT(DISTINCT address) FROM (
                SELECT from_address as address FROM transfers WHERE kind != ?1
                UNION
                SELECT to_address as address FROM transfers
            )",
            params![EventKind::Assign.as_str()],
            |row| get_count(row, 0),
        )?;

        let (earliest_block, latest_block) = self.conn.query_row(
            "SELECT MIN(block_number), MAX(block_number) FROM transfers",
            [],
            |row| Ok((get_optional_u64(row, 0)?, get_optional_u64(row, 1)?)),
        )?;

        Ok(TransferStats {
            total_transfers,
            mints,
            unique_assets,
            unique_owners,
            earliest_block,
            latest_block,
        })
    }

    fn insert_params(transfer: &TransferRecord) -> Result<Vec<Box<dyn ToSql>>> {
        Ok(vec![
            Box::new(transfer.transaction_hash.clone()),
            Box::new(to_sql_int(transfer.log_index)?),
            Box::new(to_sql_int(transfer.transaction_index)?),
            Box::new(to_sql_int(transfer.block_number)?),
            Box::new(transfer.kind.as_str()),
            Box::new(to_sql_int(transfer.asset_index)?),
            Box::new(format!("{:?}", transfer.from_address)),
            Box::new(format!("{:?}", transfer.to_address)),
        ])
    }

    fn execute_paginated_query(
        &self,
        conditions: Vec<&str>,
        params: Vec<Box<dyn ToSql>>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransferRecord>> {
        let mut query = Self::SELECT_TRANSFER.to_string();

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(Self::CHAIN_ORDER);
        query.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

        let mut stmt = self.conn.prepare(&query)?;
        let transfers = stmt
            .query_map(params_from_iter(params), Self::row_to_transfer)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transfers)
    }

    fn row_to_transfer(row: &Row) -> rusqlite::Result<TransferRecord> {
        let kind = EventKind::from_str(&row.get::<_, String>(4)?).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;

        let from_address = Address::from_str(&row.get::<_, String>(6)?).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let to_address = Address::from_str(&row.get::<_, String>(7)?).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(TransferRecord {
            kind,
            asset_index: get_u64(row, 5)?,
            from_address,
            to_address,
            block_number: get_u64(row, 3)?,
            transaction_index: get_u64(row, 2)?,
            log_index: get_u64(row, 1)?,
            transaction_hash: row.get(0)?,
        })
    }
}

// SQLite integers are signed 64-bit; coordinates and indexes are stored as i64.
fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| anyhow::anyhow!("Value {} exceeds the SQLite integer range", value))
}

fn get_u64(row: &Row, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn get_optional_u64(row: &Row, idx: usize) -> rusqlite::Result<Option<u64>> {
    let value: Option<i64> = row.get(idx)?;
    value
        .map(|v| u64::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v)))
        .transpose()
}

fn get_count(row: &Row, idx: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(idx)?;
    usize::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStats {
    pub total_transfers: usize,
    pub mints: usize,
    pub unique_assets: usize,
    pub unique_owners: usize,
    pub earliest_block: Option<u64>,
    pub latest_block: Option<u64>,
}
