use crate::events::EventKind;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// One raw log entry as published by the upstream log emitter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogRecord {
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
    pub transaction_hash: String,
    pub address: Option<String>,
    pub topic0: Option<String>,
    pub topic1: Option<String>,
    pub topic2: Option<String>,
    pub topic3: Option<String>,
    pub data: Option<String>,
    pub chain_id: u64,
    pub block_hash: String,
}

impl LogRecord {
    pub fn from_json(message: &str) -> serde_json::Result<Self> {
        serde_json::from_str(message)
    }
}

/// A decoded ownership change. Mints carry the configured zero address as `from_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub kind: EventKind,
    pub asset_index: u64,
    pub from_address: Address,
    pub to_address: Address,
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
    pub transaction_hash: String,
}

impl TransferRecord {
    pub fn is_mint(&self) -> bool {
        self.kind == EventKind::Assign
    }
}
