use crate::config::IndexerConfig;
use crate::events::EventKind;
use crate::matcher::EventMatcher;
use crate::models::{LogRecord, TransferRecord};
use alloy_primitives::Address;
use std::str::FromStr;
use thiserror::Error;

/// Hex characters in a 32-byte ABI word.
const TOPIC_HEX_LEN: usize = 64;
/// Hex characters in a 20-byte address.
const ADDRESS_HEX_LEN: usize = 40;
/// A u64 never needs more than 16 significant hex digits.
const U64_HEX_DIGITS: usize = 16;

/// Why a log that passed the matcher could not be turned into a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("topic0 is missing or not a recognised event signature")]
    UnknownSignature,

    #[error("{field} is missing")]
    MissingTopic { field: &'static str },

    #[error("{field} is malformed: {reason}")]
    MalformedTopic { field: &'static str, reason: String },

    #[error("data is missing")]
    MissingData,

    #[error("data is not valid hex: {value:?}")]
    MalformedHex { value: String },

    #[error("data value {value} does not fit in a 64-bit asset index")]
    OutOfRange { value: String },
}

/// Turns matched logs into [`TransferRecord`]s.
#[derive(Debug, Clone)]
pub struct TransferDecoder {
    matcher: EventMatcher,
    zero_address: Address,
}

impl TransferDecoder {
    pub fn new(config: &IndexerConfig) -> Self {
        TransferDecoder {
            matcher: EventMatcher::new(config),
            zero_address: config.zero_address,
        }
    }

    pub fn decode(&self, log: &LogRecord) -> Result<TransferRecord, DecodeError> {
        let kind = log
            .topic0
            .as_deref()
            .and_then(|topic0| self.matcher.signature_kind(topic0))
            .ok_or(DecodeError::UnknownSignature)?;

        let (from_address, to_address) = match kind {
            EventKind::Assign => (
                self.zero_address,
                topic_address("topic1", log.topic1.as_deref())?,
            ),
            EventKind::Transfer => (
                topic_address("topic1", log.topic1.as_deref())?,
                topic_address("topic2", log.topic2.as_deref())?,
            ),
        };

        let data = log.data.as_deref().ok_or(DecodeError::MissingData)?;
        let asset_index = parse_asset_index(data)?;

        Ok(TransferRecord {
            kind,
            asset_index,
            from_address,
            to_address,
            block_number: log.block_number,
            transaction_index: log.transaction_index,
            log_index: log.log_index,
            transaction_hash: log.transaction_hash.clone(),
        })
    }
}

/// Extracts the address held in the low-order 20 bytes of a 32-byte topic word.
fn topic_address(field: &'static str, topic: Option<&str>) -> Result<Address, DecodeError> {
    let topic = topic.ok_or(DecodeError::MissingTopic { field })?;

    let malformed = |reason: String| DecodeError::MalformedTopic { field, reason };

    let hex = topic
        .strip_prefix("0x")
        .ok_or_else(|| malformed("missing 0x prefix".to_string()))?;
    if hex.len() != TOPIC_HEX_LEN {
        return Err(malformed(format!(
            "expected {} hex characters, got {}",
            TOPIC_HEX_LEN,
            hex.len()
        )));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed("contains non-hex characters".to_string()));
    }

    let low_order = &hex[TOPIC_HEX_LEN - ADDRESS_HEX_LEN..];
    Address::from_str(low_order).map_err(|e| malformed(e.to_string()))
}

fn parse_asset_index(data: &str) -> Result<u64, DecodeError> {
    let malformed = || DecodeError::MalformedHex {
        value: data.to_string(),
    };

    let hex = data.strip_prefix("0x").ok_or_else(malformed)?;
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let significant = hex.trim_start_matches('0');
    if significant.len() > U64_HEX_DIGITS {
        return Err(DecodeError::OutOfRange {
            value: data.to_string(),
        });
    }
    if significant.is_empty() {
        return Ok(0);
    }

    u64::from_str_radix(significant, 16).map_err(|_| DecodeError::OutOfRange {
        value: data.to_string(),
    })
}
