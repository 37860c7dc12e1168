use crate::config::IndexerConfig;
use crate::events::EventKind;
use crate::models::LogRecord;
use alloy_primitives::{Address, B256};
use std::str::FromStr;

/// Admission gate in front of the decoder.
///
/// Addresses and signatures are compared as parsed bytes, so hex casing in
/// the input does not matter. Anything absent or unparsable is simply not a
/// match.
#[derive(Debug, Clone)]
pub struct EventMatcher {
    contract_address: Address,
    deployment_block: u64,
    transfer_signature: B256,
    assign_signature: B256,
}

impl EventMatcher {
    pub fn new(config: &IndexerConfig) -> Self {
        EventMatcher {
            contract_address: config.contract_address,
            deployment_block: config.deployment_block,
            transfer_signature: config.transfer_signature,
            assign_signature: config.assign_signature,
        }
    }

    pub fn matches(&self, log: &LogRecord) -> bool {
        self.classify(log).is_some()
    }

    /// Like [`matches`](Self::matches), but reports which event shape was recognised.
    pub fn classify(&self, log: &LogRecord) -> Option<EventKind> {
        if log.block_number <= self.deployment_block {
            return None;
        }

        let address = Address::from_str(log.address.as_deref()?).ok()?;
        if address != self.contract_address {
            return None;
        }

        self.signature_kind(log.topic0.as_deref()?)
    }

    pub(crate) fn signature_kind(&self, topic0: &str) -> Option<EventKind> {
        let signature = B256::from_str(topic0).ok()?;
        if signature == self.transfer_signature {
            Some(EventKind::Transfer)
        } else if signature == self.assign_signature {
            Some(EventKind::Assign)
        } else {
            None
        }
    }
}
