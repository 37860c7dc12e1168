use crate::events::{Assign, PunkTransfer};
use crate::pipeline::FailurePolicy;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, address};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const PUNKS_CONTRACT_ADDRESS: Address = address!("b47e3cd837ddf8e4c57f05d70ab865de6e193bbb");
pub const PUNKS_DEPLOYMENT_BLOCK: u64 = 3_914_495;

/// What the matcher and decoder need to recognise the target contract's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub contract_address: Address,
    pub deployment_block: u64,
    pub transfer_signature: B256,
    pub assign_signature: B256,
    pub zero_address: Address,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            contract_address: PUNKS_CONTRACT_ADDRESS,
            deployment_block: PUNKS_DEPLOYMENT_BLOCK,
            transfer_signature: PunkTransfer::SIGNATURE_HASH,
            assign_signature: Assign::SIGNATURE_HASH,
            zero_address: Address::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Log,
    Sqlite,
}

impl FromStr for SinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "log" => Ok(SinkKind::Log),
            "sqlite" => Ok(SinkKind::Sqlite),
            other => Err(anyhow::anyhow!("Unknown sink '{}', expected 'log' or 'sqlite'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub indexer: IndexerConfig,
    pub input_path: Option<PathBuf>,
    pub sink: SinkKind,
    pub database_url: String,
    pub failure_policy: FailurePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = IndexerConfig::default();

        let contract_address = match lookup("CONTRACT_ADDRESS") {
            Some(value) => Address::from_str(&value).context("Invalid CONTRACT_ADDRESS format")?,
            None => defaults.contract_address,
        };

        let deployment_block = match lookup("DEPLOYMENT_BLOCK") {
            Some(value) => value
                .parse::<u64>()
                .context("DEPLOYMENT_BLOCK must be a non-negative integer")?,
            None => defaults.deployment_block,
        };

        let transfer_signature = match lookup("TRANSFER_SIGNATURE") {
            Some(value) => B256::from_str(&value).context("Invalid TRANSFER_SIGNATURE format")?,
            None => defaults.transfer_signature,
        };

        let assign_signature = match lookup("ASSIGN_SIGNATURE") {
            Some(value) => B256::from_str(&value).context("Invalid ASSIGN_SIGNATURE format")?,
            None => defaults.assign_signature,
        };

        if transfer_signature == assign_signature {
            anyhow::bail!("TRANSFER_SIGNATURE and ASSIGN_SIGNATURE must differ");
        }

        let zero_address = match lookup("ZERO_ADDRESS") {
            Some(value) => Address::from_str(&value).context("Invalid ZERO_ADDRESS format")?,
            None => defaults.zero_address,
        };

        let input_path = lookup("INPUT_PATH").map(PathBuf::from);

        let sink = lookup("SINK")
            .map(|value| SinkKind::from_str(&value))
            .transpose()
            .context("Invalid SINK")?
            .unwrap_or(SinkKind::Log);

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:./indexer.db".to_string());

        let failure_policy = lookup("FAILURE_POLICY")
            .map(|value| FailurePolicy::from_str(&value))
            .transpose()
            .context("Invalid FAILURE_POLICY")?
            .unwrap_or_default();

        Ok(Config {
            indexer: IndexerConfig {
                contract_address,
                deployment_block,
                transfer_signature,
                assign_signature,
                zero_address,
            },
            input_path,
            sink,
            database_url,
            failure_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_target_cryptopunks() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.indexer, IndexerConfig::default());
        assert_eq!(config.indexer.deployment_block, 3914495);
        assert_eq!(config.sink, SinkKind::Log);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.database_url, "sqlite:./indexer.db");
        assert!(config.input_path.is_none());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("CONTRACT_ADDRESS", "0x1111111111111111111111111111111111111111"),
            ("DEPLOYMENT_BLOCK", "42"),
            ("SINK", "sqlite"),
            ("FAILURE_POLICY", "halt"),
            ("INPUT_PATH", "/tmp/logs.jsonl"),
        ]))
        .unwrap();

        assert_eq!(config.indexer.contract_address, Address::repeat_byte(0x11));
        assert_eq!(config.indexer.deployment_block, 42);
        assert_eq!(config.sink, SinkKind::Sqlite);
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.input_path, Some(PathBuf::from("/tmp/logs.jsonl")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("CONTRACT_ADDRESS", "0x12")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DEPLOYMENT_BLOCK", "-5")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SINK", "kafka")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("FAILURE_POLICY", "retry")])).is_err());
    }

    #[test]
    fn test_identical_signatures_are_rejected() {
        let sig = "0x8a0e37b73a0d9c82e205d4d1a3ff3d0b57ce5f4d7bccf6bac03336dc101cb7ba";
        let result = Config::from_lookup(lookup_from(&[
            ("TRANSFER_SIGNATURE", sig),
            ("ASSIGN_SIGNATURE", sig),
        ]));
        assert!(result.is_err());
    }
}
