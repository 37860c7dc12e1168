use alloy::sol;

sol! {
    event PunkTransfer(address indexed from, address indexed to, uint256 punkIndex);
    event Assign(address indexed to, uint256 punkIndex);
}

/// Which of the two recognised event shapes a log carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Single-party mint: the contract assigned an asset to `to`.
    Assign,
    /// Two-party ownership change.
    Transfer,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Assign => "assign",
            EventKind::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assign" => Ok(EventKind::Assign),
            "transfer" => Ok(EventKind::Transfer),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolEvent;
    use alloy_primitives::b256;

    #[test]
    fn test_signature_hashes_match_deployed_contract() {
        assert_eq!(
            PunkTransfer::SIGNATURE_HASH,
            b256!("05af636b70da6819000c49f85b21fa82081c632069bb626f30932034099107d8")
        );
        assert_eq!(
            Assign::SIGNATURE_HASH,
            b256!("8a0e37b73a0d9c82e205d4d1a3ff3d0b57ce5f4d7bccf6bac03336dc101cb7ba")
        );
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::Assign.to_string(), "assign");
        assert_eq!(EventKind::Transfer.to_string(), "transfer");
    }
}
