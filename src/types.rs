//! Core value types shared by the scanning pipeline.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A raw program-owned account as returned by an account query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    /// Program that owns the account
    pub owner: Pubkey,
    /// Balance in lamports at query time
    pub lamports: u64,
    /// Account data exactly as stored on-chain
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn new(owner: Pubkey, lamports: u64, data: Vec<u8>) -> Self {
        Self { owner, lamports, data }
    }

    /// Total size of the account data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One game played against the program, reconstructed from a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Game kind packed into the instruction data
    pub kind: u64,
    /// Address that initiated the play
    #[serde(with = "pubkey_string")]
    pub actor: Pubkey,
    /// Wager in lamports
    pub wager_amount: u64,
    /// Slot the transaction landed in
    pub block_reference: u64,
    /// Parity heuristic: `kind % 2 == block_reference % 2`.
    ///
    /// This is derived from the slot, not read from settled program state.
    pub outcome: bool,
    /// Transaction signature (base58)
    pub signature: String,
}

/// Unsettled balance recorded in a player pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableEntry {
    #[serde(with = "pubkey_string")]
    pub owner: Pubkey,
    pub amount: u64,
}

/// A signature returned by the history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub signature: String,
    pub slot: u64,
    /// Whether the node reported the transaction as failed
    pub failed: bool,
}

/// Network-neutral view of a fetched transaction.
#[derive(Debug, Clone, Default)]
pub struct ParsedTransaction {
    /// Slot the transaction was confirmed in, if reported
    pub slot: Option<u64>,
    /// Execution error reported in the transaction meta
    pub error: Option<String>,
    /// Top-level instructions in program order
    pub instructions: Vec<ParsedInstruction>,
    /// Flattened inner instructions; `None` when the node reported no list at all
    pub inner_instructions: Option<Vec<ParsedInstruction>>,
}

/// One instruction of a [`ParsedTransaction`].
#[derive(Debug, Clone, Default)]
pub struct ParsedInstruction {
    pub program_id: String,
    pub accounts: Vec<String>,
    /// Base58 instruction data, absent when the node returned the instruction fully parsed
    pub data: Option<String>,
}

pub(crate) mod pubkey_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_record_serializes_actor_as_base58() {
        let actor = Pubkey::new_unique();
        let record = ActivityRecord {
            kind: 4,
            actor,
            wager_amount: 100_000_000,
            block_reference: 10,
            outcome: true,
            signature: "sig".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["actor"], actor.to_string());

        let back: ActivityRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_raw_account_size() {
        let account = RawAccount::new(Pubkey::new_unique(), 1, vec![0u8; 168]);
        assert_eq!(account.size(), 168);
    }
}
