//! Configuration and context types for the scanner.

use crate::scanner::error::ScanError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

/// Deployed dice program on devnet.
pub const DEFAULT_PROGRAM_ID: &str = "B7zxxL7pyzsCojCzdpJx3CPLVC9n5MhDUZ2jxWMf5MRp";
/// Authority that pays for player-pool migrations.
pub const DEFAULT_MIGRATION_AUTHORITY: &str = "G2sc5mU3eLRkbRupnupzB3NTzZ85bnc9L1ReAre9dzFU";
/// Global pool account of the devnet deployment.
pub const DEFAULT_GLOBAL_POOL: &str = "WEzV6NZKnNuxGLjSUjfczyThec13jx4bEcFG7TqSPHP";
/// First 8 characters of the base58 data of every play instruction.
pub const DEFAULT_MARKER: &str = "4QUPibxi";
/// Size of a player-pool account including the 8-byte discriminator.
pub const PLAYER_POOL_SIZE: u64 = 168;

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// RPC endpoint URL
    pub rpc_endpoint: String,
    /// Program id (base58)
    pub program_id: String,
    /// Exact size of player-pool accounts
    pub player_pool_size: u64,
    /// Instruction marker (8 ASCII characters)
    pub marker: String,
    /// Authority used for player-pool migrations (base58)
    pub migration_authority: String,
    /// Global pool account resized by the global migration (base58)
    pub global_pool: String,
    /// Signatures requested per history page
    pub signature_page_limit: usize,
    /// Upper bound on successful signatures collected per history scan
    pub max_signatures: usize,
    /// Maximum concurrent transaction decodes
    pub max_parallel_decodes: usize,
    /// Retries after the first failed decode fetch (network errors only)
    pub rpc_retry_attempts: usize,
    /// RPC timeout in seconds
    pub rpc_timeout_seconds: u64,
    /// Rate limit requests per second
    pub rate_limit_requests_per_second: u32,
    /// Decode cache TTL in seconds
    pub cache_ttl_seconds: u64,
    /// Maximum decode cache entries
    pub max_cache_entries: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.devnet.solana.com".to_string(),
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            player_pool_size: PLAYER_POOL_SIZE,
            marker: DEFAULT_MARKER.to_string(),
            migration_authority: DEFAULT_MIGRATION_AUTHORITY.to_string(),
            global_pool: DEFAULT_GLOBAL_POOL.to_string(),
            signature_page_limit: 1000,
            max_signatures: 1000,
            max_parallel_decodes: 8,
            rpc_retry_attempts: 3,
            rpc_timeout_seconds: 30,
            rate_limit_requests_per_second: 20,
            cache_ttl_seconds: 600,
            max_cache_entries: 10_000,
        }
    }
}

impl ScannerConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ScannerConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Parsed program id.
    pub fn program_id(&self) -> Result<Pubkey, ScanError> {
        parse_pubkey("program_id", &self.program_id)
    }

    /// Parsed migration authority.
    pub fn migration_authority(&self) -> Result<Pubkey, ScanError> {
        parse_pubkey("migration_authority", &self.migration_authority)
    }

    /// Parsed global pool address.
    pub fn global_pool(&self) -> Result<Pubkey, ScanError> {
        parse_pubkey("global_pool", &self.global_pool)
    }

    /// Explicit context handed to every component.
    pub fn program_context(&self) -> Result<ProgramContext, ScanError> {
        Ok(ProgramContext {
            program_id: self.program_id()?,
            marker: Marker::from_str(&self.marker)?,
        })
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ScanError> {
    Pubkey::from_str(value)
        .map_err(|e| ScanError::Configuration(format!("invalid {}: {} ({})", field, value, e)))
}

/// Fixed 8-byte prefix identifying this program's play instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker([u8; 8]);

impl Marker {
    pub const LEN: usize = 8;

    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Whether encoded instruction data starts with this marker.
    pub fn matches(&self, encoded: &[u8]) -> bool {
        encoded.get(..Self::LEN) == Some(&self.0[..])
    }
}

impl FromStr for Marker {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 8] = s.as_bytes().try_into().map_err(|_| {
            ScanError::Configuration(format!("marker must be exactly 8 bytes, got {:?}", s))
        })?;
        Ok(Self(bytes))
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self(*b"4QUPibxi")
    }
}

/// Program id plus the marker its play instructions carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramContext {
    pub program_id: Pubkey,
    pub marker: Marker,
}

impl ProgramContext {
    pub fn new(program_id: Pubkey, marker: Marker) -> Self {
        Self { program_id, marker }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_marker_matches_constant() {
        assert_eq!(Marker::from_str(DEFAULT_MARKER).unwrap(), Marker::default());
    }

    #[test]
    fn test_marker_rejects_wrong_length() {
        assert!(matches!(Marker::from_str("4QUP"), Err(ScanError::Configuration(_))));
        assert!(matches!(Marker::from_str("4QUPibxi9"), Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_marker_matches_prefix_only() {
        let marker = Marker::default();
        assert!(marker.matches(b"4QUPibxiAAAAAAA"));
        assert!(marker.matches(b"4QUPibxi"));
        assert!(!marker.matches(b"4QUPibx"));
        assert!(!marker.matches(b"xQUPibxiAAAA"));
    }

    #[test]
    fn test_default_config_context() {
        let ctx = ScannerConfig::default().program_context().unwrap();
        assert_eq!(ctx.program_id.to_string(), DEFAULT_PROGRAM_ID);
        assert_eq!(ctx.marker, Marker::default());
    }

    #[test]
    fn test_invalid_program_id_is_configuration_error() {
        let config = ScannerConfig {
            program_id: "not-a-key".to_string(),
            ..ScannerConfig::default()
        };
        assert!(matches!(config.program_id(), Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_load_partial_config() {
        let path = std::env::temp_dir().join(format!("dice-scanner-config-{}.json", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            write!(file, r#"{{"rpc_endpoint": "http://localhost:8899", "max_parallel_decodes": 2}}"#).unwrap();
        }

        let config = ScannerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.rpc_endpoint, "http://localhost:8899");
        assert_eq!(config.max_parallel_decodes, 2);
        assert_eq!(config.player_pool_size, PLAYER_POOL_SIZE);
        assert_eq!(config.marker, DEFAULT_MARKER);
    }
}
