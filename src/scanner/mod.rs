//! Scanner module - activity and balance reconstruction for the dice program.
//!
//! Components are generic over [`ChainClient`] so every operation can be
//! driven by the RPC client in production and by an in-memory client in tests.

pub mod types;
pub mod error;
pub mod pda;
pub mod layout;
pub mod chain;
pub mod accounts;
pub mod claimable;
pub mod signatures;
pub mod activity;
pub mod history;
pub mod instruction;
pub mod maintenance;

// Re-export main public types
pub use types::{Marker, ProgramContext, ScannerConfig};
pub use error::{ScanError, SkipReason};
pub use chain::{ChainClient, RpcChainClient};

// Re-export key components
pub use accounts::AccountScanner;
pub use claimable::{ClaimableAggregator, PlayerPoolState};
pub use signatures::{SignaturePage, SignatureScanner};
pub use activity::ActivityDecoder;
pub use history::{ActivityHistory, DecodeFailure, HistoryOptions, HistoryScan};
pub use maintenance::{BatchMaintenance, MigrationOutcome};

use crate::types::{ActivityRecord, ClaimableEntry};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// All pipeline components wired to one client and one program.
pub struct Scanner<C: ChainClient + 'static> {
    config: ScannerConfig,
    context: ProgramContext,
    decoder: Arc<ActivityDecoder<C>>,
    claimable: ClaimableAggregator<C>,
    history: ActivityHistory<C>,
    maintenance: BatchMaintenance<C>,
}

impl<C: ChainClient + 'static> Scanner<C> {
    pub fn new(config: ScannerConfig, client: Arc<C>) -> Result<Self, ScanError> {
        let context = config.program_context()?;
        let decoder = Arc::new(ActivityDecoder::new(client.clone(), context));
        let history = ActivityHistory::new(
            decoder.clone(),
            SignatureScanner::new(client.clone(), config.signature_page_limit),
            HistoryOptions {
                max_signatures: config.max_signatures,
                max_parallel_decodes: config.max_parallel_decodes,
                retry_attempts: config.rpc_retry_attempts,
                cache_ttl: Duration::from_secs(config.cache_ttl_seconds),
                max_cache_entries: config.max_cache_entries as u64,
            },
        );

        info!("Created scanner for program {}", context.program_id);

        Ok(Self {
            claimable: ClaimableAggregator::new(client.clone()),
            maintenance: BatchMaintenance::new(client),
            config,
            context,
            decoder,
            history,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn context(&self) -> &ProgramContext {
        &self.context
    }

    /// Claimable balance of every player pool.
    pub async fn claimable(&self, cancel: &CancellationToken) -> Result<Vec<ClaimableEntry>, ScanError> {
        self.claimable
            .claimable_for_program(&self.context.program_id, self.config.player_pool_size, cancel)
            .await
    }

    /// Full state of one player's pool.
    pub async fn player_pool_state(
        &self,
        player: &Pubkey,
        cancel: &CancellationToken,
    ) -> Result<Option<PlayerPoolState>, ScanError> {
        self.claimable
            .player_pool_state(&self.context.program_id, player, cancel)
            .await
    }

    /// Decode a single transaction.
    pub async fn activity(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ActivityRecord>, ScanError> {
        self.decoder.decode(signature, cancel).await
    }

    /// Decode the program's history older than `cursor`.
    pub async fn history(
        &self,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<HistoryScan, ScanError> {
        self.history.scan(cursor, cancel).await
    }

    /// Migrate every player pool using the configured authority.
    pub async fn migrate_all(&self, cancel: &CancellationToken) -> Result<Vec<MigrationOutcome>, ScanError> {
        let authority = self.config.migration_authority()?;
        self.maintenance
            .migrate_all(&self.context.program_id, self.config.player_pool_size, &authority, cancel)
            .await
    }

    /// Migrate the configured global pool using the configured authority.
    pub async fn migrate_global(&self, cancel: &CancellationToken) -> Result<String, ScanError> {
        let authority = self.config.migration_authority()?;
        let global_pool = self.config.global_pool()?;
        self.maintenance
            .migrate_global(&self.context.program_id, &authority, &global_pool, cancel)
            .await
    }
}

/// Scanner builder for convenient construction with sensible defaults.
pub struct ScannerBuilder {
    config: ScannerConfig,
}

impl ScannerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn with_rpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.rpc_endpoint = endpoint.into();
        self
    }

    pub fn with_program_id(mut self, program_id: &Pubkey) -> Self {
        self.config.program_id = program_id.to_string();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.marker = marker.into();
        self
    }

    pub fn with_migration_authority(mut self, authority: &Pubkey) -> Self {
        self.config.migration_authority = authority.to_string();
        self
    }

    pub fn with_global_pool(mut self, global_pool: &Pubkey) -> Self {
        self.config.global_pool = global_pool.to_string();
        self
    }

    /// Set the history page size and the cap on signatures per scan.
    pub fn with_signature_limits(mut self, page_limit: usize, max_signatures: usize) -> Self {
        self.config.signature_page_limit = page_limit;
        self.config.max_signatures = max_signatures;
        self
    }

    pub fn with_max_parallel_decodes(mut self, max: usize) -> Self {
        self.config.max_parallel_decodes = max;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.config.rpc_retry_attempts = attempts;
        self
    }

    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit_requests_per_second = requests_per_second;
        self
    }

    /// Set decode cache TTL in seconds.
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.cache_ttl_seconds = ttl_seconds;
        self
    }

    pub fn build_config(self) -> ScannerConfig {
        self.config
    }

    /// Build on top of any client.
    pub fn build<C: ChainClient + 'static>(self, client: Arc<C>) -> Result<Scanner<C>, ScanError> {
        Scanner::new(self.config, client)
    }

    /// Build on top of the RPC endpoint. `payer` is only needed for migrations.
    pub fn connect(self, payer: Option<Arc<Keypair>>) -> Result<Scanner<RpcChainClient>, ScanError> {
        let client = Arc::new(RpcChainClient::new(&self.config, payer));
        Scanner::new(self.config, client)
    }
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
