//! Best-effort migration of every player pool.
//!
//! Each account gets its own transaction. A failure is recorded against that
//! account and the batch moves on; re-running the batch is safe because an
//! already migrated pool is a no-op or a clean rejection.

use crate::scanner::accounts::AccountScanner;
use crate::scanner::chain::ChainClient;
use crate::scanner::error::ScanError;
use crate::scanner::instruction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Per-account result: the transaction signature or why it failed.
pub type MigrationOutcome = (Pubkey, Result<String, ScanError>);

pub struct BatchMaintenance<C: ChainClient> {
    client: Arc<C>,
    scanner: AccountScanner<C>,
}

impl<C: ChainClient> BatchMaintenance<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            scanner: AccountScanner::new(client.clone()),
            client,
        }
    }

    /// Submit `resize_user_pool` for every account of `exact_size` bytes.
    ///
    /// Only the initial scan can fail the whole call. Accounts not reached
    /// before cancellation are reported as [`ScanError::Cancelled`].
    #[instrument(skip(self, cancel), fields(program = %program_id))]
    pub async fn migrate_all(
        &self,
        program_id: &Pubkey,
        exact_size: u64,
        authority: &Pubkey,
        cancel: &CancellationToken,
    ) -> Result<Vec<MigrationOutcome>, ScanError> {
        let accounts = self.scanner.scan_by_size(program_id, exact_size, cancel).await?;
        let mut outcomes = Vec::with_capacity(accounts.len());

        for (pool, _) in accounts {
            if cancel.is_cancelled() {
                outcomes.push((pool, Err(ScanError::Cancelled)));
                continue;
            }

            let ix = instruction::resize_user_pool(program_id, authority, &pool);
            let result = self.client.submit(&[ix]).await;
            match &result {
                Ok(signature) => info!("Resized {} (tx {})", pool, signature),
                Err(e) => warn!("Failed to resize {}: {}", pool, e),
            }
            outcomes.push((pool, result));
        }

        let migrated = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Migrated {}/{} player pools", migrated, outcomes.len());
        Ok(outcomes)
    }

    /// Submit `resize_global_pool` for `global_pool`.
    #[instrument(skip(self, cancel), fields(program = %program_id, pool = %global_pool))]
    pub async fn migrate_global(
        &self,
        program_id: &Pubkey,
        authority: &Pubkey,
        global_pool: &Pubkey,
        cancel: &CancellationToken,
    ) -> Result<String, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let ix = instruction::resize_global_pool(program_id, authority, global_pool);
        let signature = self.client.submit(&[ix]).await?;
        info!("Resized global pool (tx {})", signature);
        Ok(signature)
    }
}
