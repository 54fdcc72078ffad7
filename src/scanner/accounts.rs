//! Program account scans filtered by exact data size.

use crate::scanner::chain::ChainClient;
use crate::scanner::error::ScanError;
use crate::types::RawAccount;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Lists program-owned accounts of one exact size.
///
/// A single query per call and no retries; callers own the retry policy.
/// Result order is whatever the node returned.
pub struct AccountScanner<C: ChainClient> {
    client: Arc<C>,
}

impl<C: ChainClient> Clone for AccountScanner<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone() }
    }
}

impl<C: ChainClient> AccountScanner<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    #[instrument(skip(self, cancel), fields(program = %program_id))]
    pub async fn scan_by_size(
        &self,
        program_id: &Pubkey,
        exact_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<(Pubkey, RawAccount)>, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut accounts = self.client.accounts_by_size(program_id, exact_size).await?;
        accounts.retain(|(_, account)| account.size() as u64 == exact_size);
        info!("Found {} accounts of {} bytes", accounts.len(), exact_size);
        Ok(accounts)
    }
}
