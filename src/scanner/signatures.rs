//! Paged listing of a program's transaction signatures.

use crate::scanner::chain::ChainClient;
use crate::scanner::error::ScanError;
use crate::types::TransactionSignature;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// One page of history, newest first, failed transactions removed.
#[derive(Debug, Clone, Default)]
pub struct SignaturePage {
    pub signatures: Vec<TransactionSignature>,
    /// Pass back to continue past this page. `None` once history is exhausted.
    pub next_cursor: Option<String>,
}

pub struct SignatureScanner<C: ChainClient> {
    client: Arc<C>,
    page_limit: usize,
}

impl<C: ChainClient> SignatureScanner<C> {
    pub fn new(client: Arc<C>, page_limit: usize) -> Self {
        Self {
            client,
            page_limit: page_limit.max(1),
        }
    }

    /// Fetch the page that starts right before `cursor` (or at the newest signature).
    #[instrument(skip(self, cancel), fields(program = %program_id))]
    pub async fn list(
        &self,
        program_id: &Pubkey,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SignaturePage, ScanError> {
        let before = cursor
            .map(|c| {
                Signature::from_str(c)
                    .map_err(|e| ScanError::Configuration(format!("invalid cursor {}: {}", c, e)))
            })
            .transpose()?;

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let raw = self
            .client
            .signatures_for_address(program_id, before, self.page_limit)
            .await?;

        let next_cursor = if raw.len() >= self.page_limit {
            raw.last().map(|s| s.signature.clone())
        } else {
            None
        };

        let total = raw.len();
        let signatures: Vec<TransactionSignature> = raw.into_iter().filter(|s| !s.failed).collect();
        debug!("Signature page: {} total, {} successful", total, signatures.len());

        Ok(SignaturePage { signatures, next_cursor })
    }

    /// Follow pages until history runs out or `max` successful signatures are collected.
    ///
    /// Returns the collected signatures and the cursor to resume from.
    #[instrument(skip(self, cancel), fields(program = %program_id))]
    pub async fn list_all(
        &self,
        program_id: &Pubkey,
        cursor: Option<&str>,
        max: usize,
        cancel: &CancellationToken,
    ) -> Result<(Vec<TransactionSignature>, Option<String>), ScanError> {
        let mut collected = Vec::new();
        let mut cursor = cursor.map(str::to_string);
        if max == 0 {
            return Ok((collected, cursor));
        }

        loop {
            let page = self.list(program_id, cursor.as_deref(), cancel).await?;
            collected.extend(page.signatures);
            cursor = page.next_cursor;

            if collected.len() >= max {
                let dropped = collected.len() > max;
                collected.truncate(max);
                // Resume right after the last signature handed out, unless
                // that signature was the oldest one there is.
                if dropped || cursor.is_some() {
                    cursor = collected.last().map(|s| s.signature.clone());
                }
                break;
            }
            if cursor.is_none() {
                break;
            }
        }

        info!("Tracked {} signatures", collected.len());
        Ok((collected, cursor))
    }
}
