//! History scan: signatures in, activity records out.
//!
//! Signatures are decoded on a bounded worker pool. Each decode is retried on
//! network errors, and settled results are cached by signature since a
//! confirmed transaction never changes.

use crate::scanner::activity::ActivityDecoder;
use crate::scanner::chain::ChainClient;
use crate::scanner::error::ScanError;
use crate::scanner::signatures::SignatureScanner;
use crate::types::ActivityRecord;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// A signature whose decode kept failing after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub signature: String,
    pub error: ScanError,
}

/// Result of one history pass.
#[derive(Debug, Clone, Default)]
pub struct HistoryScan {
    /// Decoded plays, newest first
    pub records: Vec<ActivityRecord>,
    pub failures: Vec<DecodeFailure>,
    /// Number of successful signatures examined
    pub scanned: usize,
    /// Cursor to continue with older history
    pub next_cursor: Option<String>,
}

/// Tuning for [`ActivityHistory`].
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub max_signatures: usize,
    pub max_parallel_decodes: usize,
    /// Retries after the first failed fetch, so `retry_attempts + 1` fetches at most
    pub retry_attempts: usize,
    pub cache_ttl: Duration,
    pub max_cache_entries: u64,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_signatures: 1000,
            max_parallel_decodes: 8,
            retry_attempts: 3,
            cache_ttl: Duration::from_secs(600),
            max_cache_entries: 10_000,
        }
    }
}

pub struct ActivityHistory<C: ChainClient + 'static> {
    decoder: Arc<ActivityDecoder<C>>,
    signatures: SignatureScanner<C>,
    cache: Cache<String, Option<ActivityRecord>>,
    options: HistoryOptions,
}

impl<C: ChainClient + 'static> ActivityHistory<C> {
    pub fn new(
        decoder: Arc<ActivityDecoder<C>>,
        signatures: SignatureScanner<C>,
        options: HistoryOptions,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(options.max_cache_entries)
            .time_to_live(options.cache_ttl)
            .build();
        Self {
            decoder,
            signatures,
            cache,
            options,
        }
    }

    /// List up to `max_signatures` successful signatures older than `cursor`
    /// and decode them.
    #[instrument(skip(self, cancel))]
    pub async fn scan(
        &self,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<HistoryScan, ScanError> {
        let program_id = self.decoder.context().program_id;
        let (signatures, next_cursor) = self
            .signatures
            .list_all(&program_id, cursor, self.options.max_signatures, cancel)
            .await?;
        let scanned = signatures.len();

        let decoded = self
            .decode_all(signatures.into_iter().map(|s| s.signature).collect(), cancel)
            .await?;

        let mut scan = HistoryScan {
            scanned,
            next_cursor,
            ..Default::default()
        };
        for (signature, result) in decoded {
            match result {
                Ok(Some(record)) => scan.records.push(record),
                Ok(None) => {}
                Err(error) => {
                    warn!("Giving up on {}: {}", signature, error);
                    scan.failures.push(DecodeFailure { signature, error });
                }
            }
        }

        info!(
            "History scan: {} signatures, {} plays, {} failures",
            scan.scanned,
            scan.records.len(),
            scan.failures.len()
        );
        Ok(scan)
    }

    /// Decode `signatures` concurrently. Output order matches input order.
    pub async fn decode_all(
        &self,
        signatures: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, Result<Option<ActivityRecord>, ScanError>)>, ScanError> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_parallel_decodes.max(1)));
        let mut tasks = JoinSet::new();

        for (index, signature) in signatures.into_iter().enumerate() {
            let permit = tokio::select! {
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                permit = semaphore.clone().acquire_owned() => {
                    permit.map_err(|_| ScanError::Cancelled)?
                }
            };

            let decoder = self.decoder.clone();
            let cache = self.cache.clone();
            let cancel = cancel.clone();
            let attempts = self.options.retry_attempts;
            tasks.spawn(async move {
                let _permit = permit;
                let result = decode_cached(&decoder, &cache, &signature, attempts, &cancel).await;
                (index, signature, result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(item) => results.push(item),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => return Err(ScanError::Cancelled),
            }
        }

        if results.iter().any(|(_, _, r)| matches!(r, Err(ScanError::Cancelled))) {
            return Err(ScanError::Cancelled);
        }

        results.sort_by_key(|(index, _, _)| *index);
        Ok(results.into_iter().map(|(_, signature, result)| (signature, result)).collect())
    }
}

async fn decode_cached<C: ChainClient>(
    decoder: &ActivityDecoder<C>,
    cache: &Cache<String, Option<ActivityRecord>>,
    signature: &str,
    attempts: usize,
    cancel: &CancellationToken,
) -> Result<Option<ActivityRecord>, ScanError> {
    if let Some(hit) = cache.get(signature).await {
        return Ok(hit);
    }

    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .take(attempts);

    let retry = RetryIf::start(
        retry_strategy,
        || decoder.decode(signature, cancel),
        |e: &ScanError| e.is_retryable(),
    );
    // Backoff sleeps do not look at the token themselves.
    let result = tokio::select! {
        _ = cancel.cancelled() => Err(ScanError::Cancelled),
        result = retry => result,
    };

    if let Ok(value) = &result {
        cache.insert(signature.to_string(), value.clone()).await;
    }
    result
}
