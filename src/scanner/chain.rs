//! Network collaborator used by every scanner component.
//!
//! Components only see the [`ChainClient`] trait. [`RpcChainClient`] is the
//! production implementation on top of the nonblocking Solana RPC client; tests
//! substitute an in-memory implementation.

use crate::scanner::error::ScanError;
use crate::scanner::types::ScannerConfig;
use crate::types::{ParsedInstruction, ParsedTransaction, RawAccount, TransactionSignature};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::json;
use solana_account_decoder::UiAccountEncoding;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcTransactionConfig};
use solana_client::rpc_filter::RpcFilterType;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInnerInstructions,
    UiInstruction, UiMessage, UiParsedInstruction, UiTransactionEncoding,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Queries and submissions the scanner needs from the network layer.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// All accounts owned by `program_id` whose data is exactly `data_size` bytes.
    async fn accounts_by_size(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<(Pubkey, RawAccount)>, ScanError>;

    /// One account, `None` if it does not exist.
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ScanError>;

    /// Signatures touching `address`, newest first, starting before `before`.
    /// Failed transactions are included and flagged.
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<TransactionSignature>, ScanError>;

    /// A confirmed transaction, `None` if the node does not know it.
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>, ScanError>;

    /// Sign, send and confirm one transaction made of `instructions`.
    async fn submit(&self, instructions: &[Instruction]) -> Result<String, ScanError>;
}

/// [`ChainClient`] backed by a Solana JSON-RPC endpoint.
pub struct RpcChainClient {
    rpc: Arc<RpcClient>,
    limiter: DefaultDirectRateLimiter,
    payer: Option<Arc<Keypair>>,
}

impl RpcChainClient {
    /// Create a client for `config.rpc_endpoint`. `payer` is only needed for [`ChainClient::submit`].
    pub fn new(config: &ScannerConfig, payer: Option<Arc<Keypair>>) -> Self {
        let rpc = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.rpc_endpoint.clone(),
            Duration::from_secs(config.rpc_timeout_seconds),
            CommitmentConfig::confirmed(),
        ));
        Self::with_rpc(rpc, config.rate_limit_requests_per_second, payer)
    }

    pub fn with_rpc(
        rpc: Arc<RpcClient>,
        requests_per_second: u32,
        payer: Option<Arc<Keypair>>,
    ) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
        Self {
            rpc,
            limiter: RateLimiter::direct(quota),
            payer,
        }
    }

    async fn throttle(&self) {
        self.limiter.until_ready().await;
    }
}

fn network(e: ClientError) -> ScanError {
    ScanError::Network(e.to_string())
}

#[async_trait]
impl ChainClient for RpcChainClient {
    #[instrument(skip(self), fields(program = %program_id))]
    async fn accounts_by_size(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<(Pubkey, RawAccount)>, ScanError> {
        self.throttle().await;
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::DataSize(data_size)]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.rpc.commitment()),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .rpc
            .get_program_accounts_with_config(program_id, config)
            .await
            .map_err(network)?;

        debug!("getProgramAccounts returned {} accounts", accounts.len());
        Ok(accounts
            .into_iter()
            .map(|(address, account)| {
                (address, RawAccount::new(account.owner, account.lamports, account.data))
            })
            .collect())
    }

    #[instrument(skip(self), fields(address = %address))]
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ScanError> {
        self.throttle().await;
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await
            .map_err(network)?;
        Ok(response
            .value
            .map(|account| RawAccount::new(account.owner, account.lamports, account.data)))
    }

    #[instrument(skip(self), fields(address = %address))]
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<TransactionSignature>, ScanError> {
        self.throttle().await;
        let config = GetConfirmedSignaturesForAddress2Config {
            before,
            until: None,
            limit: Some(limit),
            commitment: Some(self.rpc.commitment()),
        };
        let statuses = self
            .rpc
            .get_signatures_for_address_with_config(address, config)
            .await
            .map_err(network)?;

        Ok(statuses
            .into_iter()
            .map(|status| TransactionSignature {
                signature: status.signature,
                slot: status.slot,
                failed: status.err.is_some(),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>, ScanError> {
        self.throttle().await;
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.rpc.commitment()),
            max_supported_transaction_version: Some(0),
        };
        // `send` keeps a JSON null result distinguishable from a transport failure.
        let raw: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .rpc
            .send(RpcRequest::GetTransaction, json!([signature, config]))
            .await
            .map_err(network)?;
        Ok(raw.map(parse_transaction))
    }

    #[instrument(skip(self, instructions), fields(count = instructions.len()))]
    async fn submit(&self, instructions: &[Instruction]) -> Result<String, ScanError> {
        let payer = self
            .payer
            .as_ref()
            .ok_or_else(|| ScanError::Configuration("no payer keypair configured".to_string()))?;

        self.throttle().await;
        let blockhash = self.rpc.get_latest_blockhash().await.map_err(network)?;

        let mut tx = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
        tx.try_sign(&[&**payer], blockhash)
            .map_err(|e| ScanError::Submission(e.to_string()))?;

        self.throttle().await;
        let signature = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| ScanError::Submission(e.to_string()))?;
        Ok(signature.to_string())
    }
}

/// Convert an RPC transaction into the network-neutral [`ParsedTransaction`].
pub fn parse_transaction(raw: EncodedConfirmedTransactionWithStatusMeta) -> ParsedTransaction {
    let EncodedConfirmedTransactionWithStatusMeta { slot, transaction, .. } = raw;

    let account_keys: Vec<String> = match &transaction.transaction {
        EncodedTransaction::Json(ui_tx) => match &ui_tx.message {
            UiMessage::Parsed(msg) => msg.account_keys.iter().map(|k| k.pubkey.clone()).collect(),
            UiMessage::Raw(msg) => msg.account_keys.clone(),
        },
        _ => Vec::new(),
    };

    let instructions = match transaction.transaction {
        EncodedTransaction::Json(ui_tx) => match ui_tx.message {
            UiMessage::Parsed(msg) => msg
                .instructions
                .into_iter()
                .map(|ix| convert_instruction(ix, &account_keys))
                .collect(),
            UiMessage::Raw(msg) => msg
                .instructions
                .into_iter()
                .map(|ix| convert_instruction(UiInstruction::Compiled(ix), &account_keys))
                .collect(),
        },
        _ => Vec::new(),
    };

    let (error, inner_instructions) = match transaction.meta {
        Some(meta) => {
            let inner: Option<Vec<UiInnerInstructions>> = meta.inner_instructions.into();
            let inner = inner.map(|sets| {
                sets.into_iter()
                    .flat_map(|set| set.instructions)
                    .map(|ix| convert_instruction(ix, &account_keys))
                    .collect()
            });
            (meta.err.map(|e| e.to_string()), inner)
        }
        None => (Some("transaction meta missing".to_string()), None),
    };

    ParsedTransaction {
        slot: Some(slot),
        error,
        instructions,
        inner_instructions,
    }
}

fn convert_instruction(ix: UiInstruction, account_keys: &[String]) -> ParsedInstruction {
    let key_at = |index: usize| account_keys.get(index).cloned().unwrap_or_default();
    match ix {
        UiInstruction::Compiled(c) => ParsedInstruction {
            program_id: key_at(c.program_id_index as usize),
            accounts: c.accounts.iter().map(|&i| key_at(i as usize)).collect(),
            data: Some(c.data),
        },
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(pd)) => ParsedInstruction {
            program_id: pd.program_id,
            accounts: pd.accounts,
            data: Some(pd.data),
        },
        UiInstruction::Parsed(UiParsedInstruction::Parsed(p)) => ParsedInstruction {
            program_id: p.program_id,
            accounts: Vec::new(),
            data: None,
        },
    }
}
