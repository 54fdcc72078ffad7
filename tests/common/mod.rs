//! In-memory chain used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dice_scanner::scanner::activity::PLAY_GAME_DISCRIMINATOR;
use dice_scanner::scanner::{ChainClient, ScanError};
use dice_scanner::types::{ParsedInstruction, ParsedTransaction, RawAccount, TransactionSignature};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct MockChain {
    pub accounts: Vec<(Pubkey, RawAccount)>,
    pub single_accounts: HashMap<Pubkey, RawAccount>,
    /// Newest first
    pub signatures: Vec<TransactionSignature>,
    pub transactions: HashMap<String, ParsedTransaction>,
    /// Remaining network failures per signature
    pub flaky: Mutex<HashMap<String, usize>>,
    pub reject_pools: HashSet<Pubkey>,
    pub submitted: Mutex<Vec<Instruction>>,
    /// Cancelled right after the first accepted submission
    pub cancel_after_submit: Option<CancellationToken>,
    pub transaction_fetches: AtomicUsize,
    pub signature_queries: AtomicUsize,
}

impl MockChain {
    pub fn fetches(&self) -> usize {
        self.transaction_fetches.load(Ordering::SeqCst)
    }

    /// Register a successful play and its signature (appended as the oldest so far).
    pub fn add_play(&mut self, kind: u64, wager: u64, slot: u64, actor: &Pubkey) -> String {
        let signature = Signature::new_unique().to_string();
        self.signatures.push(TransactionSignature {
            signature: signature.clone(),
            slot,
            failed: false,
        });
        self.transactions
            .insert(signature.clone(), play_transaction(kind, wager, Some(slot), actor));
        signature
    }

    /// Register a signature the node flags as failed.
    pub fn add_failed(&mut self, slot: u64) -> String {
        let signature = Signature::new_unique().to_string();
        self.signatures.push(TransactionSignature {
            signature: signature.clone(),
            slot,
            failed: true,
        });
        signature
    }

    /// Register a successful transaction with no play instruction.
    pub fn add_unrelated(&mut self, slot: u64) -> String {
        let signature = Signature::new_unique().to_string();
        self.signatures.push(TransactionSignature {
            signature: signature.clone(),
            slot,
            failed: false,
        });
        self.transactions.insert(
            signature.clone(),
            ParsedTransaction {
                slot: Some(slot),
                error: None,
                instructions: vec![ParsedInstruction {
                    program_id: "11111111111111111111111111111111".to_string(),
                    accounts: vec![],
                    data: None,
                }],
                inner_instructions: Some(vec![]),
            },
        );
        signature
    }
}

pub fn play_data(kind: u64, wager: u64) -> String {
    let mut bytes = PLAY_GAME_DISCRIMINATOR.to_vec();
    bytes.extend_from_slice(&kind.to_le_bytes());
    bytes.extend_from_slice(&wager.to_le_bytes());
    bs58::encode(bytes).into_string()
}

pub fn play_transaction(kind: u64, wager: u64, slot: Option<u64>, actor: &Pubkey) -> ParsedTransaction {
    ParsedTransaction {
        slot,
        error: None,
        instructions: vec![ParsedInstruction {
            program_id: "B7zxxL7pyzsCojCzdpJx3CPLVC9n5MhDUZ2jxWMf5MRp".to_string(),
            accounts: vec![actor.to_string(), Pubkey::new_unique().to_string()],
            data: Some(play_data(kind, wager)),
        }],
        inner_instructions: Some(vec![]),
    }
}

pub fn player_pool_bytes(owner: &Pubkey, claimable: u64) -> Vec<u8> {
    let mut data = vec![0u8; 168];
    data[8..40].copy_from_slice(owner.as_ref());
    data[88..96].copy_from_slice(&claimable.to_le_bytes());
    data
}

#[async_trait]
impl ChainClient for MockChain {
    async fn accounts_by_size(
        &self,
        program_id: &Pubkey,
        _data_size: u64,
    ) -> Result<Vec<(Pubkey, RawAccount)>, ScanError> {
        // Size filtering is left to the caller so tests can see it applied.
        Ok(self
            .accounts
            .iter()
            .filter(|(_, a)| a.owner == *program_id)
            .cloned()
            .collect())
    }

    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, ScanError> {
        Ok(self.single_accounts.get(address).cloned())
    }

    async fn signatures_for_address(
        &self,
        _address: &Pubkey,
        before: Option<Signature>,
        limit: usize,
    ) -> Result<Vec<TransactionSignature>, ScanError> {
        self.signature_queries.fetch_add(1, Ordering::SeqCst);
        let start = match before {
            Some(before) => {
                let before = before.to_string();
                self.signatures
                    .iter()
                    .position(|s| s.signature == before)
                    .map(|i| i + 1)
                    .unwrap_or(self.signatures.len())
            }
            None => 0,
        };
        Ok(self.signatures.iter().skip(start).take(limit).cloned().collect())
    }

    async fn fetch_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>, ScanError> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(remaining) = flaky.get_mut(signature) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ScanError::Network("connection reset".to_string()));
                }
            }
        }
        Ok(self.transactions.get(signature).cloned())
    }

    async fn submit(&self, instructions: &[Instruction]) -> Result<String, ScanError> {
        let pool = instructions[0].accounts[1].pubkey;
        if self.reject_pools.contains(&pool) {
            return Err(ScanError::Submission(format!("simulation failed for {}", pool)));
        }
        self.submitted.lock().unwrap().extend_from_slice(instructions);
        if let Some(cancel) = &self.cancel_after_submit {
            cancel.cancel();
        }
        Ok(Signature::new_unique().to_string())
    }
}
