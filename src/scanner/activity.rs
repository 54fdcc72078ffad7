//! Reconstruct game activity from a single transaction.
//!
//! A play is recognised by the marker at the start of the instruction's base58
//! data. The decoded buffer carries the game kind at bytes `[8,16)` and the
//! wager at `[16,24)`, both stored byte-reversed relative to how they are read.

use crate::scanner::chain::ChainClient;
use crate::scanner::error::{ScanError, SkipReason};
use crate::scanner::layout::{read_reversed_u64, KIND_OFFSET, WAGER_OFFSET};
use crate::scanner::types::{Marker, ProgramContext};
use crate::types::{ActivityRecord, ParsedInstruction, ParsedTransaction};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Anchor sighash of `play_game`. Any 24-byte play instruction built on it
/// encodes to base58 text starting with the default marker.
pub const PLAY_GAME_DISCRIMINATOR: [u8; 8] = [37, 88, 207, 85, 42, 144, 122, 197];

/// Index of the first top-level instruction carrying `marker`.
pub fn find_target_instruction(instructions: &[ParsedInstruction], marker: &Marker) -> Option<usize> {
    instructions.iter().position(|ix| {
        ix.data
            .as_deref()
            .is_some_and(|data| marker.matches(data.as_bytes()))
    })
}

/// Parity heuristic used for the outcome of a play.
pub fn outcome_for(kind: u64, block_reference: u64) -> bool {
    kind % 2 == block_reference % 2
}

/// Decode an already fetched transaction.
pub fn decode_transaction(
    tx: &ParsedTransaction,
    signature: &str,
    marker: &Marker,
) -> Result<ActivityRecord, SkipReason> {
    if tx.error.is_some() {
        return Err(SkipReason::TransactionFailed);
    }

    let index = find_target_instruction(&tx.instructions, marker)
        .ok_or(SkipReason::NoMarkedInstruction)?;

    if tx.inner_instructions.is_none() {
        return Err(SkipReason::MissingInnerInstructions);
    }

    let target = &tx.instructions[index];
    let actor = target
        .accounts
        .first()
        .and_then(|key| Pubkey::from_str(key).ok())
        .ok_or(SkipReason::MissingActor)?;

    let encoded = target.data.as_deref().unwrap_or_default();
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| SkipReason::MalformedData)?;

    let kind = read_reversed_u64(&bytes, KIND_OFFSET).ok_or(SkipReason::BufferTooShort)?;
    let wager_amount = read_reversed_u64(&bytes, WAGER_OFFSET).ok_or(SkipReason::BufferTooShort)?;
    let block_reference = tx.slot.unwrap_or(0);

    Ok(ActivityRecord {
        kind,
        actor,
        wager_amount,
        block_reference,
        outcome: outcome_for(kind, block_reference),
        signature: signature.to_string(),
    })
}

/// Fetches one transaction and decodes the play it contains, if any.
pub struct ActivityDecoder<C: ChainClient> {
    client: Arc<C>,
    context: ProgramContext,
}

impl<C: ChainClient> ActivityDecoder<C> {
    pub fn new(client: Arc<C>, context: ProgramContext) -> Self {
        Self { client, context }
    }

    pub fn context(&self) -> &ProgramContext {
        &self.context
    }

    /// `Ok(None)` for every "no activity here" outcome; `Err` only when the fetch itself failed.
    #[instrument(skip(self, cancel))]
    pub async fn decode(
        &self,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ActivityRecord>, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let result = match self.client.fetch_transaction(signature).await? {
            Some(tx) => decode_transaction(&tx, signature, &self.context.marker),
            None => Err(SkipReason::TransactionNotFound),
        };

        match result {
            Ok(record) => Ok(Some(record)),
            Err(reason) => {
                debug!("No activity in {}: {}", signature, reason);
                Ok(None)
            }
        }
    }
}
