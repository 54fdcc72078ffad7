//! Claimable balances read straight out of player-pool account bytes.

use crate::scanner::accounts::AccountScanner;
use crate::scanner::chain::ChainClient;
use crate::scanner::error::{ScanError, SkipReason};
use crate::scanner::layout::{read_pubkey, read_reversed_u64, read_u64, CLAIMABLE_OFFSET, OWNER_OFFSET};
use crate::scanner::pda;
use crate::types::{ClaimableEntry, RawAccount};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Number of token slots tracked per player pool.
pub const CLAIMABLE_TOKEN_SLOTS: usize = 9;

/// Decode one claimable entry from a player-pool buffer.
pub fn decode_entry(data: &[u8]) -> Result<ClaimableEntry, SkipReason> {
    let owner = read_pubkey(data, OWNER_OFFSET).ok_or(SkipReason::BufferTooShort)?;
    let amount = read_reversed_u64(data, CLAIMABLE_OFFSET).ok_or(SkipReason::BufferTooShort)?;
    Ok(ClaimableEntry { owner, amount })
}

/// Turn scanned player pools into claimable entries.
///
/// Output follows input order. Buffers that are too short are dropped.
pub fn aggregate<'a, I>(accounts: I) -> Vec<ClaimableEntry>
where
    I: IntoIterator<Item = (&'a Pubkey, &'a RawAccount)>,
{
    accounts
        .into_iter()
        .filter_map(|(address, account)| match decode_entry(&account.data) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                debug!("Skipping player pool {}: {}", address, reason);
                None
            }
        })
        .collect()
}

/// Last game recorded in a player pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameData {
    pub play_time: u64,
    pub reward_amount: u64,
    pub token: u64,
}

/// Full decode of a 168-byte player pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerPoolState {
    #[serde(with = "crate::types::pubkey_string")]
    pub player: Pubkey,
    pub round: u64,
    pub game_data: GameData,
    pub win_times: u64,
    pub received_reward: u64,
    pub claimable_reward: u64,
    pub claimable_token: [u64; CLAIMABLE_TOKEN_SLOTS],
}

impl PlayerPoolState {
    pub fn decode(data: &[u8]) -> Result<Self, SkipReason> {
        let short = SkipReason::BufferTooShort;
        let entry = decode_entry(data)?;

        let mut claimable_token = [0u64; CLAIMABLE_TOKEN_SLOTS];
        for (i, slot) in claimable_token.iter_mut().enumerate() {
            *slot = read_u64(data, 96 + i * 8).ok_or(short)?;
        }

        Ok(Self {
            player: entry.owner,
            round: read_u64(data, 40).ok_or(short)?,
            game_data: GameData {
                play_time: read_u64(data, 48).ok_or(short)?,
                reward_amount: read_u64(data, 56).ok_or(short)?,
                token: read_u64(data, 64).ok_or(short)?,
            },
            win_times: read_u64(data, 72).ok_or(short)?,
            received_reward: read_u64(data, 80).ok_or(short)?,
            claimable_reward: entry.amount,
            claimable_token,
        })
    }
}

/// Scans player pools and reports what each player can claim.
pub struct ClaimableAggregator<C: ChainClient> {
    client: Arc<C>,
    scanner: AccountScanner<C>,
}

impl<C: ChainClient> ClaimableAggregator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            scanner: AccountScanner::new(client.clone()),
            client,
        }
    }

    /// Scan every player pool of `exact_size` bytes and aggregate claimable amounts.
    #[instrument(skip(self, cancel), fields(program = %program_id))]
    pub async fn claimable_for_program(
        &self,
        program_id: &Pubkey,
        exact_size: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClaimableEntry>, ScanError> {
        let accounts = self.scanner.scan_by_size(program_id, exact_size, cancel).await?;
        let entries = aggregate(accounts.iter().map(|(address, account)| (address, account)));
        info!("Aggregated {} claimable entries from {} accounts", entries.len(), accounts.len());
        Ok(entries)
    }

    /// Fetch and decode one player's pool. `None` if the pool does not exist or is malformed.
    #[instrument(skip(self, cancel), fields(player = %player))]
    pub async fn player_pool_state(
        &self,
        program_id: &Pubkey,
        player: &Pubkey,
        cancel: &CancellationToken,
    ) -> Result<Option<PlayerPoolState>, ScanError> {
        let (pool, _) = pda::player_pool(program_id, player)?;
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let Some(account) = self.client.fetch_account(&pool).await? else {
            debug!("Player pool {} not found", pool);
            return Ok(None);
        };

        match PlayerPoolState::decode(&account.data) {
            Ok(state) => Ok(Some(state)),
            Err(reason) => {
                debug!("Player pool {} not decodable: {}", pool, reason);
                Ok(None)
            }
        }
    }
}
