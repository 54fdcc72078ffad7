//! Program-derived address helpers.
//!
//! Derivation goes through `Pubkey::try_find_program_address`, which runs the
//! same SHA-256 and off-curve search as the on-chain runtime.

use crate::scanner::error::ScanError;
use solana_sdk::pubkey::Pubkey;

pub const GLOBAL_AUTHORITY_SEED: &[u8] = b"global-authority";
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault-authority";
pub const PLAYER_POOL_SEED: &[u8] = b"player-pool";

/// Derive a program address and its bump from `seeds`.
pub fn derive(program_id: &Pubkey, seeds: &[&[u8]]) -> Result<(Pubkey, u8), ScanError> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or_else(|| {
        ScanError::Configuration(format!(
            "no valid bump for {} seed(s) under program {}",
            seeds.len(),
            program_id
        ))
    })
}

pub fn global_authority(program_id: &Pubkey) -> Result<(Pubkey, u8), ScanError> {
    derive(program_id, &[GLOBAL_AUTHORITY_SEED])
}

pub fn vault_authority(program_id: &Pubkey) -> Result<(Pubkey, u8), ScanError> {
    derive(program_id, &[VAULT_AUTHORITY_SEED])
}

/// Player pool keyed by player only.
pub fn player_pool(program_id: &Pubkey, player: &Pubkey) -> Result<(Pubkey, u8), ScanError> {
    derive(program_id, &[player.as_ref(), PLAYER_POOL_SEED])
}

/// Player pool for one game session. The session id is appended big-endian.
pub fn player_pool_for_session(
    program_id: &Pubkey,
    player: &Pubkey,
    session_id: u64,
) -> Result<(Pubkey, u8), ScanError> {
    derive(
        program_id,
        &[player.as_ref(), PLAYER_POOL_SEED, &session_id.to_be_bytes()],
    )
}

/// Per-session escrow vault.
pub fn game_vault(
    program_id: &Pubkey,
    player: &Pubkey,
    session_id: u64,
) -> Result<(Pubkey, u8), ScanError> {
    derive(
        program_id,
        &[player.as_ref(), VAULT_AUTHORITY_SEED, &session_id.to_be_bytes()],
    )
}
