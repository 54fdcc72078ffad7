//! Maintenance instructions understood by the dice program.

use solana_sdk::hash::hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk_ids::system_program;

/// Anchor instruction discriminator: first 8 bytes of `sha256("global:<name>")`.
pub fn sighash(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{}", name).as_bytes()).to_bytes();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Grow one player pool to the current layout.
pub fn resize_user_pool(program_id: &Pubkey, authority: &Pubkey, player_pool: &Pubkey) -> Instruction {
    Instruction::new_with_bytes(
        *program_id,
        &sighash("resize_user_pool"),
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*player_pool, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Grow the global pool to the current layout.
pub fn resize_global_pool(program_id: &Pubkey, authority: &Pubkey, global_pool: &Pubkey) -> Instruction {
    Instruction::new_with_bytes(
        *program_id,
        &sighash("resize_global_pool"),
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(*global_pool, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::activity::PLAY_GAME_DISCRIMINATOR;

    #[test]
    fn test_sighash_matches_play_discriminator() {
        assert_eq!(sighash("play_game"), PLAY_GAME_DISCRIMINATOR);
    }

    #[test]
    fn test_resize_user_pool_accounts() {
        let program = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let pool = Pubkey::new_unique();
        let ix = resize_user_pool(&program, &authority, &pool);

        assert_eq!(ix.program_id, program);
        assert_eq!(ix.data, sighash("resize_user_pool").to_vec());
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, pool);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, system_program::id());
    }

    #[test]
    fn test_resize_global_pool_accounts() {
        let program = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let global = Pubkey::new_unique();
        let ix = resize_global_pool(&program, &authority, &global);

        assert_eq!(ix.data, sighash("resize_global_pool").to_vec());
        assert_eq!(ix.accounts[0].pubkey, authority);
        assert_eq!(ix.accounts[1].pubkey, global);
        assert!(ix.accounts[1].is_writable);
        assert_eq!(ix.accounts[2].pubkey, system_program::id());
    }
}
