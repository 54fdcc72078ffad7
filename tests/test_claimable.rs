//! Claimable aggregation and player pool lookups against an in-memory chain.

mod common;

use common::{player_pool_bytes, MockChain};
use dice_scanner::scanner::{pda, ScannerBuilder};
use dice_scanner::types::{ClaimableEntry, RawAccount};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn program() -> Pubkey {
    "B7zxxL7pyzsCojCzdpJx3CPLVC9n5MhDUZ2jxWMf5MRp".parse().unwrap()
}

#[tokio::test]
async fn test_claimable_entries_follow_scan_order() {
    let program = program();
    let mut chain = MockChain::default();
    let owners: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
    for (i, owner) in owners.iter().enumerate() {
        chain.accounts.push((
            Pubkey::new_unique(),
            RawAccount::new(program, 1_000_000, player_pool_bytes(owner, (i as u64 + 1) * 250_000)),
        ));
    }

    let scanner = ScannerBuilder::new().build(Arc::new(chain)).unwrap();
    let entries = scanner.claimable(&CancellationToken::new()).await.unwrap();

    let expected: Vec<ClaimableEntry> = owners
        .iter()
        .enumerate()
        .map(|(i, owner)| ClaimableEntry {
            owner: *owner,
            amount: (i as u64 + 1) * 250_000,
        })
        .collect();
    assert_eq!(entries, expected);
}

#[tokio::test]
async fn test_claimable_ignores_other_sizes_and_programs() {
    let program = program();
    let player = Pubkey::new_unique();
    let mut chain = MockChain::default();
    chain.accounts.push((
        Pubkey::new_unique(),
        RawAccount::new(program, 1, player_pool_bytes(&player, 42)),
    ));
    // Global pool style account of a different size
    chain.accounts.push((Pubkey::new_unique(), RawAccount::new(program, 1, vec![0u8; 200])));
    // Same size but owned by someone else
    chain.accounts.push((
        Pubkey::new_unique(),
        RawAccount::new(Pubkey::new_unique(), 1, player_pool_bytes(&Pubkey::new_unique(), 7)),
    ));

    let scanner = ScannerBuilder::new().build(Arc::new(chain)).unwrap();
    let entries = scanner.claimable(&CancellationToken::new()).await.unwrap();

    assert_eq!(entries, vec![ClaimableEntry { owner: player, amount: 42 }]);
}

#[tokio::test]
async fn test_claimable_empty_program() {
    let scanner = ScannerBuilder::new().build(Arc::new(MockChain::default())).unwrap();
    let entries = scanner.claimable(&CancellationToken::new()).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_claimable_cancelled_before_scan() {
    let scanner = ScannerBuilder::new().build(Arc::new(MockChain::default())).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = scanner.claimable(&cancel).await;
    assert!(matches!(result, Err(dice_scanner::ScanError::Cancelled)));
}

#[tokio::test]
async fn test_player_pool_state_lookup() {
    let program = program();
    let player = Pubkey::new_unique();
    let (pool, _) = pda::player_pool(&program, &player).unwrap();

    let mut data = player_pool_bytes(&player, 9_000);
    data[40..48].copy_from_slice(&3u64.to_le_bytes());
    data[72..80].copy_from_slice(&2u64.to_le_bytes());
    data[96..104].copy_from_slice(&55u64.to_le_bytes());

    let mut chain = MockChain::default();
    chain.single_accounts.insert(pool, RawAccount::new(program, 1, data));
    let scanner = ScannerBuilder::new().build(Arc::new(chain)).unwrap();
    let cancel = CancellationToken::new();

    let state = scanner.player_pool_state(&player, &cancel).await.unwrap().unwrap();
    assert_eq!(state.player, player);
    assert_eq!(state.round, 3);
    assert_eq!(state.win_times, 2);
    assert_eq!(state.claimable_reward, 9_000);
    assert_eq!(state.claimable_token[0], 55);

    let stranger = Pubkey::new_unique();
    assert!(scanner.player_pool_state(&stranger, &cancel).await.unwrap().is_none());
}
