//! Byte offsets of the on-chain layouts the scanner reads.

use solana_sdk::pubkey::Pubkey;

/// Player pool: owner address.
pub const OWNER_OFFSET: usize = 8;
/// Player pool: claimable lamports.
pub const CLAIMABLE_OFFSET: usize = 88;
/// Play instruction: game kind.
pub const KIND_OFFSET: usize = 8;
/// Play instruction: wager in lamports.
pub const WAGER_OFFSET: usize = 16;

/// Read the 8-byte span at `offset`, reverse it, and read the result
/// most-significant byte first.
///
/// The reversal is kept literal: it is how the field order of the account and
/// instruction layouts is recovered, and the net value equals the field as
/// written on-chain.
pub fn read_reversed_u64(data: &[u8], offset: usize) -> Option<u64> {
    let span = data.get(offset..offset.checked_add(8)?)?;
    let mut buf: [u8; 8] = span.try_into().ok()?;
    buf.reverse();
    Some(u64::from_be_bytes(buf))
}

/// Little-endian u64 at `offset`.
pub fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let span = data.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(span.try_into().ok()?))
}

pub fn read_pubkey(data: &[u8], offset: usize) -> Option<Pubkey> {
    let span = data.get(offset..offset.checked_add(32)?)?;
    let bytes: [u8; 32] = span.try_into().ok()?;
    Some(Pubkey::new_from_array(bytes))
}
