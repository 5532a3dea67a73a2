//! Common types

pub use alloy_primitives::{Address, B256, U256};

/// 32-byte hash type
pub type Hash = B256;

/// Native value in wei
pub type Amount = U256;

/// Block number type
pub type BlockNumber = u64;

/// Stake the game requires per play: 0.002 ether = 2 * 10^15 wei
pub const STAKE_REQUIREMENT: Amount = U256::from_limbs([2_000_000_000_000_000, 0, 0, 0]);

/// The game reduces its hash modulo this value
pub const ROLL_MODULUS: u64 = 16;

/// Rolls at or below this value win
pub const WIN_THRESHOLD: u8 = 2;

/// One ether in wei
pub const ETHER: Amount = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
