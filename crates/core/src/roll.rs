//! Roll prediction
//!
//! The game derives its outcome as
//!
//! ```text
//! roll = uint256(keccak256(previous_block_hash ‖ game_address ‖ counter)) mod 16
//! ```
//!
//! over the packed encoding: the 32-byte hash, the 20-byte address and the
//! counter as a 32-byte big-endian word, in that order. Any deviation in hash
//! function, field order or width yields a different roll than the game's.

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::types::{Address, Hash, ROLL_MODULUS, U256, WIN_THRESHOLD};

/// Outcome recomputed locally before committing a stake.
///
/// Never cached: the previous block hash changes every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedOutcome {
    /// Value in `[0, 16)`
    pub roll: u8,
}

impl PredictedOutcome {
    /// Recompute the roll the game will produce for these inputs
    pub fn compute(previous_block_hash: &Hash, game: &Address, counter: U256) -> Self {
        let digest = roll_digest(previous_block_hash, game, counter);
        let roll = U256::from_be_bytes(digest.0) % U256::from(ROLL_MODULUS);
        Self { roll: roll.to::<u8>() }
    }

    /// Whether the game treats this roll as a win
    pub const fn is_win(&self) -> bool {
        self.roll <= WIN_THRESHOLD
    }
}

/// Keccak-256 over the packed `(hash, address, counter)` encoding
pub fn roll_digest(previous_block_hash: &Hash, game: &Address, counter: U256) -> Hash {
    let mut hasher = Keccak::v256();
    hasher.update(previous_block_hash.as_slice());
    hasher.update(game.as_slice());
    hasher.update(&counter.to_be_bytes::<32>());

    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    Hash::from(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    fn game() -> Address {
        Address::repeat_byte(0x42)
    }

    #[test]
    fn test_digest_matches_packed_encoding() {
        let parent = Hash::repeat_byte(0xab);
        let counter = U256::from(7u64);

        let mut packed = Vec::with_capacity(84);
        packed.extend_from_slice(parent.as_slice());
        packed.extend_from_slice(game().as_slice());
        packed.extend_from_slice(&counter.to_be_bytes::<32>());
        assert_eq!(packed.len(), 84);

        assert_eq!(roll_digest(&parent, &game(), counter), keccak256(&packed));
    }

    #[test]
    fn test_roll_is_low_nibble_of_digest() {
        for i in 0..64u8 {
            let parent = Hash::with_last_byte(i);
            let digest = roll_digest(&parent, &game(), U256::from(3u64));
            let outcome = PredictedOutcome::compute(&parent, &game(), U256::from(3u64));
            assert_eq!(outcome.roll, digest[31] & 0x0f);
            assert!(u64::from(outcome.roll) < ROLL_MODULUS);
        }
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let parent = Hash::repeat_byte(0x11);
        let a = PredictedOutcome::compute(&parent, &game(), U256::from(99u64));
        let b = PredictedOutcome::compute(&parent, &game(), U256::from(99u64));
        assert_eq!(a, b);
    }

    #[test]
    fn test_inputs_change_the_digest() {
        let parent = Hash::repeat_byte(0x11);
        let base = roll_digest(&parent, &game(), U256::ZERO);
        assert_ne!(base, roll_digest(&Hash::repeat_byte(0x12), &game(), U256::ZERO));
        assert_ne!(base, roll_digest(&parent, &Address::repeat_byte(0x43), U256::ZERO));
        assert_ne!(base, roll_digest(&parent, &game(), U256::from(1u64)));
    }

    #[test]
    fn test_win_threshold() {
        for roll in 0..16u8 {
            assert_eq!(PredictedOutcome { roll }.is_win(), roll <= 2);
        }
    }
}
