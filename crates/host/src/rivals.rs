//! Rival players
//!
//! Other accounts playing the game directly. Each play advances the shared
//! counter, which is what can invalidate an off-chain prediction.

use alloy_primitives::keccak256;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rollcheck_core::{Address, Amount, Transaction, TxKind, ETHER, STAKE_REQUIREMENT};

use crate::chain::Chain;

/// Seeded set of rival players
#[derive(Clone, Debug)]
pub struct Rivals {
    accounts: Vec<Address>,
    play_probability: f64,
    rng: StdRng,
}

impl Rivals {
    /// Derive `count` deterministic accounts
    pub fn new(count: usize, play_probability: f64, seed: u64) -> Self {
        let accounts = (0..count)
            .map(|i| Address::from_word(keccak256(format!("rollcheck-rival-{i}"))))
            .collect();
        Self {
            accounts,
            play_probability: play_probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rival accounts
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Genesis allocation giving every rival `balance`
    pub fn allocations(&self, balance: Amount) -> impl Iterator<Item = (Address, Amount)> + '_ {
        self.accounts.iter().map(move |a| (*a, balance))
    }

    /// Default rival bankroll
    pub const fn default_balance() -> Amount {
        ETHER
    }

    /// Plays the rivals send for the next block
    pub fn plays(&mut self, chain: &Chain) -> Vec<Transaction> {
        let mut txs = Vec::new();
        for account in &self.accounts {
            if self.rng.gen_bool(self.play_probability) {
                txs.push(Transaction::new(*account, chain.next_nonce(account), TxKind::Play {
                    stake: STAKE_REQUIREMENT,
                }));
            }
        }
        txs
    }
}
