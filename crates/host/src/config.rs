//! Configuration

use std::env;
use std::str::FromStr;

use alloy_primitives::{address, utils::parse_ether};
use rollcheck_core::{Address, Amount, ETHER, U256};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::strategy::Strategy;

/// Default owner of the predictor
pub const DEFAULT_OWNER: Address = address!("00000000000000000000000000000000000000a1");

/// Default predictor address
pub const DEFAULT_PREDICTOR: Address = address!("00000000000000000000000000000000000000d1");

/// Default dice game address
pub const DEFAULT_GAME: Address = address!("00000000000000000000000000000000000000d6");

/// Host configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC listen address
    pub rpc_addr: String,
    /// Block interval in milliseconds
    pub block_time_ms: u64,
    /// Transactions taken from the mempool per block
    pub max_tx_per_block: usize,
    /// Mempool capacity
    pub mempool_size: usize,
    /// Predictor owner, also the account that submits attempts
    pub owner: Address,
    /// Predictor address
    pub predictor: Address,
    /// Dice game address
    pub game: Address,
    /// Owner's genesis balance
    pub owner_balance: Amount,
    /// Predictor's genesis custody balance
    pub initial_funding: Amount,
    /// Number of rival players
    pub rival_count: usize,
    /// Chance a rival plays in a given block
    pub rival_play_probability: f64,
    /// When to submit attempts
    pub strategy: Strategy,
    /// Seed for rival behaviour
    pub seed: u64,
    /// Blocks the simulator runs
    pub sim_blocks: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_addr: "0.0.0.0:8547".to_string(),
            block_time_ms: 2000,
            max_tx_per_block: 256,
            mempool_size: 4096,
            owner: DEFAULT_OWNER,
            predictor: DEFAULT_PREDICTOR,
            game: DEFAULT_GAME,
            owner_balance: ETHER * U256::from(10u64),
            // 0.02 ether
            initial_funding: U256::from(20_000_000_000_000_000u64),
            rival_count: 3,
            rival_play_probability: 0.5,
            strategy: Strategy::Precheck,
            seed: 42,
            sim_blocks: 200,
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_addr: env::var("RPC_ADDR").unwrap_or(defaults.rpc_addr),
            block_time_ms: parsed("BLOCK_TIME_MS").unwrap_or(defaults.block_time_ms),
            max_tx_per_block: parsed("MAX_TX_PER_BLOCK").unwrap_or(defaults.max_tx_per_block),
            mempool_size: parsed("MEMPOOL_SIZE").unwrap_or(defaults.mempool_size),
            owner: address_var("OWNER_ADDRESS").unwrap_or(defaults.owner),
            predictor: address_var("PREDICTOR_ADDRESS").unwrap_or(defaults.predictor),
            game: address_var("GAME_ADDRESS").unwrap_or(defaults.game),
            owner_balance: ether_var("OWNER_BALANCE").unwrap_or(defaults.owner_balance),
            initial_funding: ether_var("INITIAL_FUNDING").unwrap_or(defaults.initial_funding),
            rival_count: parsed("RIVAL_COUNT").unwrap_or(defaults.rival_count),
            rival_play_probability: parsed::<f64>("RIVAL_PLAY_PROBABILITY")
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(defaults.rival_play_probability),
            strategy: env::var("STRATEGY")
                .map(|s| Strategy::from(s.as_str()))
                .unwrap_or(defaults.strategy),
            seed: parsed("SEED").unwrap_or(defaults.seed),
            sim_blocks: parsed("SIM_BLOCKS").unwrap_or(defaults.sim_blocks),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    let value = raw.parse().ok();
    if value.is_none() {
        warn!(key, value = %raw, "ignoring unparsable setting");
    }
    value
}

fn address_var(key: &str) -> Option<Address> {
    parsed(key)
}

fn ether_var(key: &str) -> Option<Amount> {
    let raw = env::var(key).ok()?;
    match parse_ether(&raw) {
        Ok(amount) => Some(amount),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unparsable ether amount");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.initial_funding, parse_ether("0.02").unwrap());
        assert_eq!(config.owner_balance, parse_ether("10").unwrap());
        assert_eq!(config.strategy, Strategy::Precheck);
        assert_ne!(config.predictor, config.game);
    }
}
