//! One block at a time: rivals, operator, block production

use alloy_primitives::utils::format_ether;
use rollcheck_core::{Address, DiceGame, Hash};
use serde::Serialize;
use tracing::{info, warn};

use crate::chain::{BlockInfo, Chain, ChainError};
use crate::config::Config;
use crate::rivals::Rivals;
use crate::strategy::{Operator, OperatorStats, Strategy};

/// What happened to the operator's attempt in a block
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReport {
    /// Attempt transaction hash
    pub tx_hash: Hash,
    /// Roll the predictor computed on-chain
    pub roll: Option<u8>,
    /// Whether the play was committed
    pub success: bool,
    /// Failure reason, if any
    pub error: Option<String>,
}

/// Result of one step
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Block produced
    pub block: BlockInfo,
    /// Rival plays submitted
    pub rival_plays: usize,
    /// The operator's attempt, if one was submitted
    pub attempt: Option<AttemptReport>,
}

/// Totals across the session
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Latest block number
    pub blocks: u64,
    /// Strategy in use
    pub strategy: Strategy,
    /// Predictor custody balance, in ether
    pub predictor_balance: String,
    /// Wins the game recorded for the predictor
    pub predictor_wins: u64,
    /// Plays the game settled for anyone
    pub total_plays: u64,
    /// Game counter
    pub sequence_counter: String,
    /// Account the operator signs attempts with
    pub operator_account: Address,
    /// Rival player accounts
    pub rival_accounts: Vec<Address>,
    /// Operator counters
    pub operator: OperatorStats,
}

/// Chain plus the actors driving it
#[derive(Debug)]
pub struct Session {
    chain: Chain,
    rivals: Rivals,
    operator: Operator,
}

impl Session {
    /// Start from genesis
    pub fn new(config: &Config) -> Result<Self, ChainError> {
        let rivals = Rivals::new(config.rival_count, config.rival_play_probability, config.seed);
        let chain = Chain::genesis(config, rivals.allocations(Rivals::default_balance()))?;
        let operator = Operator::new(config.owner, config.strategy);
        Ok(Self { chain, rivals, operator })
    }

    /// Submit this block's transactions and produce it.
    ///
    /// Rival plays enter the mempool ahead of the attempt, so they execute
    /// first within the block.
    pub fn step(&mut self, timestamp: u64) -> StepReport {
        let mut rival_plays = 0;
        for tx in self.rivals.plays(&self.chain) {
            match self.chain.submit(tx) {
                Ok(_) => rival_plays += 1,
                Err(e) => warn!(error = %e, "rival play dropped"),
            }
        }

        let attempt_hash = match self.operator.next_attempt(&self.chain) {
            Some(tx) => match self.chain.submit(tx) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!(error = %e, "attempt dropped");
                    None
                }
            },
            None => None,
        };

        let block = self.chain.produce_block(timestamp).clone();

        let attempt = attempt_hash.and_then(|hash| self.chain.receipt(&hash)).map(|receipt| {
            self.operator.record(receipt);
            let report = AttemptReport {
                tx_hash: receipt.tx_hash,
                roll: receipt.predicted_roll(),
                success: receipt.is_success(),
                error: receipt.status.as_ref().err().map(ToString::to_string),
            };
            let roll = report.roll;
            match &report.error {
                None => info!(block = block.number, ?roll, "predictor won a play"),
                Some(e) => info!(block = block.number, ?roll, error = %e, "attempt reverted"),
            }
            report
        });

        StepReport { block, rival_plays, attempt }
    }

    /// Totals so far
    pub fn summary(&self) -> SessionSummary {
        let executor = self.chain.executor();
        let predictor = executor.predictor().address();
        SessionSummary {
            blocks: self.chain.latest_block().number,
            strategy: self.operator.strategy(),
            predictor_balance: format_ether(self.chain.balance(&predictor)),
            predictor_wins: executor.game().wins_of(&predictor),
            total_plays: executor.game().plays(),
            sequence_counter: executor.game().sequence_counter().to_string(),
            operator_account: self.operator.account(),
            rival_accounts: self.rivals.accounts().to_vec(),
            operator: self.operator.stats().clone(),
        }
    }

    /// Chain
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Mutable chain, for RPC submissions
    pub fn chain_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }
}
