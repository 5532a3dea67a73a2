//! When the operator submits attempts

use rollcheck_core::{
    Address, PredictedOutcome, PredictorError, Receipt, Transaction, TxError, TxKind,
    STAKE_REQUIREMENT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::Chain;

/// Submission strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Submit every block and let the on-chain gate decide
    Always,
    /// Predict off-chain against the pending block and submit only on a win
    #[default]
    Precheck,
}

impl From<&str> for Strategy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            _ => Self::Precheck,
        }
    }
}

/// Attempt outcomes seen so far
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorStats {
    /// Attempts submitted
    pub submitted: u64,
    /// Blocks where the pre-check said no
    pub skipped: u64,
    /// Plays committed
    pub wins: u64,
    /// Attempts stopped by the on-chain gate
    pub predicted_losses: u64,
    /// Attempts that passed a pre-check but lost on-chain
    pub stale_prechecks: u64,
    /// Plays that failed in the game
    pub external_failures: u64,
    /// Attempts rejected for lack of funds
    pub insufficient_balance: u64,
}

/// Submits `AttemptRiggedPlay` on behalf of the owner
#[derive(Clone, Debug)]
pub struct Operator {
    account: Address,
    strategy: Strategy,
    stats: OperatorStats,
}

impl Operator {
    /// Create an operator signing as `account`
    pub fn new(account: Address, strategy: Strategy) -> Self {
        Self { account, strategy, stats: OperatorStats::default() }
    }

    /// Strategy in use
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Outcome counters
    pub const fn stats(&self) -> &OperatorStats {
        &self.stats
    }

    /// Decide whether to attempt in the pending block.
    ///
    /// The pre-check assumes every pending play ahead of ours settles and
    /// advances the counter; a rival play that reverts makes it stale. It
    /// only predicts for the next block, so it skips when that block is
    /// already full.
    pub fn next_attempt(&mut self, chain: &Chain) -> Option<Transaction> {
        if self.strategy == Strategy::Precheck {
            let predictor = chain.executor().predictor();
            if chain.balance(&predictor.address()) < STAKE_REQUIREMENT {
                self.stats.skipped += 1;
                return None;
            }

            let block = chain.pending_context();
            if chain.next_block_full() {
                debug!(block = block.number, "next block already full, skipping");
                self.stats.skipped += 1;
                return None;
            }

            let counter = chain.pending_counter();
            let outcome = PredictedOutcome::compute(&block.parent_hash, &predictor.game(), counter);
            if !outcome.is_win() {
                debug!(
                    block = block.number,
                    roll = outcome.roll,
                    %counter,
                    "pre-check predicts loss, skipping"
                );
                self.stats.skipped += 1;
                return None;
            }
            info!(block = block.number, roll = outcome.roll, %counter, "pre-check predicts win");
        }

        self.stats.submitted += 1;
        let nonce = chain.next_nonce(&self.account);
        Some(Transaction::new(self.account, nonce, TxKind::AttemptRiggedPlay))
    }

    /// Fold an attempt's receipt into the stats
    pub fn record(&mut self, receipt: &Receipt) {
        match &receipt.status {
            Ok(()) => self.stats.wins += 1,
            Err(TxError::Predictor(PredictorError::PredictedLoss { .. })) => {
                self.stats.predicted_losses += 1;
                if self.strategy == Strategy::Precheck {
                    self.stats.stale_prechecks += 1;
                }
            }
            Err(TxError::Predictor(PredictorError::ExternalCallFailed(_))) => {
                self.stats.external_failures += 1;
            }
            Err(TxError::Predictor(PredictorError::InsufficientBalance { .. })) => {
                self.stats.insufficient_balance += 1;
            }
            Err(_) => {}
        }
    }

    /// Account the operator signs with
    pub const fn account(&self) -> Address {
        self.account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rollcheck_core::U256;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(Strategy::from("ALWAYS"), Strategy::Always);
        assert_eq!(Strategy::from("precheck"), Strategy::Precheck);
        assert_eq!(Strategy::from("anything"), Strategy::Precheck);
    }

    #[test]
    fn test_always_submits() {
        let config = Config::default();
        let chain = Chain::genesis(&config, []).unwrap();
        let mut operator = Operator::new(config.owner, Strategy::Always);

        let tx = operator.next_attempt(&chain).unwrap();
        assert_eq!(tx.kind, TxKind::AttemptRiggedPlay);
        assert_eq!(tx.from, config.owner);
        assert_eq!(operator.stats().submitted, 1);
    }

    #[test]
    fn test_precheck_skips_when_next_block_full() {
        let config = Config { max_tx_per_block: 1, ..Config::default() };
        let mut chain = Chain::genesis(&config, []).unwrap();
        let mut precheck = Operator::new(config.owner, Strategy::Precheck);
        let mut always = Operator::new(config.owner, Strategy::Always);

        let filler = Address::repeat_byte(0x77);
        let fund = TxKind::Fund { amount: U256::from(1u64) };
        chain.submit(Transaction::new(filler, 0, fund)).unwrap();

        assert!(precheck.next_attempt(&chain).is_none());
        assert_eq!(precheck.stats().skipped, 1);
        assert_eq!(precheck.stats().submitted, 0);
        assert!(always.next_attempt(&chain).is_some());
    }

    #[test]
    fn test_precheck_agrees_with_chain() {
        let config = Config {
            initial_funding: STAKE_REQUIREMENT * U256::from(64u64),
            ..Config::default()
        };
        let mut chain = Chain::genesis(&config, []).unwrap();
        let mut operator = Operator::new(config.owner, Strategy::Precheck);

        for _ in 0..64 {
            let expected = chain.preview();
            match operator.next_attempt(&chain) {
                Some(tx) => {
                    assert!(expected.is_win());
                    let hash = chain.submit(tx).unwrap();
                    chain.produce_block(0);
                    let receipt = chain.receipt(&hash).unwrap().clone();
                    assert!(receipt.is_success(), "{:?}", receipt.status);
                    operator.record(&receipt);
                }
                None => {
                    assert!(!expected.is_win());
                    chain.produce_block(0);
                }
            }
        }

        let stats = operator.stats();
        assert_eq!(stats.stale_prechecks, 0);
        assert_eq!(stats.submitted + stats.skipped, 64);
        assert_eq!(stats.wins, stats.submitted);
    }
}
