//! In-process chain
//!
//! Orders transactions into blocks, chains block hashes and keeps the
//! committed event log. Every block's parent hash is what the predictor and
//! the game read as the previous block hash.

use alloy_primitives::map::B256HashMap;
use rollcheck_core::{
    Address, Amount, Block, BlockContext, DiceContract, DiceGame, EventLog, Executor, Hash, Ledger,
    PredictedOutcome, Receipt, RollPredictor, SetupError, Transaction, U256,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::mempool::{Mempool, MempoolStats};

/// Chain errors
#[derive(Debug, Error)]
pub enum ChainError {
    /// Executor could not be set up
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Mempool is at capacity
    #[error("mempool full")]
    MempoolFull,
    /// Same transaction is already pending or already included
    #[error("transaction {0} already known")]
    AlreadyKnown(Hash),
}

/// Block info for storage
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    /// Block number
    pub number: u64,
    /// Block hash
    pub hash: Hash,
    /// Parent block hash
    pub parent_hash: Hash,
    /// Timestamp
    pub timestamp: u64,
    /// Transactions included
    pub tx_count: u32,
    /// Transactions committed
    pub success_count: u32,
}

/// Chain state
#[derive(Debug)]
pub struct Chain {
    executor: Executor<DiceContract>,
    latest_block: BlockInfo,
    blocks: Vec<BlockInfo>,
    receipts: B256HashMap<Receipt>,
    events: EventLog,
    mempool: Mempool,
    max_tx_per_block: usize,
}

impl Chain {
    /// Build the genesis state: owner and predictor balances from `config`,
    /// plus any extra allocations
    pub fn genesis(
        config: &Config,
        allocations: impl IntoIterator<Item = (Address, Amount)>,
    ) -> Result<Self, ChainError> {
        let mut ledger = Ledger::new();
        ledger.set_balance(config.owner, config.owner_balance);
        ledger.set_balance(config.predictor, config.initial_funding);
        for (address, balance) in allocations {
            ledger.set_balance(address, balance);
        }

        let game = DiceContract::new(config.game);
        let predictor = RollPredictor::new(config.predictor, config.owner, config.game);
        let executor = Executor::new(ledger, game, predictor)?;

        let genesis_block = Block::new(0, Hash::ZERO, 0);
        let genesis = BlockInfo {
            number: 0,
            hash: genesis_block.hash(),
            parent_hash: Hash::ZERO,
            timestamp: 0,
            tx_count: 0,
            success_count: 0,
        };
        info!(hash = %genesis.hash, predictor = %config.predictor, game = %config.game, "genesis");

        Ok(Self {
            executor,
            latest_block: genesis.clone(),
            blocks: vec![genesis],
            receipts: B256HashMap::default(),
            events: EventLog::new(),
            mempool: Mempool::new(config.mempool_size),
            max_tx_per_block: config.max_tx_per_block,
        })
    }

    /// Queue a transaction for the next block
    pub fn submit(&mut self, tx: Transaction) -> Result<Hash, ChainError> {
        let hash = tx.hash();
        if self.receipts.contains_key(&hash) || self.mempool.contains(&hash) {
            warn!(tx = %hash, "duplicate transaction, dropping");
            return Err(ChainError::AlreadyKnown(hash));
        }
        if !self.mempool.add(tx) {
            warn!(tx = %hash, "mempool full, dropping transaction");
            return Err(ChainError::MempoolFull);
        }
        Ok(hash)
    }

    /// Nonce for the next transaction from `sender`, counting pending ones
    pub fn next_nonce(&self, sender: &Address) -> u64 {
        self.executor.ledger().nonce(sender) + self.mempool.pending_from(sender) as u64
    }

    /// Context the next block will execute under
    pub const fn pending_context(&self) -> BlockContext {
        BlockContext {
            number: self.latest_block.number + 1,
            parent_hash: self.latest_block.hash,
            timestamp: self.latest_block.timestamp,
        }
    }

    /// Whether a transaction submitted now would miss the next block
    pub fn next_block_full(&self) -> bool {
        self.mempool.len() >= self.max_tx_per_block
    }

    /// Counter expected once pending plays have settled
    pub fn pending_counter(&self) -> U256 {
        self.sequence_counter() + U256::from(self.mempool.pending_plays())
    }

    /// Predictor's view of the next block, ignoring pending transactions
    pub fn preview(&self) -> PredictedOutcome {
        self.executor.predictor().preview(&self.pending_context(), self.executor.game())
    }

    /// Execute the pending transactions as the next block
    pub fn produce_block(&mut self, timestamp: u64) -> &BlockInfo {
        let txs = self.mempool.take(self.max_tx_per_block);
        let mut block = Block::new(self.latest_block.number + 1, self.latest_block.hash, timestamp);
        for tx in txs {
            block.add_transaction(tx);
        }

        let result = self.executor.execute_block(&block);
        self.events.extend(result.committed_logs().cloned());

        let block_info = BlockInfo {
            number: block.number,
            hash: result.block_hash,
            parent_hash: block.parent_hash,
            timestamp,
            tx_count: block.tx_count(),
            success_count: result.success_count,
        };
        for receipt in result.receipts {
            // keep the first receipt per hash
            self.receipts.entry(receipt.tx_hash).or_insert(receipt);
        }

        if block_info.tx_count > 0 {
            info!(
                "Block {} produced: txs={}/{}, pending={}, counter={}",
                block_info.number,
                block_info.success_count,
                block_info.tx_count,
                self.mempool.len(),
                self.sequence_counter(),
            );
        }

        self.latest_block = block_info.clone();
        self.blocks.push(block_info);
        &self.latest_block
    }

    /// Latest block
    pub const fn latest_block(&self) -> &BlockInfo {
        &self.latest_block
    }

    /// Block by number
    pub fn block(&self, number: u64) -> Option<&BlockInfo> {
        self.blocks.get(usize::try_from(number).ok()?)
    }

    /// Receipt by transaction hash
    pub fn receipt(&self, tx_hash: &Hash) -> Option<&Receipt> {
        self.receipts.get(tx_hash)
    }

    /// Committed events
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Balance of any account
    pub fn balance(&self, address: &Address) -> Amount {
        self.executor.ledger().balance(address)
    }

    /// Game counter as of the latest block
    pub fn sequence_counter(&self) -> U256 {
        self.executor.game().sequence_counter()
    }

    /// Executor, for read access to the contracts
    pub const fn executor(&self) -> &Executor<DiceContract> {
        &self.executor
    }

    /// Open or close the game, as its operator would
    pub fn set_game_open(&mut self, open: bool) {
        let game = self.executor.game_mut();
        if open {
            game.reopen();
        } else {
            game.close();
        }
        info!(open, "game availability changed");
    }

    /// Mempool counters
    pub fn mempool_stats(&self) -> MempoolStats {
        self.mempool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcheck_core::{Event, TxKind, STAKE_REQUIREMENT};

    fn chain() -> (Config, Chain) {
        let config = Config::default();
        let chain = Chain::genesis(&config, []).unwrap();
        (config, chain)
    }

    #[test]
    fn test_blocks_chain_parent_hashes() {
        let (_, mut chain) = chain();
        let genesis_hash = chain.latest_block().hash;

        let first = chain.produce_block(1).clone();
        let second = chain.produce_block(2).clone();

        assert_eq!(first.parent_hash, genesis_hash);
        assert_eq!(second.parent_hash, first.hash);
        assert_ne!(first.hash, second.hash);
        assert_eq!(chain.block(2).map(|b| b.hash), Some(second.hash));
        assert_eq!(chain.pending_context().parent_hash, second.hash);
    }

    #[test]
    fn test_preview_is_what_the_block_sees() {
        let (config, mut chain) = chain();
        let expected = chain.preview();

        let nonce = chain.next_nonce(&config.owner);
        let tx = Transaction::new(config.owner, nonce, TxKind::AttemptRiggedPlay);
        let hash = chain.submit(tx).unwrap();
        chain.produce_block(1);

        let receipt = chain.receipt(&hash).unwrap();
        assert_eq!(receipt.predicted_roll(), Some(expected.roll));
        assert_eq!(receipt.is_success(), expected.is_win());
    }

    #[test]
    fn test_failed_transactions_do_not_reach_event_log() {
        let (config, mut chain) = chain();
        // a withdrawal beyond custody always reverts
        let amount = config.initial_funding + U256::from(1u64);
        let withdraw = TxKind::Withdraw { destination: config.owner, amount };
        let bad = Transaction::new(config.owner, 0, withdraw);
        let good = Transaction::new(config.owner, 1, TxKind::Fund { amount: STAKE_REQUIREMENT });
        assert_eq!(chain.next_nonce(&config.owner), 0);
        chain.submit(bad).unwrap();
        chain.submit(good).unwrap();
        assert_eq!(chain.next_nonce(&config.owner), 2);

        let info = chain.produce_block(1).clone();
        assert_eq!(info.tx_count, 2);
        assert_eq!(info.success_count, 1);

        let events: Vec<_> = chain.events().entries().iter().map(|e| e.event.clone()).collect();
        assert_eq!(
            events,
            vec![Event::FundsReceived { from: config.owner, amount: STAKE_REQUIREMENT }]
        );
        assert_eq!(chain.balance(&config.predictor), config.initial_funding + STAKE_REQUIREMENT);
    }

    #[test]
    fn test_duplicate_submission_keeps_receipt() {
        let (config, mut chain) = chain();
        let tx = Transaction::new(config.owner, 0, TxKind::Fund { amount: STAKE_REQUIREMENT });
        let hash = chain.submit(tx.clone()).unwrap();
        assert!(matches!(chain.submit(tx.clone()), Err(ChainError::AlreadyKnown(h)) if h == hash));

        let info = chain.produce_block(1).clone();
        assert_eq!(info.tx_count, 1);
        assert!(chain.receipt(&hash).unwrap().is_success());
        assert_eq!(
            chain.balance(&config.predictor),
            config.initial_funding + STAKE_REQUIREMENT
        );

        // included transactions stay known
        assert!(matches!(chain.submit(tx), Err(ChainError::AlreadyKnown(_))));
        chain.produce_block(2);
        assert!(chain.receipt(&hash).unwrap().is_success());
    }

    #[test]
    fn test_next_block_full() {
        let config = Config { max_tx_per_block: 2, ..Config::default() };
        let mut chain = Chain::genesis(&config, []).unwrap();
        for nonce in 0..3 {
            assert_eq!(chain.next_block_full(), nonce >= 2);
            let fund = TxKind::Fund { amount: U256::from(1u64) };
            let tx = Transaction::new(config.owner, nonce, fund);
            chain.submit(tx).unwrap();
        }
        assert!(chain.next_block_full());

        assert_eq!(chain.produce_block(1).tx_count, 2);
        assert!(!chain.next_block_full());
    }

    #[test]
    fn test_closed_game() {
        let (config, mut chain) = chain();
        chain.set_game_open(false);
        // find a block where the predictor would win
        let mut hash = None;
        for ts in 0..256 {
            if chain.preview().is_win() {
                let nonce = chain.next_nonce(&config.owner);
                let tx = Transaction::new(config.owner, nonce, TxKind::AttemptRiggedPlay);
                hash = Some(chain.submit(tx).unwrap());
                chain.produce_block(ts);
                break;
            }
            chain.produce_block(ts);
        }

        let receipt = chain.receipt(&hash.unwrap()).unwrap();
        assert!(!receipt.is_success());
        assert_eq!(chain.balance(&config.predictor), config.initial_funding);
    }
}
