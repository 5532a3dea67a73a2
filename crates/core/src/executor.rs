//! Block executor
//!
//! Each transaction runs against a snapshot: if the call fails, the ledger and
//! the game are restored and none of its events reach the committed log. The
//! sender's nonce still advances, since the transaction was included.

use tracing::{debug, warn};

use crate::block::{Block, BlockContext};
use crate::context::CallContext;
use crate::error::{SetupError, TxError};
use crate::events::{Event, LogEntry};
use crate::game::DiceGame;
use crate::ledger::Ledger;
use crate::predictor::RollPredictor;
use crate::tx::{Transaction, TxKind};
use crate::types::Hash;

/// Outcome of one transaction
#[derive(Clone, Debug)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: Hash,
    /// Block the transaction was included in
    pub block_number: u64,
    /// `Ok` if the transaction's effects were committed
    pub status: Result<(), TxError>,
    /// Events emitted during the call, kept even when it was rolled back
    pub logs: Vec<LogEntry>,
}

impl Receipt {
    /// Whether the effects were committed
    pub const fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Roll the predictor computed during this transaction, if any
    pub fn predicted_roll(&self) -> Option<u8> {
        self.logs.iter().find_map(|l| match l.event {
            Event::RollPredicted { roll } => Some(roll),
            _ => None,
        })
    }
}

/// Block execution result
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    /// Hash of the executed block
    pub block_hash: Hash,
    /// One receipt per transaction, in block order
    pub receipts: Vec<Receipt>,
    /// Transactions whose effects were committed
    pub success_count: u32,
}

impl ExecutionResult {
    /// Events from successful transactions only
    pub fn committed_logs(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.receipts.iter().filter(|r| r.is_success()).flat_map(|r| r.logs.iter())
    }
}

/// Executes transactions against the ledger, the game and the predictor
#[derive(Clone, Debug)]
pub struct Executor<G> {
    ledger: Ledger,
    game: G,
    predictor: RollPredictor,
}

impl<G: DiceGame + Clone> Executor<G> {
    /// Create an executor; the predictor must be bound to `game`
    pub fn new(mut ledger: Ledger, game: G, predictor: RollPredictor) -> Result<Self, SetupError> {
        if predictor.game() != game.address() {
            return Err(SetupError::GameMismatch {
                bound: predictor.game(),
                deployed: game.address(),
            });
        }
        // the game has no receive hook
        ledger.reject_transfers(game.address());
        Ok(Self { ledger, game, predictor })
    }

    /// Execute every transaction of a block in order
    pub fn execute_block(&mut self, block: &Block) -> ExecutionResult {
        let ctx = block.context();
        let receipts: Vec<_> =
            block.transactions.iter().map(|tx| self.execute_tx(&ctx, tx)).collect();
        let success_count = receipts.iter().filter(|r| r.is_success()).count() as u32;

        ExecutionResult { block_hash: block.hash(), receipts, success_count }
    }

    /// Execute a single transaction atomically
    pub fn execute_tx(&mut self, block: &BlockContext, tx: &Transaction) -> Receipt {
        let tx_hash = tx.hash();
        let mut logs = Vec::new();

        let expected = self.ledger.nonce(&tx.from);
        if tx.nonce != expected {
            return Receipt {
                tx_hash,
                block_number: block.number,
                status: Err(TxError::InvalidNonce { expected, actual: tx.nonce }),
                logs,
            };
        }

        let ledger_snapshot = self.ledger.clone();
        let game_snapshot = self.game.clone();

        let status = self.dispatch(block, tx_hash, tx, &mut logs);
        if let Err(err) = &status {
            debug!(tx = %tx_hash, kind = tx.kind.name(), error = %err, "transaction reverted");
            self.ledger = ledger_snapshot;
            self.game = game_snapshot;
        }
        self.ledger.increment_nonce(&tx.from);

        Receipt { tx_hash, block_number: block.number, status, logs }
    }

    fn dispatch(
        &mut self,
        block: &BlockContext,
        tx_hash: Hash,
        tx: &Transaction,
        logs: &mut Vec<LogEntry>,
    ) -> Result<(), TxError> {
        let Self { ledger, game, predictor } = self;
        let mut ctx = CallContext::new(*block, tx_hash, ledger, logs);

        match &tx.kind {
            TxKind::Transfer { to, amount } => {
                if *to == predictor.address() {
                    predictor.receive_funds(&mut ctx, tx.from, *amount)?;
                } else {
                    ctx.ledger_mut().transfer(tx.from, *to, *amount)?;
                }
            }
            TxKind::Fund { amount } => predictor.receive_funds(&mut ctx, tx.from, *amount)?,
            TxKind::AttemptRiggedPlay => {
                predictor.attempt_rigged_play(&mut ctx, game)?;
            }
            TxKind::Withdraw { destination, amount } => {
                predictor.withdraw(&mut ctx, tx.from, *destination, *amount)?;
            }
            TxKind::Play { stake } => {
                if tx.from == predictor.address() {
                    warn!("direct play from the predictor account bypasses the roll check");
                }
                game.play(&mut ctx, tx.from, *stake)?;
            }
        }
        Ok(())
    }

    /// Working ledger
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Deployed game
    pub const fn game(&self) -> &G {
        &self.game
    }

    /// Mutable game access for operator actions
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// Deployed predictor
    pub const fn predictor(&self) -> &RollPredictor {
        &self.predictor
    }
}
