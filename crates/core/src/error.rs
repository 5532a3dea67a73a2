//! Error types

use thiserror::Error;

use crate::types::{Address, Amount};

/// Ledger failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Sender cannot cover the amount
    #[error("insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        /// Debited account
        account: Address,
        /// Amount requested
        required: Amount,
        /// Balance held
        available: Amount,
    },
    /// Receiver does not accept plain value transfers
    #[error("account {0} rejects value transfers")]
    TransferRejected(Address),
    /// Receiver balance would overflow
    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// Failures signalled by the dice game's `play`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Value sent is not the exact stake
    #[error("stake mismatch: expected {expected}, got {actual}")]
    StakeMismatch {
        /// Stake the game requires
        expected: Amount,
        /// Value that was sent
        actual: Amount,
    },
    /// The game has been closed by its operator
    #[error("game is closed")]
    Closed,
    /// Moving the stake failed
    #[error("stake transfer failed: {0}")]
    Transfer(#[from] LedgerError),
}

/// Predictor failures, one per condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictorError {
    /// Custody balance is below the stake
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Stake requirement
        required: Amount,
        /// Custody balance
        available: Amount,
    },
    /// The recomputed roll loses, nothing was committed
    #[error("predicted loss: roll {roll}")]
    PredictedLoss {
        /// Recomputed roll
        roll: u8,
    },
    /// The game's play failed after a predicted win
    #[error("external call failed: {0}")]
    ExternalCallFailed(#[source] GameError),
    /// Withdrawal exceeds custody balance
    #[error("withdrawal too large: requested {requested}, available {available}")]
    WithdrawalTooLarge {
        /// Amount requested
        requested: Amount,
        /// Custody balance
        available: Amount,
    },
    /// Sending the withdrawn value failed
    #[error("withdrawal transfer failed: {0}")]
    WithdrawalTransferFailed(#[source] LedgerError),
    /// Caller is not the owner
    #[error("unauthorized caller {0}")]
    Unauthorized(Address),
}

/// Transaction-level failures surfaced by the executor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Nonce does not match the sender's account
    #[error("invalid nonce: expected {expected}, got {actual}")]
    InvalidNonce {
        /// Nonce held by the account
        expected: u64,
        /// Nonce carried by the transaction
        actual: u64,
    },
    /// Value transfer failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Direct game play failed
    #[error(transparent)]
    Game(#[from] GameError),
    /// Predictor call failed
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

/// Construction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Predictor is bound to a different game than the one deployed
    #[error("predictor bound to game {bound}, deployed game is {deployed}")]
    GameMismatch {
        /// Game address stored in the predictor
        bound: Address,
        /// Address of the game handed to the executor
        deployed: Address,
    },
}
