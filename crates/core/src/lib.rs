//! rollcheck core logic
//!
//! Recomputes a dice game's block-hash roll and commits a stake only on a
//! predicted win. This crate holds everything that runs inside a transaction:
//! - The roll formula and the predictor contract
//! - The reference dice game the predictor plays against
//! - The ledger, event log and the atomic executor around them

pub mod types;
pub mod roll;
pub mod block;
pub mod tx;
pub mod ledger;
pub mod events;
pub mod context;
pub mod game;
pub mod predictor;
pub mod executor;
pub mod error;

pub use types::*;
pub use roll::PredictedOutcome;
pub use block::{Block, BlockContext};
pub use tx::{Transaction, TxKind};
pub use ledger::{AccountState, Ledger};
pub use events::{Event, EventLog, LogEntry};
pub use context::CallContext;
pub use game::{DiceContract, DiceGame};
pub use predictor::RollPredictor;
pub use executor::{ExecutionResult, Executor, Receipt};
pub use error::{GameError, LedgerError, PredictorError, SetupError, TxError};
