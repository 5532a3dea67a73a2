//! Host-side runtime for rollcheck
//!
//! Runs the core executor as a small chain with a mempool, rival players and
//! an operator that decides when to submit attempts.

pub mod config;
pub mod mempool;
pub mod chain;
pub mod rivals;
pub mod strategy;
pub mod session;

pub use config::Config;
pub use mempool::{Mempool, MempoolStats};
pub use chain::{BlockInfo, Chain, ChainError};
pub use rivals::Rivals;
pub use strategy::{Operator, OperatorStats, Strategy};
pub use session::{AttemptReport, Session, SessionSummary, StepReport};
