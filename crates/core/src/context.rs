//! Call context handed to contracts

use crate::block::BlockContext;
use crate::events::{Event, LogEntry};
use crate::ledger::Ledger;
use crate::types::{Address, Amount, Hash};

/// Everything a contract call can see and touch.
///
/// Writes go straight to the executor's working ledger; the executor restores
/// its snapshot if the transaction fails.
#[derive(Debug)]
pub struct CallContext<'a> {
    block: BlockContext,
    tx_hash: Hash,
    ledger: &'a mut Ledger,
    logs: &'a mut Vec<LogEntry>,
}

impl<'a> CallContext<'a> {
    /// Create a context for one transaction
    pub fn new(
        block: BlockContext,
        tx_hash: Hash,
        ledger: &'a mut Ledger,
        logs: &'a mut Vec<LogEntry>,
    ) -> Self {
        Self { block, tx_hash, ledger, logs }
    }

    /// Block being executed
    pub const fn block(&self) -> &BlockContext {
        &self.block
    }

    /// Balance of any account
    pub fn balance(&self, address: &Address) -> Amount {
        self.ledger.balance(address)
    }

    /// Mutable ledger access
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        self.ledger
    }

    /// Record an event
    pub fn emit(&mut self, emitter: Address, event: Event) {
        self.logs.push(LogEntry {
            block_number: self.block.number,
            tx_hash: self.tx_hash,
            emitter,
            event,
        });
    }
}
