//! Event log

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, BlockNumber, Hash};

/// Observable events
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// Predictor recomputed the roll
    RollPredicted {
        /// Recomputed roll
        roll: u8,
    },
    /// Predictor's play went through
    PlaySucceeded,
    /// Owner withdrew from custody
    Withdrawal {
        /// Value withdrawn
        amount: Amount,
    },
    /// Predictor received value
    FundsReceived {
        /// Sender
        from: Address,
        /// Value received
        amount: Amount,
    },
    /// The game settled a play
    Rolled {
        /// Player
        player: Address,
        /// Roll the game computed
        roll: u8,
        /// Whether the player won
        won: bool,
    },
}

/// Event with its origin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Block the emitting call ran in
    pub block_number: BlockNumber,
    /// Transaction the emitting call ran in
    pub tx_hash: Hash,
    /// Contract that emitted the event
    pub emitter: Address,
    /// The event
    pub event: Event,
}

/// Append-only log of committed events
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    /// Create an empty log
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append committed entries
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        self.entries.extend(entries);
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries emitted by one contract
    pub fn by_emitter<'a>(
        &'a self,
        emitter: &'a Address,
    ) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| &e.emitter == emitter)
    }

    /// Entries from `block_number` onwards
    pub fn since(&self, block_number: BlockNumber) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter().filter(move |e| e.block_number >= block_number)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
