//! Pending transaction pool

use std::collections::VecDeque;

use rollcheck_core::{Address, Hash, Transaction, TxKind};
use serde::Serialize;

/// Mempool statistics
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MempoolStats {
    /// Transactions waiting
    pub pending: usize,
    /// Transactions accepted so far
    pub total_received: u64,
    /// Transactions handed to blocks so far
    pub total_included: u64,
    /// Capacity
    pub max_size: usize,
}

/// FIFO of pending transactions
#[derive(Clone, Debug)]
pub struct Mempool {
    pending: VecDeque<Transaction>,
    max_size: usize,
    total_received: u64,
    total_included: u64,
}

impl Mempool {
    /// Create a pool holding at most `max_size` transactions
    pub const fn new(max_size: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            max_size,
            total_received: 0,
            total_included: 0,
        }
    }

    /// Queue a transaction; `false` if the pool is full
    pub fn add(&mut self, tx: Transaction) -> bool {
        if self.pending.len() >= self.max_size {
            return false;
        }
        self.pending.push_back(tx);
        self.total_received += 1;
        true
    }

    /// Take up to `count` transactions in arrival order
    pub fn take(&mut self, count: usize) -> Vec<Transaction> {
        let count = count.min(self.pending.len());
        let txs: Vec<_> = self.pending.drain(..count).collect();
        self.total_included += txs.len() as u64;
        txs
    }

    /// Whether a transaction with this hash is waiting
    pub fn contains(&self, tx_hash: &Hash) -> bool {
        self.pending.iter().any(|tx| &tx.hash() == tx_hash)
    }

    /// Pending transactions sent by `sender`
    pub fn pending_from(&self, sender: &Address) -> usize {
        self.pending.iter().filter(|tx| &tx.from == sender).count()
    }

    /// Pending direct plays, each of which advances the counter if it settles
    pub fn pending_plays(&self) -> usize {
        self.pending.iter().filter(|tx| matches!(tx.kind, TxKind::Play { .. })).count()
    }

    /// Number of pending transactions
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            pending: self.pending.len(),
            total_received: self.total_received,
            total_included: self.total_included,
            max_size: self.max_size,
        }
    }
}
