//! Block structure

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::tx::Transaction;
use crate::types::{BlockNumber, Hash};

/// Block structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// Block number
    pub number: BlockNumber,
    /// Parent block hash
    pub parent_hash: Hash,
    /// Timestamp
    pub timestamp: u64,
    /// Transactions in this block, in execution order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a new block
    pub const fn new(number: BlockNumber, parent_hash: Hash, timestamp: u64) -> Self {
        Self { number, parent_hash, timestamp, transactions: Vec::new() }
    }

    /// Add a transaction
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Compute block hash
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(&self.number.to_be_bytes());
        hasher.update(self.parent_hash.as_slice());
        hasher.update(&self.timestamp.to_be_bytes());

        for tx in &self.transactions {
            hasher.update(tx.hash().as_slice());
        }

        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        Hash::from(output)
    }

    /// Block metadata visible to calls executed in this block
    pub const fn context(&self) -> BlockContext {
        BlockContext {
            number: self.number,
            parent_hash: self.parent_hash,
            timestamp: self.timestamp,
        }
    }

    /// Get transaction count
    pub fn tx_count(&self) -> u32 {
        self.transactions.len() as u32
    }
}

/// Block metadata a call can read.
///
/// `parent_hash` is what a contract sees as the previous block's hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Number of the block being executed
    pub number: BlockNumber,
    /// Hash of the previous block
    pub parent_hash: Hash,
    /// Timestamp of the block being executed
    pub timestamp: u64,
}
