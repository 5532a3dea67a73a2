//! Transaction structure

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::types::{Address, Amount, Hash};

/// What a transaction asks the executor to do
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TxKind {
    /// Plain value transfer between accounts
    Transfer {
        /// Receiver
        to: Address,
        /// Value in wei
        amount: Amount,
    },
    /// Send value to the predictor
    Fund {
        /// Value in wei
        amount: Amount,
    },
    /// Ask the predictor to play if the roll is predicted to win
    AttemptRiggedPlay,
    /// Owner-only withdrawal from the predictor's custody
    Withdraw {
        /// Receiver of the funds
        destination: Address,
        /// Value in wei
        amount: Amount,
    },
    /// Play the game directly, as any other player would
    Play {
        /// Value sent along with the play
        stake: Amount,
    },
}

impl TxKind {
    const fn type_byte(&self) -> u8 {
        match self {
            Self::Transfer { .. } => 0,
            Self::Fund { .. } => 1,
            Self::AttemptRiggedPlay => 2,
            Self::Withdraw { .. } => 3,
            Self::Play { .. } => 4,
        }
    }

    /// Short name used in logs and RPC output
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Fund { .. } => "fund",
            Self::AttemptRiggedPlay => "attemptRiggedPlay",
            Self::Withdraw { .. } => "withdraw",
            Self::Play { .. } => "play",
        }
    }
}

/// Transaction structure
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Sender address
    pub from: Address,
    /// Sender's nonce
    pub nonce: u64,
    /// Requested action
    pub kind: TxKind,
}

impl Transaction {
    /// Create a new transaction
    pub const fn new(from: Address, nonce: u64, kind: TxKind) -> Self {
        Self { from, nonce, kind }
    }

    /// Compute transaction hash
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(&[self.kind.type_byte()]);
        hasher.update(self.from.as_slice());
        hasher.update(&self.nonce.to_be_bytes());

        match &self.kind {
            TxKind::Transfer { to, amount } => {
                hasher.update(to.as_slice());
                hasher.update(&amount.to_be_bytes::<32>());
            }
            TxKind::Fund { amount } => hasher.update(&amount.to_be_bytes::<32>()),
            TxKind::AttemptRiggedPlay => {}
            TxKind::Withdraw { destination, amount } => {
                hasher.update(destination.as_slice());
                hasher.update(&amount.to_be_bytes::<32>());
            }
            TxKind::Play { stake } => hasher.update(&stake.to_be_bytes::<32>()),
        }

        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        Hash::from(output)
    }
}
