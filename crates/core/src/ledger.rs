//! Custody ledger

use alloy_primitives::map::{AddressHashMap, AddressHashSet};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{Address, Amount, U256};

/// Account state
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountState {
    /// Balance in wei
    pub balance: Amount,
    /// Number of transactions sent
    pub nonce: u64,
}

/// Balances and nonces for every account
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: AddressHashMap<AccountState>,
    /// Contract accounts without a receive hook
    rejecting: AddressHashSet,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Get balance
    pub fn balance(&self, address: &Address) -> Amount {
        self.accounts.get(address).map(|a| a.balance).unwrap_or(U256::ZERO)
    }

    /// Get nonce
    pub fn nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).map(|a| a.nonce).unwrap_or_default()
    }

    /// Increment nonce
    pub fn increment_nonce(&mut self, address: &Address) {
        self.accounts.entry(*address).or_default().nonce += 1;
    }

    /// Set balance directly, used for genesis allocation
    pub fn set_balance(&mut self, address: Address, balance: Amount) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Mark an account as refusing plain value transfers
    pub fn reject_transfers(&mut self, address: Address) {
        self.rejecting.insert(address);
    }

    /// Add value to an account
    pub fn credit(&mut self, address: Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.accounts.entry(address).or_default();
        account.balance =
            account.balance.checked_add(amount).ok_or(LedgerError::Overflow(address))?;
        Ok(())
    }

    /// Remove value from an account
    pub fn debit(&mut self, address: Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(&address);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: address,
                required: amount,
                available,
            });
        }
        self.accounts.entry(address).or_default().balance = available - amount;
        Ok(())
    }

    /// Plain value transfer; refused by accounts marked as rejecting
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if self.rejecting.contains(&to) {
            return Err(LedgerError::TransferRejected(to));
        }
        self.move_value(from, to, amount)
    }

    /// Value transfer attached to a contract call; the callee accepts it
    pub fn move_value(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}
