use crate::domain::money::{Amount, Balance};
use crate::domain::{AccountId, Version};
use crate::error::SettlementError;
use serde::{Deserialize, Serialize};

/// A cash position with a single current balance.
///
/// Accounts are pre-existing reference entities; the balance is mutated only
/// through [`debit`](Account::debit) / [`credit`](Account::credit) staged into
/// a version-guarded commit. The balance is never allowed to go negative.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub currency: String,
    pub balance: Balance,
    pub version: Version,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, currency: impl Into<String>, opening: Balance) -> Self {
        Self {
            id,
            name: name.into(),
            currency: currency.into(),
            balance: opening,
            version: 0,
        }
    }

    /// Removes funds, rejecting any debit that would cross zero.
    pub fn debit(&mut self, amount: Amount) -> Result<(), SettlementError> {
        if self.balance >= amount.into() {
            self.balance -= amount.into();
            Ok(())
        } else {
            Err(SettlementError::InsufficientFunds {
                account: self.id,
                balance: self.balance.value(),
                requested: amount.value(),
            })
        }
    }

    /// Adds funds. Used only for reversals; the modeled workflow never
    /// credits.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }
}
