use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{Changeset, SettlementStore, SettlementStoreArc};
use crate::domain::{AccountId, Version};
use crate::error::{Result, SettlementError};

/// Result of a committed-or-staged balance mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceUpdate {
    pub new_balance: Balance,
    pub new_version: Version,
}

/// Serializes balance mutations for an account via version-guarded writes.
///
/// The ledger stages its writes into the caller's [`Changeset`] so that a
/// debit commits atomically with whatever else the caller stages (the payment
/// record, the request status). It never retries internally: retry policy
/// belongs to the caller, because blind retries on financial mutations are
/// unsafe.
#[derive(Clone)]
pub struct AccountLedger {
    store: SettlementStoreArc,
}

impl AccountLedger {
    pub fn new(store: SettlementStoreArc) -> Self {
        Self { store }
    }

    /// Snapshot read of an account's balance and version.
    pub async fn balance(&self, account_id: AccountId) -> Result<(Balance, Version)> {
        let account = self.fetch(account_id).await?;
        Ok((account.balance, account.version))
    }

    /// Stages a debit of `amount` against the account.
    ///
    /// Fails with `ConcurrentModification` when the account's current version
    /// differs from `expected_version`, and with `InsufficientFunds` when the
    /// debit would cross zero. On success the staged write carries the bumped
    /// version; commit re-checks the guard.
    pub async fn debit(
        &self,
        changeset: &mut Changeset,
        account_id: AccountId,
        amount: Amount,
        expected_version: Version,
    ) -> Result<BalanceUpdate> {
        let mut account = self.fetch(account_id).await?;
        if account.version != expected_version {
            return Err(SettlementError::ConcurrentModification {
                entity: "account",
                id: account_id,
            });
        }
        account.debit(amount)?;
        let update = BalanceUpdate {
            new_balance: account.balance,
            new_version: account.version + 1,
        };
        changeset.update_account(&mut account);
        Ok(update)
    }

    /// Symmetric to [`debit`](AccountLedger::debit). Reserved for reversals;
    /// the modeled workflow never credits.
    pub async fn credit(
        &self,
        changeset: &mut Changeset,
        account_id: AccountId,
        amount: Amount,
        expected_version: Version,
    ) -> Result<BalanceUpdate> {
        let mut account = self.fetch(account_id).await?;
        if account.version != expected_version {
            return Err(SettlementError::ConcurrentModification {
                entity: "account",
                id: account_id,
            });
        }
        account.credit(amount);
        let update = BalanceUpdate {
            new_balance: account.balance,
            new_version: account.version + 1,
        };
        changeset.update_account(&mut account);
        Ok(update)
    }

    async fn fetch(&self, account_id: AccountId) -> Result<crate::domain::account::Account> {
        self.store
            .account(account_id)
            .await?
            .ok_or(SettlementError::NotFound {
                entity: "account",
                id: account_id,
            })
    }
}
