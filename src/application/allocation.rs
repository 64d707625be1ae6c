use crate::domain::act::Allocation;
use crate::domain::money::Amount;
use crate::domain::ports::{Changeset, SettlementStore, SettlementStoreArc};
use crate::domain::{ActId, PaymentId};
use crate::error::{Result, SettlementError};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Attaches executed payments to acts and keeps each act's unpaid balance
/// correct.
///
/// The over-allocation check and the appended allocation are staged into the
/// caller's [`Changeset`] under the act's version guard, so two concurrent
/// allocations can never both pass a stale unpaid-amount check: the loser
/// fails at commit time.
#[derive(Clone)]
pub struct ActAllocationTracker {
    store: SettlementStoreArc,
}

impl ActAllocationTracker {
    pub fn new(store: SettlementStoreArc) -> Self {
        Self { store }
    }

    /// Derived read: `amount_gross - sum(allocations)`.
    pub async fn unpaid_amount(&self, act_id: ActId) -> Result<Decimal> {
        let act = self.fetch(act_id).await?;
        Ok(act.unpaid_amount())
    }

    /// Stages an allocation of `amount` from `payment_id` against the act.
    ///
    /// Fails with `OverAllocation` when the allocation would drive the
    /// allocated sum past the gross amount. Allocations are append-only;
    /// reversing a payment would need a separate explicit unallocate, which
    /// this core does not offer.
    pub async fn allocate(
        &self,
        changeset: &mut Changeset,
        act_id: ActId,
        payment_id: PaymentId,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<Allocation> {
        let mut act = self.fetch(act_id).await?;
        let allocation = act.allocate(payment_id, amount, date)?;
        changeset.update_act(&mut act);
        Ok(allocation)
    }

    async fn fetch(&self, act_id: ActId) -> Result<crate::domain::act::Act> {
        self.store.act(act_id).await?.ok_or(SettlementError::NotFound {
            entity: "act",
            id: act_id,
        })
    }
}
