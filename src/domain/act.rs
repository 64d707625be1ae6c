use crate::domain::money::Amount;
use crate::domain::{ActId, ContractId, PaymentId, Version};
use crate::error::{Result, SettlementError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The linking of a specific executed payment amount to an act.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Allocation {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// A billing document with a gross amount and an append-only list of
/// allocations.
///
/// The act itself is created and edited by external contract management; this
/// core only appends allocations, keeping `sum(allocations) <= amount_gross`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Act {
    pub id: ActId,
    pub contract_id: ContractId,
    pub amount_gross: Decimal,
    pub allocations: Vec<Allocation>,
    pub version: Version,
}

impl Act {
    pub fn new(id: ActId, contract_id: ContractId, amount_gross: Amount) -> Self {
        Self {
            id,
            contract_id,
            amount_gross: amount_gross.value(),
            allocations: Vec::new(),
            version: 0,
        }
    }

    pub fn allocated_amount(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// Derived: `amount_gross - sum(allocations)`, always in
    /// `[0, amount_gross]`.
    pub fn unpaid_amount(&self) -> Decimal {
        self.amount_gross - self.allocated_amount()
    }

    /// Appends an allocation, rejecting any that would drive the allocated
    /// sum past the gross amount.
    pub fn allocate(
        &mut self,
        payment_id: PaymentId,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<Allocation> {
        let unpaid = self.unpaid_amount();
        if amount.value() > unpaid {
            return Err(SettlementError::OverAllocation {
                act: self.id,
                unpaid,
                requested: amount.value(),
            });
        }
        let allocation = Allocation {
            payment_id,
            amount: amount.value(),
            date,
        };
        self.allocations.push(allocation.clone());
        Ok(allocation)
    }
}
