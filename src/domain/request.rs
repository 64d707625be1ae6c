use crate::domain::money::Amount;
use crate::domain::{AccountId, ActId, CategoryId, ContractId, PaymentId, RequestId, Version};
use crate::error::{Result, SettlementError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a [`PaymentRequest`].
///
/// `Paid` and `Cancelled` are terminal: no event is accepted from them.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Planned,
    Approved,
    Paid,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum RequestEvent {
    Approve,
    Pay,
    Cancel,
}

impl RequestStatus {
    /// The transition table. Everything not listed here fails with
    /// `InvalidTransition`; this guard is the only defense against paying a
    /// request twice, which is why it runs inside the same commit as the
    /// ledger debit.
    pub fn allowed_events(self) -> &'static [RequestEvent] {
        match self {
            RequestStatus::Planned => &[RequestEvent::Approve, RequestEvent::Cancel],
            RequestStatus::Approved => &[RequestEvent::Pay, RequestEvent::Cancel],
            RequestStatus::Paid | RequestStatus::Cancelled => &[],
        }
    }

    pub fn allows(self, event: RequestEvent) -> bool {
        self.allowed_events().contains(&event)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_events().is_empty()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Planned => "planned",
            RequestStatus::Approved => "approved",
            RequestStatus::Paid => "paid",
            RequestStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl fmt::Display for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestEvent::Approve => "approve",
            RequestEvent::Pay => "pay",
            RequestEvent::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Input for creating a payment request. The id, status, and timestamps are
/// assigned by the workflow.
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub category_id: CategoryId,
    pub amount: Amount,
    pub planned_date: NaiveDate,
    pub contract_id: Option<ContractId>,
    pub act_id: Option<ActId>,
    /// Preferred account; a concrete account is still chosen at pay time.
    pub account_id: Option<AccountId>,
    pub comment: Option<String>,
    pub created_by: String,
}

/// A proposed expenditure moving through approval before execution.
///
/// Mutated only through the transition methods below; never deleted. The
/// invariants `payment_id.is_some() == (status == Paid)` and
/// `cancel_reason.is_some() => status == Cancelled` hold by construction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    pub id: RequestId,
    pub category_id: CategoryId,
    pub contract_id: Option<ContractId>,
    pub act_id: Option<ActId>,
    pub account_id: Option<AccountId>,
    pub planned_date: NaiveDate,
    pub amount: Amount,
    pub comment: Option<String>,
    pub status: RequestStatus,
    pub payment_id: Option<PaymentId>,
    pub cancel_reason: Option<String>,
    pub version: Version,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn create(id: RequestId, new: NewPaymentRequest, now: DateTime<Utc>) -> Result<Self> {
        if new.act_id.is_some() && new.contract_id.is_none() {
            return Err(SettlementError::Validation(
                "an act reference requires a contract reference".to_string(),
            ));
        }
        Ok(Self {
            id,
            category_id: new.category_id,
            contract_id: new.contract_id,
            act_id: new.act_id,
            account_id: new.account_id,
            planned_date: new.planned_date,
            amount: new.amount,
            comment: new.comment,
            status: RequestStatus::Planned,
            payment_id: None,
            cancel_reason: None,
            version: 0,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fails with `InvalidTransition` unless the current status accepts
    /// `event`, leaving the request untouched.
    pub fn ensure_allows(&self, event: RequestEvent) -> Result<()> {
        if self.status.allows(event) {
            Ok(())
        } else {
            Err(SettlementError::InvalidTransition {
                status: self.status,
                event,
                allowed: self.status.allowed_events(),
            })
        }
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_allows(RequestEvent::Approve)?;
        self.status = RequestStatus::Approved;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.ensure_allows(RequestEvent::Cancel)?;
        self.status = RequestStatus::Cancelled;
        self.cancel_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Final step of the pay transition. The caller is responsible for
    /// committing this together with the payment insert and the ledger debit.
    pub fn mark_paid(&mut self, payment_id: PaymentId, now: DateTime<Utc>) -> Result<()> {
        self.ensure_allows(RequestEvent::Pay)?;
        self.status = RequestStatus::Paid;
        self.payment_id = Some(payment_id);
        self.updated_at = now;
        Ok(())
    }
}
