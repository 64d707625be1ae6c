use crate::domain::money::Amount;
use crate::domain::{AccountId, ActId, PaymentId, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable record of money having moved.
///
/// Created exactly once, inside the pay transition, in the same commit as the
/// account debit. Never modified or deleted afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub request_id: RequestId,
    pub account_id: AccountId,
    /// Equal to the request's amount at execution time.
    pub amount: Amount,
    pub executed_at: DateTime<Utc>,
    pub act_id: Option<ActId>,
}

impl Payment {
    pub fn new(
        id: PaymentId,
        request_id: RequestId,
        account_id: AccountId,
        amount: Amount,
        executed_at: DateTime<Utc>,
        act_id: Option<ActId>,
    ) -> Self {
        Self {
            id,
            request_id,
            account_id,
            amount,
            executed_at,
            act_id,
        }
    }
}
