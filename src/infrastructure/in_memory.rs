use crate::domain::account::Account;
use crate::domain::act::Act;
use crate::domain::payment::Payment;
use crate::domain::ports::{Changeset, SettlementStore};
use crate::domain::request::PaymentRequest;
use crate::domain::{AccountId, ActId, PaymentId, RequestId};
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    requests: HashMap<RequestId, PaymentRequest>,
    accounts: HashMap<AccountId, Account>,
    acts: HashMap<ActId, Act>,
    payments: HashMap<PaymentId, Payment>,
    next_request_id: RequestId,
    next_payment_id: PaymentId,
}

/// A thread-safe in-memory settlement store.
///
/// All tables live behind one `Arc<RwLock<State>>`: reads take the read lock
/// (a consistent snapshot), and `commit` takes the write lock once, checks
/// every version guard, and applies all writes before releasing it. Ideal for
/// tests and single-process use.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn request(&self, id: RequestId) -> Result<Option<PaymentRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.get(&id).cloned())
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn act(&self, id: ActId) -> Result<Option<Act>> {
        let state = self.state.read().await;
        Ok(state.acts.get(&id).cloned())
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state.payments.get(&id).cloned())
    }

    async fn requests(&self) -> Result<Vec<PaymentRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.values().cloned().collect())
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn insert_request(&self, request: PaymentRequest) -> Result<()> {
        let mut state = self.state.write().await;
        if state.requests.contains_key(&request.id) {
            return Err(SettlementError::Validation(format!(
                "payment request {} already exists",
                request.id
            )));
        }
        state.next_request_id = state.next_request_id.max(request.id + 1);
        state.requests.insert(request.id, request);
        Ok(())
    }

    async fn insert_account(&self, account: Account) -> Result<()> {
        let mut state = self.state.write().await;
        if state.accounts.contains_key(&account.id) {
            return Err(SettlementError::Validation(format!(
                "account {} already exists",
                account.id
            )));
        }
        state.accounts.insert(account.id, account);
        Ok(())
    }

    async fn insert_act(&self, act: Act) -> Result<()> {
        let mut state = self.state.write().await;
        if state.acts.contains_key(&act.id) {
            return Err(SettlementError::Validation(format!(
                "act {} already exists",
                act.id
            )));
        }
        state.acts.insert(act.id, act);
        Ok(())
    }

    async fn next_request_id(&self) -> Result<RequestId> {
        let mut state = self.state.write().await;
        state.next_request_id = state.next_request_id.max(1);
        let id = state.next_request_id;
        state.next_request_id += 1;
        Ok(id)
    }

    async fn next_payment_id(&self) -> Result<PaymentId> {
        let mut state = self.state.write().await;
        state.next_payment_id = state.next_payment_id.max(1);
        let id = state.next_payment_id;
        state.next_payment_id += 1;
        Ok(id)
    }

    async fn commit(&self, changeset: Changeset) -> Result<()> {
        let mut state = self.state.write().await;

        // Verify every guard before touching anything.
        for write in &changeset.requests {
            let current = state.requests.get(&write.row.id).map(|r| r.version);
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "payment request",
                    id: write.row.id,
                });
            }
        }
        for write in &changeset.accounts {
            let current = state.accounts.get(&write.row.id).map(|a| a.version);
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "account",
                    id: write.row.id,
                });
            }
        }
        for write in &changeset.acts {
            let current = state.acts.get(&write.row.id).map(|a| a.version);
            if current != Some(write.expected) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "act",
                    id: write.row.id,
                });
            }
        }
        for payment in &changeset.payments {
            if state.payments.contains_key(&payment.id) {
                return Err(SettlementError::ConcurrentModification {
                    entity: "payment",
                    id: payment.id,
                });
            }
        }

        for write in changeset.requests {
            state.requests.insert(write.row.id, write.row);
        }
        for write in changeset.accounts {
            state.accounts.insert(write.row.id, write.row);
        }
        for write in changeset.acts {
            state.acts.insert(write.row.id, write.row);
        }
        for payment in changeset.payments {
            state.payments.insert(payment.id, payment);
        }
        Ok(())
    }
}
