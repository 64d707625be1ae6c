use crate::domain::account::Account;
use crate::domain::act::Act;
use crate::domain::payment::Payment;
use crate::domain::request::PaymentRequest;
use crate::domain::{AccountId, ActId, PaymentId, RequestId, Version};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A pending write guarded by the version observed at read time.
#[derive(Debug, Clone)]
pub struct VersionedWrite<T> {
    pub expected: Version,
    pub row: T,
}

/// The unit of work of the settlement core.
///
/// A state-changing operation reads entities, applies effects in memory,
/// stages the results here, and hands the whole set to
/// [`SettlementStore::commit`]. The staging helpers bump each entity's
/// version; commit verifies every expected version and applies all writes or
/// none.
#[derive(Debug, Default)]
pub struct Changeset {
    pub(crate) requests: Vec<VersionedWrite<PaymentRequest>>,
    pub(crate) accounts: Vec<VersionedWrite<Account>>,
    pub(crate) acts: Vec<VersionedWrite<Act>>,
    pub(crate) payments: Vec<Payment>,
}

impl Changeset {
    pub fn update_request(&mut self, request: &mut PaymentRequest) {
        let expected = request.version;
        request.version += 1;
        self.requests.push(VersionedWrite {
            expected,
            row: request.clone(),
        });
    }

    pub fn update_account(&mut self, account: &mut Account) {
        let expected = account.version;
        account.version += 1;
        self.accounts.push(VersionedWrite {
            expected,
            row: account.clone(),
        });
    }

    pub fn update_act(&mut self, act: &mut Act) {
        let expected = act.version;
        act.version += 1;
        self.acts.push(VersionedWrite {
            expected,
            row: act.clone(),
        });
    }

    /// Payments are append-only; no version guard, the id must be fresh.
    pub fn insert_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
            && self.accounts.is_empty()
            && self.acts.is_empty()
            && self.payments.is_empty()
    }
}

/// Storage port for the settlement core.
///
/// Reads are served from a consistent snapshot and never block writers beyond
/// the snapshot itself. All mutations go through [`commit`], which fails with
/// `ConcurrentModification` when any staged write lost a race, leaving the
/// store untouched.
///
/// [`commit`]: SettlementStore::commit
#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn request(&self, id: RequestId) -> Result<Option<PaymentRequest>>;
    async fn account(&self, id: AccountId) -> Result<Option<Account>>;
    async fn act(&self, id: ActId) -> Result<Option<Act>>;
    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    async fn requests(&self) -> Result<Vec<PaymentRequest>>;
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// Inserts a freshly created request; fails if the id already exists.
    async fn insert_request(&self, request: PaymentRequest) -> Result<()>;
    /// Seeds a reference account; fails if the id already exists.
    async fn insert_account(&self, account: Account) -> Result<()>;
    /// Seeds a reference act; fails if the id already exists.
    async fn insert_act(&self, act: Act) -> Result<()>;

    /// Reserves the next request id. Ids lost to an aborted creation are
    /// never reused.
    async fn next_request_id(&self) -> Result<RequestId>;
    /// Reserves the next payment id, with the same gap semantics.
    async fn next_payment_id(&self) -> Result<PaymentId>;

    /// Atomically applies the changeset: every version guard is re-checked
    /// under the store's write exclusion, then all writes land together.
    async fn commit(&self, changeset: Changeset) -> Result<()>;
}

pub type SettlementStoreArc = Arc<dyn SettlementStore>;
