use crate::application::allocation::ActAllocationTracker;
use crate::application::ledger::AccountLedger;
use crate::domain::account::Account;
use crate::domain::payment::Payment;
use crate::domain::ports::{Changeset, SettlementStore, SettlementStoreArc};
use crate::domain::request::{NewPaymentRequest, PaymentRequest, RequestEvent, RequestStatus};
use crate::domain::{AccountId, ActId, RequestId};
use crate::error::{Result, SettlementError};
use chrono::Utc;
use rust_decimal::Decimal;

/// Page size of [`SettlementEngine::list_requests`].
pub const PAGE_SIZE: usize = 50;

/// One page of payment requests, ordered by id.
#[derive(Debug, Clone)]
pub struct RequestPage {
    pub results: Vec<PaymentRequest>,
    pub total_count: usize,
}

/// The payment-request workflow: the main entry point of the settlement core.
///
/// Drives the request state machine and composes [`AccountLedger`] and
/// [`ActAllocationTracker`] effects into a single atomic commit per
/// transition. Concurrent callers racing on the same entity resolve
/// deterministically: one commit wins, the other observes
/// `ConcurrentModification` (or `InvalidTransition` after a re-read).
#[derive(Clone)]
pub struct SettlementEngine {
    store: SettlementStoreArc,
    ledger: AccountLedger,
    allocations: ActAllocationTracker,
}

impl SettlementEngine {
    pub fn new(store: SettlementStoreArc) -> Self {
        let ledger = AccountLedger::new(store.clone());
        let allocations = ActAllocationTracker::new(store.clone());
        Self {
            store,
            ledger,
            allocations,
        }
    }

    /// Creates a payment request in `planned`.
    ///
    /// When an act is referenced it must belong to the referenced contract;
    /// the account hint, if any, is not resolved until pay time.
    pub async fn create_request(&self, new: NewPaymentRequest) -> Result<PaymentRequest> {
        if let Some(act_id) = new.act_id {
            let contract_id = new.contract_id.ok_or_else(|| {
                SettlementError::Validation(
                    "an act reference requires a contract reference".to_string(),
                )
            })?;
            let act = self
                .store
                .act(act_id)
                .await?
                .ok_or(SettlementError::NotFound {
                    entity: "act",
                    id: act_id,
                })?;
            if act.contract_id != contract_id {
                return Err(SettlementError::Validation(format!(
                    "act {act_id} does not belong to contract {contract_id}"
                )));
            }
        }

        let id = self.store.next_request_id().await?;
        let request = PaymentRequest::create(id, new, Utc::now())?;
        self.store.insert_request(request.clone()).await?;
        tracing::debug!(request = id, amount = %request.amount.value(), "created payment request");
        Ok(request)
    }

    /// planned -> approved. Pure status change, no side effects.
    pub async fn approve_request(&self, id: RequestId) -> Result<PaymentRequest> {
        let mut request = self.fetch_request(id).await?;
        request.approve(Utc::now())?;
        let mut cs = Changeset::default();
        cs.update_request(&mut request);
        self.store.commit(cs).await?;
        tracing::debug!(request = id, "approved payment request");
        Ok(request)
    }

    /// planned/approved -> cancelled. Never touches the ledger.
    pub async fn cancel_request(
        &self,
        id: RequestId,
        reason: Option<String>,
    ) -> Result<PaymentRequest> {
        let mut request = self.fetch_request(id).await?;
        request.cancel(reason, Utc::now())?;
        let mut cs = Changeset::default();
        cs.update_request(&mut request);
        self.store.commit(cs).await?;
        tracing::debug!(request = id, "cancelled payment request");
        Ok(request)
    }

    /// approved -> paid, the load-bearing transition.
    ///
    /// Guard check, payment creation, ledger debit, act allocation, and the
    /// status update form one changeset: all commit together or not at all.
    /// A second pay on the same request fails the guard before any ledger
    /// work; a concurrent pay that lost the commit race fails the version
    /// check with no partial effects.
    pub async fn pay_request(
        &self,
        id: RequestId,
        account_id: AccountId,
    ) -> Result<PaymentRequest> {
        let mut request = self.fetch_request(id).await?;
        request.ensure_allows(RequestEvent::Pay)?;

        let mut cs = Changeset::default();
        let now = Utc::now();

        let (_, account_version) = self.ledger.balance(account_id).await?;
        self.ledger
            .debit(&mut cs, account_id, request.amount, account_version)
            .await?;

        let payment_id = self.store.next_payment_id().await?;
        let payment = Payment::new(payment_id, request.id, account_id, request.amount, now, request.act_id);
        if let Some(act_id) = request.act_id {
            self.allocations
                .allocate(&mut cs, act_id, payment_id, request.amount, now.date_naive())
                .await?;
        }
        cs.insert_payment(payment);

        request.mark_paid(payment_id, now)?;
        cs.update_request(&mut request);

        self.store.commit(cs).await?;
        tracing::debug!(
            request = id,
            payment = payment_id,
            account = account_id,
            amount = %request.amount.value(),
            "executed payment"
        );
        Ok(request)
    }

    /// Snapshot listing, optionally filtered by status; `page` is 1-based.
    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        page: usize,
    ) -> Result<RequestPage> {
        let mut rows = self.store.requests().await?;
        if let Some(status) = status {
            rows.retain(|r| r.status == status);
        }
        rows.sort_by_key(|r| r.id);
        let total_count = rows.len();
        let start = page.max(1) - 1;
        let results = rows.into_iter().skip(start * PAGE_SIZE).take(PAGE_SIZE).collect();
        Ok(RequestPage {
            results,
            total_count,
        })
    }

    pub async fn get_request(&self, id: RequestId) -> Result<PaymentRequest> {
        self.fetch_request(id).await
    }

    pub async fn act_unpaid_amount(&self, act_id: ActId) -> Result<Decimal> {
        self.allocations.unpaid_amount(act_id).await
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    /// Final account table, ordered by id.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = self.store.accounts().await?;
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn fetch_request(&self, id: RequestId) -> Result<PaymentRequest> {
        self.store
            .request(id)
            .await?
            .ok_or(SettlementError::NotFound {
                entity: "payment request",
                id,
            })
    }
}
