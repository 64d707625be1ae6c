use crate::domain::request::{RequestEvent, RequestStatus};
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettlementError>;

/// Error taxonomy of the settlement core.
///
/// Every domain error is terminal for the attempted operation: nothing is
/// retried inside the core. Callers that receive `ConcurrentModification`
/// must re-read the entity before retrying the same logical operation.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },

    #[error("event '{event}' not allowed for request in status '{status}' (allowed: {allowed:?})")]
    InvalidTransition {
        status: RequestStatus,
        event: RequestEvent,
        allowed: &'static [RequestEvent],
    },

    #[error("insufficient funds on account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: u32,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("allocating {requested} exceeds the unpaid amount {unpaid} of act {act}")]
    OverAllocation {
        act: u32,
        unpaid: Decimal,
        requested: Decimal,
    },

    #[error("{entity} {id} was modified concurrently")]
    ConcurrentModification { entity: &'static str, id: u32 },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
