//! Entities and value objects of the settlement core.

pub mod account;
pub mod act;
pub mod money;
pub mod payment;
pub mod ports;
pub mod request;

pub type AccountId = u32;
pub type ActId = u32;
pub type CategoryId = u32;
pub type ContractId = u32;
pub type PaymentId = u32;
pub type RequestId = u32;

/// Optimistic concurrency counter carried by every mutable entity.
pub type Version = u64;
