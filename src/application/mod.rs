//! Application layer orchestrating the domain against the storage port.
//!
//! `SettlementEngine` drives the payment-request state machine, composing
//! `AccountLedger` and `ActAllocationTracker` effects into a single atomic
//! commit per transition.

pub mod allocation;
pub mod engine;
pub mod ledger;
