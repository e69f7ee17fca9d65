//! `billing` crate — the Credit Meter (spec C10): a hot per-workspace
//! counter backed by an append-only ledger, with FIFO pack consumption and
//! period rollover.

pub mod error;
pub mod meter;

pub use error::BillingError;
pub use meter::{Meter, TXN_GRANT, TXN_REFUND, TXN_USAGE};
