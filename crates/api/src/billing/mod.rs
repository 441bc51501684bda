//! Billing finalization: applying provider results to generation records
//! and committing the exactly-once charge.

pub mod finalizer;

pub use finalizer::{FinalizeEntry, Finalizer};
