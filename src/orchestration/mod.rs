//! Orchestration layer for SWORD deposits
//!
//! This module provides the high-level control loop that turns a batch of
//! selected publications into deposit exchanges and one aggregate report.

pub mod batch_depositor;

// Re-export main types for convenience
pub use batch_depositor::{BatchDepositRequest, BatchDepositor, BatchReport, DepositOutcome};
