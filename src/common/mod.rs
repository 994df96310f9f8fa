//! Common utilities and types used throughout the memory-system simulator.
//!
//! This module provides fundamental types for word addresses, transfer
//! direction, and timing-violation reporting that are shared across the
//! channel controller, the arbiter, and the top-level system.

/// Word-address decomposition into bank, row, and column.
pub mod addr;

/// Transfer direction and request definitions.
pub mod data;

/// Timing-violation error types.
pub mod error;

pub use addr::{DecodedAddr, BANK_COUNT, COL_COUNT, ROW_COUNT, TOTAL_WORDS};
pub use data::{Direction, Request};
pub use error::TimingViolation;
