//! Timing-Violation Definitions.
//!
//! This module defines the fatal error class of the memory system: a
//! command issued before a bank's minimum delay has elapsed. Violations
//! indicate a sequencing defect in the controller or arbiter, not a
//! recoverable runtime condition; the bank model reports them so that
//! verification catches any such defect immediately.

use std::fmt;

/// A timing-constraint violation detected by the bank model.
///
/// Each variant carries the bank index and, where relevant, the number of
/// cycles that had elapsed versus the required minimum. Any violation is a
/// design defect: the controller must never issue a command for which the
/// minimum delay has not elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingViolation {
    /// Activate issued to a bank that already has an open row.
    ActivateWhileActive { bank: usize },

    /// Activate issued before the precharge delay (tRP) elapsed.
    ActivateBeforePrecharge { bank: usize, elapsed: u64, min: u64 },

    /// Activate issued before the activate-to-activate minimum (tRC).
    ActivateTooSoon { bank: usize, elapsed: u64, min: u64 },

    /// Precharge issued before the minimum row active time (tRAS).
    PrechargeBeforeRas { bank: usize, elapsed: u64, min: u64 },

    /// Precharge issued before write recovery (tWR) completed.
    PrechargeBeforeWriteRecovery { bank: usize, elapsed: u64, min: u64 },

    /// Column command issued to a bank with no open row.
    ColumnOnIdleBank { bank: usize },

    /// Column command issued to a row other than the open one.
    ColumnRowMismatch { bank: usize, open_row: u16, requested: u16 },

    /// Column command issued before the row-to-column delay (tRCD).
    ColumnBeforeRcd { bank: usize, elapsed: u64, min: u64 },

    /// Refresh issued while one or more banks still had an open row.
    RefreshWithOpenRow { bank: usize },
}

impl fmt::Display for TimingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivateWhileActive { bank } => {
                write!(f, "bank {}: activate while a row is already open", bank)
            }
            Self::ActivateBeforePrecharge { bank, elapsed, min } => write!(
                f,
                "bank {}: activate {} cycles after precharge (tRP = {})",
                bank, elapsed, min
            ),
            Self::ActivateTooSoon { bank, elapsed, min } => write!(
                f,
                "bank {}: activate {} cycles after previous activate (tRC = {})",
                bank, elapsed, min
            ),
            Self::PrechargeBeforeRas { bank, elapsed, min } => write!(
                f,
                "bank {}: precharge {} cycles after activate (tRAS = {})",
                bank, elapsed, min
            ),
            Self::PrechargeBeforeWriteRecovery { bank, elapsed, min } => write!(
                f,
                "bank {}: precharge {} cycles after write (tWR = {})",
                bank, elapsed, min
            ),
            Self::ColumnOnIdleBank { bank } => {
                write!(f, "bank {}: column access with no open row", bank)
            }
            Self::ColumnRowMismatch {
                bank,
                open_row,
                requested,
            } => write!(
                f,
                "bank {}: column access to row {} while row {} is open",
                bank, requested, open_row
            ),
            Self::ColumnBeforeRcd { bank, elapsed, min } => write!(
                f,
                "bank {}: column access {} cycles after activate (tRCD = {})",
                bank, elapsed, min
            ),
            Self::RefreshWithOpenRow { bank } => {
                write!(f, "refresh issued while bank {} has an open row", bank)
            }
        }
    }
}

impl std::error::Error for TimingViolation {}
