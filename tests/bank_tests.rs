//! Unit tests for the per-bank open-row and timing-constraint model.

use sdram_arbiter::common::error::TimingViolation;
use sdram_arbiter::sdram::bank::{BankSet, BankTiming};

/// Creates the reference timing set.
fn reference_timing() -> BankTiming {
    BankTiming {
        t_rcd: 2,
        t_rp: 2,
        t_ras: 5,
        t_rc: 7,
        t_wr: 2,
    }
}

fn bank_set() -> BankSet {
    BankSet::new(reference_timing())
}

/// Tests that an activate opens the addressed row.
#[test]
fn test_activate_opens_row() {
    let mut banks = bank_set();
    assert!(banks.all_idle());
    banks.activate(1, 42, 10).unwrap();
    assert_eq!(banks.open_row(1), Some(42));
    assert_eq!(banks.open_row(0), None);
    assert!(!banks.all_idle());
}

/// Tests that activating a bank with an open row is rejected.
#[test]
fn test_activate_while_active_rejected() {
    let mut banks = bank_set();
    banks.activate(0, 1, 10).unwrap();
    assert_eq!(
        banks.activate(0, 2, 20),
        Err(TimingViolation::ActivateWhileActive { bank: 0 })
    );
}

/// Tests that an activate must wait tRP after a precharge.
#[test]
fn test_activate_respects_trp() {
    let mut banks = bank_set();
    banks.activate(0, 1, 10).unwrap();
    banks.precharge(0, 15).unwrap();
    assert!(!banks.activate_allowed(0, 16));
    assert!(matches!(
        banks.activate(0, 1, 16),
        Err(TimingViolation::ActivateBeforePrecharge { bank: 0, .. })
    ));
    assert!(banks.activate_allowed(0, 17));
    banks.activate(0, 1, 17).unwrap();
}

/// Tests that same-bank activates must be tRC apart.
#[test]
fn test_activate_respects_trc() {
    // Shrink tRAS/tWR so tRC is the binding constraint.
    let mut banks = BankSet::new(BankTiming {
        t_ras: 1,
        t_wr: 0,
        ..reference_timing()
    });
    banks.activate(0, 1, 10).unwrap();
    banks.precharge(0, 11).unwrap();
    assert!(matches!(
        banks.activate(0, 1, 13),
        Err(TimingViolation::ActivateTooSoon { bank: 0, .. })
    ));
    banks.activate(0, 1, 17).unwrap();
}

/// Tests the minimum row active time before precharge.
#[test]
fn test_precharge_respects_tras() {
    let mut banks = bank_set();
    banks.activate(0, 1, 10).unwrap();
    assert!(!banks.precharge_allowed(0, 12));
    assert!(matches!(
        banks.precharge(0, 12),
        Err(TimingViolation::PrechargeBeforeRas { bank: 0, .. })
    ));
    assert!(banks.precharge_allowed(0, 15));
    banks.precharge(0, 15).unwrap();
    assert_eq!(banks.open_row(0), None);
}

/// Tests that precharging an idle bank is an accepted no-op.
#[test]
fn test_precharge_idle_noop() {
    let mut banks = bank_set();
    assert!(banks.precharge_allowed(3, 0));
    banks.precharge(3, 0).unwrap();
    assert!(banks.all_idle());
}

/// Tests that write recovery gates the precharge.
#[test]
fn test_write_recovery_gates_precharge() {
    let mut banks = bank_set();
    banks.activate(0, 1, 10).unwrap();
    banks.column_access(0, 1, 14, true).unwrap();
    assert!(matches!(
        banks.precharge(0, 15),
        Err(TimingViolation::PrechargeBeforeWriteRecovery { bank: 0, .. })
    ));
    banks.precharge(0, 16).unwrap();
}

/// Tests that a column command must wait tRCD after the activate.
#[test]
fn test_column_respects_trcd() {
    let mut banks = bank_set();
    banks.activate(0, 7, 10).unwrap();
    assert!(!banks.column_allowed(0, 11));
    assert!(matches!(
        banks.column_access(0, 7, 11, false),
        Err(TimingViolation::ColumnBeforeRcd { bank: 0, .. })
    ));
    assert!(banks.column_allowed(0, 12));
    banks.column_access(0, 7, 12, false).unwrap();
}

/// Tests that a column command to the wrong row is rejected.
#[test]
fn test_column_row_mismatch() {
    let mut banks = bank_set();
    banks.activate(0, 5, 10).unwrap();
    assert_eq!(
        banks.column_access(0, 6, 20, false),
        Err(TimingViolation::ColumnRowMismatch {
            bank: 0,
            open_row: 5,
            requested: 6
        })
    );
}

/// Tests that a column command to an idle bank is rejected.
#[test]
fn test_column_on_idle_bank() {
    let mut banks = bank_set();
    assert_eq!(
        banks.column_access(2, 0, 10, false),
        Err(TimingViolation::ColumnOnIdleBank { bank: 2 })
    );
}

/// Tests that refresh needs every bank idle and re-arms tRP afterwards.
#[test]
fn test_refresh_requires_all_idle() {
    let mut banks = bank_set();
    banks.activate(1, 3, 10).unwrap();
    assert_eq!(
        banks.refresh(12),
        Err(TimingViolation::RefreshWithOpenRow { bank: 1 })
    );
    banks.precharge(1, 15).unwrap();
    banks.refresh(20).unwrap();

    // The refresh internally precharges every bank.
    assert!(!banks.activate_allowed(0, 21));
    assert!(banks.activate_allowed(0, 22));
}
