//! Bank State and Timing-Constraint Model.
//!
//! Tracks, for each of the four independent banks, whether a row is open,
//! which row it is, and the cycle timestamps of the last activate,
//! precharge, and write commands. Every command goes through a checked
//! method that returns a [`TimingViolation`] if a minimum delay has not
//! elapsed; the matching `*_allowed` predicate lets the controller wait
//! for legality instead of tripping the check.
//!
//! The set is owned exclusively by the channel controller and never
//! duplicated; it is the single authority for the "at most one open row
//! per bank" invariant.

use crate::common::addr::BANK_COUNT;
use crate::common::error::TimingViolation;

/// Minimum-delay parameters enforced by the bank model, in cycles.
#[derive(Clone, Copy, Debug)]
pub struct BankTiming {
    /// Activate to column command (row-to-column delay).
    pub t_rcd: u64,
    /// Precharge to activate.
    pub t_rp: u64,
    /// Activate to precharge (minimum row active time).
    pub t_ras: u64,
    /// Activate to activate, same bank.
    pub t_rc: u64,
    /// Last write to precharge (write recovery).
    pub t_wr: u64,
}

/// State of one bank: open row plus command timestamps.
#[derive(Clone, Copy, Debug, Default)]
struct BankState {
    open_row: Option<u16>,
    last_activate: Option<u64>,
    last_precharge: Option<u64>,
    last_write: Option<u64>,
}

/// The four banks plus the timing parameters they are checked against.
#[derive(Debug)]
pub struct BankSet {
    banks: [BankState; BANK_COUNT],
    timing: BankTiming,
}

fn elapsed_ok(last: Option<u64>, now: u64, min: u64) -> bool {
    match last {
        Some(t) => now >= t + min,
        None => true,
    }
}

impl BankSet {
    /// Creates a bank set with all banks idle and no command history.
    pub fn new(timing: BankTiming) -> Self {
        Self {
            banks: [BankState::default(); BANK_COUNT],
            timing,
        }
    }

    /// Returns the open row of `bank`, or `None` if the bank is idle.
    pub fn open_row(&self, bank: usize) -> Option<u16> {
        self.banks[bank].open_row
    }

    /// Returns `true` if no bank has an open row.
    pub fn all_idle(&self) -> bool {
        self.banks.iter().all(|b| b.open_row.is_none())
    }

    /// Returns `true` if an activate to `bank` would be legal at `now`.
    pub fn activate_allowed(&self, bank: usize, now: u64) -> bool {
        let b = &self.banks[bank];
        b.open_row.is_none()
            && elapsed_ok(b.last_precharge, now, self.timing.t_rp)
            && elapsed_ok(b.last_activate, now, self.timing.t_rc)
    }

    /// Opens `row` in `bank`.
    ///
    /// The bank must be idle and both tRP (since the last precharge) and
    /// tRC (since the last activate) must have elapsed.
    pub fn activate(&mut self, bank: usize, row: u16, now: u64) -> Result<(), TimingViolation> {
        let t = self.timing;
        let b = &mut self.banks[bank];
        if b.open_row.is_some() {
            return Err(TimingViolation::ActivateWhileActive { bank });
        }
        if let Some(last) = b.last_precharge {
            if now < last + t.t_rp {
                return Err(TimingViolation::ActivateBeforePrecharge {
                    bank,
                    elapsed: now - last,
                    min: t.t_rp,
                });
            }
        }
        if let Some(last) = b.last_activate {
            if now < last + t.t_rc {
                return Err(TimingViolation::ActivateTooSoon {
                    bank,
                    elapsed: now - last,
                    min: t.t_rc,
                });
            }
        }
        b.open_row = Some(row);
        b.last_activate = Some(now);
        Ok(())
    }

    /// Returns `true` if a precharge of `bank` would be legal at `now`.
    ///
    /// Precharging an idle bank is a no-op and always legal.
    pub fn precharge_allowed(&self, bank: usize, now: u64) -> bool {
        let b = &self.banks[bank];
        if b.open_row.is_none() {
            return true;
        }
        elapsed_ok(b.last_activate, now, self.timing.t_ras)
            && elapsed_ok(b.last_write, now, self.timing.t_wr)
    }

    /// Closes the open row of `bank`.
    ///
    /// tRAS (since activate) and tWR (since the last write) must have
    /// elapsed. Precharging an idle bank is accepted as a no-op.
    pub fn precharge(&mut self, bank: usize, now: u64) -> Result<(), TimingViolation> {
        let t = self.timing;
        let b = &mut self.banks[bank];
        if b.open_row.is_none() {
            return Ok(());
        }
        if let Some(last) = b.last_activate {
            if now < last + t.t_ras {
                return Err(TimingViolation::PrechargeBeforeRas {
                    bank,
                    elapsed: now - last,
                    min: t.t_ras,
                });
            }
        }
        if let Some(last) = b.last_write {
            if now < last + t.t_wr {
                return Err(TimingViolation::PrechargeBeforeWriteRecovery {
                    bank,
                    elapsed: now - last,
                    min: t.t_wr,
                });
            }
        }
        b.open_row = None;
        b.last_precharge = Some(now);
        Ok(())
    }

    /// Returns `true` if precharging every bank would be legal at `now`.
    pub fn precharge_all_allowed(&self, now: u64) -> bool {
        (0..BANK_COUNT).all(|bank| self.precharge_allowed(bank, now))
    }

    /// Closes every open row (precharge-all command).
    pub fn precharge_all(&mut self, now: u64) -> Result<(), TimingViolation> {
        for bank in 0..BANK_COUNT {
            self.precharge(bank, now)?;
        }
        Ok(())
    }

    /// Returns `true` if a column command to `bank` would be legal at `now`.
    pub fn column_allowed(&self, bank: usize, now: u64) -> bool {
        let b = &self.banks[bank];
        b.open_row.is_some() && elapsed_ok(b.last_activate, now, self.timing.t_rcd)
    }

    /// Issues one column command (read or write) to `row` in `bank`.
    ///
    /// The addressed row must be the open one and tRCD must have elapsed
    /// since the activate. Writes record the write-recovery timestamp.
    pub fn column_access(
        &mut self,
        bank: usize,
        row: u16,
        now: u64,
        is_write: bool,
    ) -> Result<(), TimingViolation> {
        let t = self.timing;
        let b = &mut self.banks[bank];
        match b.open_row {
            None => return Err(TimingViolation::ColumnOnIdleBank { bank }),
            Some(open_row) if open_row != row => {
                return Err(TimingViolation::ColumnRowMismatch {
                    bank,
                    open_row,
                    requested: row,
                });
            }
            Some(_) => {}
        }
        if let Some(last) = b.last_activate {
            if now < last + t.t_rcd {
                return Err(TimingViolation::ColumnBeforeRcd {
                    bank,
                    elapsed: now - last,
                    min: t.t_rcd,
                });
            }
        }
        if is_write {
            b.last_write = Some(now);
        }
        Ok(())
    }

    /// Issues a refresh command; all banks must be idle.
    pub fn refresh(&mut self, now: u64) -> Result<(), TimingViolation> {
        for (bank, b) in self.banks.iter().enumerate() {
            if b.open_row.is_some() {
                return Err(TimingViolation::RefreshWithOpenRow { bank });
            }
        }
        // Refresh internally activates and precharges every bank; model it
        // as a precharge timestamp so tRP gates the next activate.
        for b in &mut self.banks {
            b.last_precharge = Some(now);
        }
        Ok(())
    }
}
