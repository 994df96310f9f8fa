//! Channel Controller Command Sequencer.
//!
//! Owns the physical command sequencing for the single memory channel:
//! the power-up initialization sequence, row activation and precharge
//! with all minimum-delay waits, CAS-latency read streaming, write
//! streaming, burst cancellation, and the periodic refresh obligation.
//!
//! The controller serves exactly one client (the arbiter) through a
//! signal-level interface: the client writes [`CtrlIn`] before each call
//! to [`ChannelController::step`] and reads [`CtrlOut`] afterwards, one
//! call per channel-clock cycle. It knows nothing about ports or
//! priority.
//!
//! Every command is issued through the checked [`BankSet`] methods; a
//! returned [`TimingViolation`] is a sequencing defect and propagates out
//! of `step` as fatal.

use crate::common::addr::DecodedAddr;
use crate::common::data::Direction;
use crate::common::error::TimingViolation;
use crate::config::TimingConfig;
use crate::sdram::array::SdramArray;
use crate::sdram::bank::BankSet;

/// Controller input signals, written by the client before each step.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrlIn {
    /// Request strobe; held until the controller pulses `accepted`.
    pub req: bool,
    /// Write enable for the request (false = read).
    pub we: bool,
    /// Starting 24-bit word address.
    pub addr: u32,
    /// Burst length in words; 0 = legacy single 32-bit access.
    pub len: u16,
    /// 32-bit payload for legacy single writes.
    pub wdata32: u32,
    /// Next burst write word; sampled when a write word is consumed.
    pub burst_wdata: u16,
    /// Abort the in-progress burst at the next word boundary.
    pub cancel: bool,
}

/// Controller output signals, valid after each step.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrlOut {
    /// The controller can accept a new request.
    pub ready: bool,
    /// One-cycle pulse: the request on `CtrlIn` was latched this step.
    pub accepted: bool,
    /// One-cycle pulse: transfer complete (possibly truncated).
    pub ack: bool,
    /// Words delivered or consumed so far; final count at `ack`.
    pub words_done: u16,
    /// One-cycle pulse: `word_data` carries a valid burst read word.
    pub word_valid: bool,
    /// Burst read data, valid with `word_valid`.
    pub word_data: u16,
    /// Assembled 32-bit result of a legacy single read, valid at `ack`.
    pub rdata32: u32,
    /// One-cycle pulse: supply the next burst write word on `burst_wdata`.
    pub word_requested: bool,
    /// One-cycle pulse with `ack` on natural (untruncated) completion.
    pub burst_done: bool,
}

/// Controller state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlState {
    /// Power-up sequence; `ready` stays deasserted throughout.
    Init,
    /// Waiting for a request or a refresh obligation.
    Idle,
    /// Closing a conflicting open row before activation.
    CloseRow,
    /// Activating the target row, then counting the row-to-column delay.
    OpenRow,
    /// Row already open; waiting for the row-to-column delay if needed.
    ColumnWait,
    /// Counting CAS latency before the first read word.
    CasWait,
    /// Streaming read words, one per cycle.
    ReadBurst,
    /// Consuming write words, one per cycle.
    WriteBurst,
    /// Closing the row after a cancelled burst, then acking truncated.
    CancelPrecharge,
    /// Precharging all banks so a due refresh can be issued.
    RefreshClose,
    /// Refresh in progress; channel blocked.
    Refresh,
}

/// Phases of the power-up initialization sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitPhase {
    Settle,
    PrechargeAll,
    RefreshA,
    RefreshB,
    ModeRegister,
}

/// Command counters for statistics reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct CtrlCounters {
    /// Row activate commands issued.
    pub activates: u64,
    /// Precharge commands issued (precharge-all counts once).
    pub precharges: u64,
    /// Refresh commands issued, excluding the init sequence.
    pub refreshes: u64,
    /// Accepted transfers that found their row already open.
    pub row_hits: u64,
    /// Accepted transfers that had to open (or re-open) their row.
    pub row_misses: u64,
    /// Column read operations performed.
    pub words_read: u64,
    /// Column write operations performed.
    pub words_written: u64,
}

/// A latched, in-progress transfer.
#[derive(Debug, Clone, Copy)]
struct Transfer {
    dir: Direction,
    single: bool,
    pos: DecodedAddr,
    remaining: u16,
    done: u16,
    wdata32: u32,
    cancel_pending: bool,
}

/// The channel controller: command sequencer plus bank and storage state.
#[derive(Debug)]
pub struct ChannelController {
    /// Input signals, written by the client each cycle.
    pub input: CtrlIn,
    /// Output signals, valid after each step.
    pub out: CtrlOut,
    /// Command counters.
    pub counters: CtrlCounters,

    timing: TimingConfig,
    banks: BankSet,
    mem: SdramArray,

    state: CtrlState,
    init_phase: InitPhase,
    delay: u64,
    issued: bool,
    refresh_counter: u64,
    transfer: Option<Transfer>,
}

impl ChannelController {
    /// Creates a controller at the start of its power-up sequence.
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            input: CtrlIn::default(),
            out: CtrlOut::default(),
            counters: CtrlCounters::default(),
            banks: BankSet::new(timing.bank_timing()),
            mem: SdramArray::new(),
            timing,
            state: CtrlState::Init,
            init_phase: InitPhase::Settle,
            delay: timing.init_settle,
            issued: false,
            refresh_counter: 0,
            transfer: None,
        }
    }

    /// Current state, for inspection by the arbiter and tests.
    pub fn state(&self) -> CtrlState {
        self.state
    }

    /// Cycles since the last refresh was issued.
    pub fn refresh_counter(&self) -> u64 {
        self.refresh_counter
    }

    /// Untimed storage access for preload and readback.
    pub fn mem(&self) -> &SdramArray {
        &self.mem
    }

    /// Mutable untimed storage access for preload.
    pub fn mem_mut(&mut self) -> &mut SdramArray {
        &mut self.mem
    }

    /// Forces an immediate return to the power-up sequence.
    ///
    /// Any in-flight transfer is discarded without notification beyond
    /// the extended `ready` deassertion; memory contents are retained.
    pub fn reset(&mut self) {
        self.input = CtrlIn::default();
        self.out = CtrlOut::default();
        self.banks = BankSet::new(self.timing.bank_timing());
        self.state = CtrlState::Init;
        self.init_phase = InitPhase::Settle;
        self.delay = self.timing.init_settle;
        self.issued = false;
        self.refresh_counter = 0;
        self.transfer = None;
    }

    /// Advances the controller by one channel-clock cycle.
    ///
    /// `now` is the global cycle counter; it must increase by exactly one
    /// between consecutive calls.
    pub fn step(&mut self, now: u64) -> Result<(), TimingViolation> {
        // Pulse outputs last exactly one cycle.
        self.out.accepted = false;
        self.out.ack = false;
        self.out.word_valid = false;
        self.out.word_requested = false;
        self.out.burst_done = false;

        // The obligation counter runs continuously, including during
        // transfers; overdue refreshes are caught at the next idle step.
        self.refresh_counter += 1;

        match self.state {
            CtrlState::Init => self.step_init(now)?,
            CtrlState::Idle => self.step_idle(now)?,
            CtrlState::CloseRow => self.step_close_row(now)?,
            CtrlState::OpenRow => self.step_open_row(now)?,
            CtrlState::ColumnWait => self.step_column_wait(now)?,
            CtrlState::CasWait => self.step_cas_wait(now)?,
            CtrlState::ReadBurst => self.step_read_burst(now)?,
            CtrlState::WriteBurst => self.step_write_burst(now)?,
            CtrlState::CancelPrecharge => self.step_cancel_precharge(now)?,
            CtrlState::RefreshClose => self.step_refresh_close(now)?,
            CtrlState::Refresh => self.step_refresh(),
        }

        self.out.ready =
            self.state == CtrlState::Idle && self.refresh_counter < self.timing.refresh_interval;
        Ok(())
    }

    fn step_init(&mut self, now: u64) -> Result<(), TimingViolation> {
        self.delay = self.delay.saturating_sub(1);
        if self.delay > 0 {
            return Ok(());
        }
        match self.init_phase {
            InitPhase::Settle => {
                // Settle period over; close all banks before refreshing.
                self.banks.precharge_all(now)?;
                self.init_phase = InitPhase::PrechargeAll;
                self.delay = self.timing.t_rp;
            }
            InitPhase::PrechargeAll => {
                self.banks.refresh(now)?;
                self.init_phase = InitPhase::RefreshA;
                self.delay = self.timing.refresh_duration;
            }
            InitPhase::RefreshA => {
                self.banks.refresh(now)?;
                self.init_phase = InitPhase::RefreshB;
                self.delay = self.timing.refresh_duration;
            }
            InitPhase::RefreshB => {
                // Program the access-mode register: latency class and
                // minimum burst atom are fixed by the design.
                self.init_phase = InitPhase::ModeRegister;
                self.delay = self.timing.t_mrd;
            }
            InitPhase::ModeRegister => {
                self.state = CtrlState::Idle;
                self.refresh_counter = 0;
            }
        }
        Ok(())
    }

    fn step_idle(&mut self, now: u64) -> Result<(), TimingViolation> {
        // The refresh obligation outranks any client: it is checked
        // before a request can be accepted, so saturating back-to-back
        // grants cannot defer it past an idle boundary.
        if self.refresh_counter >= self.timing.refresh_interval {
            if self.banks.all_idle() {
                self.banks.refresh(now)?;
                self.counters.refreshes += 1;
                self.refresh_counter = 0;
                self.state = CtrlState::Refresh;
                self.delay = self.timing.refresh_duration;
            } else {
                self.state = CtrlState::RefreshClose;
                self.issued = false;
            }
            return Ok(());
        }

        if !self.input.req {
            return Ok(());
        }

        let pos = DecodedAddr::decode(self.input.addr);
        let transfer = Transfer {
            dir: if self.input.we {
                Direction::Write
            } else {
                Direction::Read
            },
            single: self.input.len == 0,
            pos,
            remaining: if self.input.len == 0 { 2 } else { self.input.len },
            done: 0,
            wdata32: self.input.wdata32,
            cancel_pending: false,
        };
        self.transfer = Some(transfer);
        self.out.accepted = true;
        self.out.words_done = 0;

        match self.banks.open_row(pos.bank) {
            Some(row) if row == pos.row => {
                // Row-buffer reuse: skip activation entirely.
                self.counters.row_hits += 1;
                self.begin_columns(now)?;
            }
            Some(_) => {
                self.counters.row_misses += 1;
                self.state = CtrlState::CloseRow;
                self.issued = false;
                self.step_close_row(now)?;
            }
            None => {
                self.counters.row_misses += 1;
                self.state = CtrlState::OpenRow;
                self.issued = false;
                self.step_open_row(now)?;
            }
        }
        Ok(())
    }

    fn step_close_row(&mut self, now: u64) -> Result<(), TimingViolation> {
        if self.cancelled_before_columns() {
            return Ok(());
        }
        if !self.issued {
            let bank = self.transfer_pos().bank;
            if !self.banks.precharge_allowed(bank, now) {
                return Ok(());
            }
            self.banks.precharge(bank, now)?;
            self.counters.precharges += 1;
            self.issued = true;
            self.delay = self.timing.t_rp;
            return Ok(());
        }
        self.delay = self.delay.saturating_sub(1);
        if self.delay == 0 {
            self.state = CtrlState::OpenRow;
            self.issued = false;
            self.step_open_row(now)?;
        }
        Ok(())
    }

    fn step_open_row(&mut self, now: u64) -> Result<(), TimingViolation> {
        if self.cancelled_before_columns() {
            return Ok(());
        }
        if !self.issued {
            let pos = self.transfer_pos();
            if !self.banks.activate_allowed(pos.bank, now) {
                return Ok(());
            }
            self.banks.activate(pos.bank, pos.row, now)?;
            self.counters.activates += 1;
            self.issued = true;
            self.delay = self.timing.t_rcd;
            return Ok(());
        }
        self.delay = self.delay.saturating_sub(1);
        if self.delay == 0 {
            self.enter_transfer(now)?;
        }
        Ok(())
    }

    fn step_column_wait(&mut self, now: u64) -> Result<(), TimingViolation> {
        if self.cancelled_before_columns() {
            return Ok(());
        }
        let bank = self.transfer_pos().bank;
        if self.banks.column_allowed(bank, now) {
            self.enter_transfer(now)?;
        }
        Ok(())
    }

    fn step_cas_wait(&mut self, now: u64) -> Result<(), TimingViolation> {
        // Singles are atomic; cancellation applies at word boundaries of
        // bursts only.
        if self.input.cancel {
            if let Some(t) = self.transfer.as_mut() {
                if !t.single {
                    t.cancel_pending = true;
                }
            }
        }
        self.delay = self.delay.saturating_sub(1);
        if self.delay > 0 {
            return Ok(());
        }

        let mut t = self.transfer.take().ok_or(TimingViolation::ColumnOnIdleBank { bank: 0 })?;
        if t.single {
            // Two sequential columns assembled low half first.
            self.banks.column_access(t.pos.bank, t.pos.row, now, false)?;
            let low = self.mem.read_word(t.pos.encode());
            t.pos.advance_column();
            self.banks.column_access(t.pos.bank, t.pos.row, now, false)?;
            let high = self.mem.read_word(t.pos.encode());
            self.counters.words_read += 2;
            self.out.rdata32 = (low as u32) | ((high as u32) << 16);
            self.out.words_done = 2;
            self.out.ack = true;
            self.state = CtrlState::Idle;
            return Ok(());
        }

        // First burst word settles as the CAS latency expires.
        self.banks.column_access(t.pos.bank, t.pos.row, now, false)?;
        self.out.word_data = self.mem.read_word(t.pos.encode());
        self.out.word_valid = true;
        self.counters.words_read += 1;
        t.pos.advance_column();
        t.remaining -= 1;
        t.done += 1;
        self.out.words_done = t.done;

        if t.remaining == 0 {
            self.out.burst_done = true;
            self.out.ack = true;
            self.state = CtrlState::Idle;
        } else if t.cancel_pending || self.input.cancel {
            self.transfer = Some(t);
            self.state = CtrlState::CancelPrecharge;
            self.issued = false;
            self.step_cancel_precharge(now)?;
        } else {
            self.transfer = Some(t);
            self.state = CtrlState::ReadBurst;
        }
        Ok(())
    }

    fn step_read_burst(&mut self, now: u64) -> Result<(), TimingViolation> {
        if self.input.cancel {
            // The word committed last cycle has already been delivered;
            // close the row and ack with the truncated count.
            self.state = CtrlState::CancelPrecharge;
            self.issued = false;
            return self.step_cancel_precharge(now);
        }

        let mut t = self.transfer.take().ok_or(TimingViolation::ColumnOnIdleBank { bank: 0 })?;
        self.banks.column_access(t.pos.bank, t.pos.row, now, false)?;
        self.out.word_data = self.mem.read_word(t.pos.encode());
        self.out.word_valid = true;
        self.counters.words_read += 1;
        t.pos.advance_column();
        t.remaining -= 1;
        t.done += 1;
        self.out.words_done = t.done;

        if t.remaining == 0 {
            self.out.burst_done = true;
            self.out.ack = true;
            self.state = CtrlState::Idle;
        } else {
            self.transfer = Some(t);
        }
        Ok(())
    }

    fn step_write_burst(&mut self, now: u64) -> Result<(), TimingViolation> {
        if self.input.cancel {
            self.state = CtrlState::CancelPrecharge;
            self.issued = false;
            return self.step_cancel_precharge(now);
        }

        let mut t = self.transfer.take().ok_or(TimingViolation::ColumnOnIdleBank { bank: 0 })?;
        self.banks.column_access(t.pos.bank, t.pos.row, now, true)?;
        self.mem.write_word(t.pos.encode(), self.input.burst_wdata);
        self.counters.words_written += 1;
        t.pos.advance_column();
        t.remaining -= 1;
        t.done += 1;
        self.out.words_done = t.done;

        if t.remaining == 0 {
            self.out.burst_done = true;
            self.out.ack = true;
            self.state = CtrlState::Idle;
        } else {
            self.out.word_requested = true;
            self.transfer = Some(t);
        }
        Ok(())
    }

    fn step_cancel_precharge(&mut self, now: u64) -> Result<(), TimingViolation> {
        if !self.issued {
            let bank = self.transfer_pos().bank;
            // Write recovery and minimum active time gate the precharge.
            if !self.banks.precharge_allowed(bank, now) {
                return Ok(());
            }
            self.banks.precharge(bank, now)?;
            self.counters.precharges += 1;
            self.issued = true;
            self.delay = self.timing.t_rp;
            return Ok(());
        }
        self.delay = self.delay.saturating_sub(1);
        if self.delay == 0 {
            let done = self.transfer.take().map(|t| t.done).unwrap_or(0);
            self.out.words_done = done;
            self.out.ack = true;
            self.state = CtrlState::Idle;
        }
        Ok(())
    }

    fn step_refresh_close(&mut self, now: u64) -> Result<(), TimingViolation> {
        if !self.issued {
            if !self.banks.precharge_all_allowed(now) {
                return Ok(());
            }
            self.banks.precharge_all(now)?;
            self.counters.precharges += 1;
            self.issued = true;
            self.delay = self.timing.t_rp;
            return Ok(());
        }
        self.delay = self.delay.saturating_sub(1);
        if self.delay == 0 {
            self.banks.refresh(now)?;
            self.counters.refreshes += 1;
            self.refresh_counter = 0;
            self.state = CtrlState::Refresh;
            self.delay = self.timing.refresh_duration;
        }
        Ok(())
    }

    fn step_refresh(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        if self.delay == 0 {
            self.state = CtrlState::Idle;
        }
    }

    /// Route to the column phase once the target row is open.
    fn begin_columns(&mut self, now: u64) -> Result<(), TimingViolation> {
        let bank = self.transfer_pos().bank;
        if self.banks.column_allowed(bank, now) {
            self.enter_transfer(now)
        } else {
            self.state = CtrlState::ColumnWait;
            Ok(())
        }
    }

    fn enter_transfer(&mut self, now: u64) -> Result<(), TimingViolation> {
        let t = self.transfer.as_ref().ok_or(TimingViolation::ColumnOnIdleBank { bank: 0 })?;
        match (t.dir, t.single) {
            (Direction::Read, _) => {
                self.state = CtrlState::CasWait;
                self.delay = self.timing.cas_latency;
                Ok(())
            }
            (Direction::Write, false) => {
                // Pull the first write word; it is consumed next cycle.
                self.out.word_requested = true;
                self.state = CtrlState::WriteBurst;
                Ok(())
            }
            (Direction::Write, true) => {
                let mut t = self.transfer.take().ok_or(TimingViolation::ColumnOnIdleBank { bank: 0 })?;
                self.banks.column_access(t.pos.bank, t.pos.row, now, true)?;
                self.mem.write_word(t.pos.encode(), (t.wdata32 & 0xFFFF) as u16);
                t.pos.advance_column();
                self.banks.column_access(t.pos.bank, t.pos.row, now, true)?;
                self.mem.write_word(t.pos.encode(), (t.wdata32 >> 16) as u16);
                self.counters.words_written += 2;
                self.out.words_done = 2;
                self.out.ack = true;
                self.state = CtrlState::Idle;
                Ok(())
            }
        }
    }

    /// Ack with zero (or the already-delivered) count when a burst is
    /// cancelled before any column was committed. No precharge is needed;
    /// the legality polls of the next transfer absorb whatever the open
    /// sequence had already issued.
    fn cancelled_before_columns(&mut self) -> bool {
        let cancel = self.input.cancel
            && self.transfer.map(|t| !t.single).unwrap_or(false);
        if cancel {
            let done = self.transfer.take().map(|t| t.done).unwrap_or(0);
            self.out.words_done = done;
            self.out.ack = true;
            self.state = CtrlState::Idle;
        }
        cancel
    }

    fn transfer_pos(&self) -> DecodedAddr {
        match self.transfer {
            Some(t) => t.pos,
            None => DecodedAddr::decode(0),
        }
    }
}
