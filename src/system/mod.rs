//! Top-Level Memory System.
//!
//! Wires the four-port arbiter to the channel controller and steps both
//! in lockstep, one call per channel-clock cycle. Clients interact only
//! through this layer: submit a request on a port, step the system, and
//! watch that port's output signals.
//!
//! A [`TimingViolation`] escaping [`MemorySystem::step`] means the
//! controller issued an illegal command sequence; it is a design defect,
//! not a recoverable runtime condition.

use std::time::Instant;

use crate::arbiter::{Arbiter, PortOut, PORT_NAMES};
use crate::common::data::Request;
use crate::common::error::TimingViolation;
use crate::config::Config;
use crate::sdram::array::SdramArray;
use crate::sdram::controller::{ChannelController, CtrlState};
use crate::stats::SimStats;

/// The complete memory system: arbiter, controller, banks, and storage.
#[derive(Debug)]
pub struct MemorySystem {
    /// The strict-priority port arbiter.
    pub arbiter: Arbiter,
    /// The channel controller.
    pub ctrl: ChannelController,

    cycle: u64,
    trace: bool,
    max_burst: u16,
    last_state: CtrlState,
    start_time: Instant,
}

impl MemorySystem {
    /// Builds a system from a configuration; the controller starts its
    /// power-up sequence at cycle 0.
    pub fn new(config: &Config) -> Self {
        let ctrl = ChannelController::new(config.timing);
        let last_state = ctrl.state();
        Self {
            arbiter: Arbiter::new(),
            ctrl,
            cycle: 0,
            trace: config.general.trace || cfg!(feature = "always-trace"),
            max_burst: config.memory.max_burst,
            last_state,
            start_time: Instant::now(),
        }
    }

    /// The global cycle counter.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Latches a request on `port`.
    ///
    /// Returns `false` if the port is busy or the burst exceeds the
    /// configured maximum length.
    pub fn submit(&mut self, port: usize, req: Request) -> bool {
        if req.len > self.max_burst {
            return false;
        }
        self.arbiter.ports[port].submit(req)
    }

    /// The client-visible output signals of `port`.
    pub fn port(&self, port: usize) -> &PortOut {
        &self.arbiter.ports[port].out
    }

    /// Untimed storage access for preload and readback.
    pub fn mem(&self) -> &SdramArray {
        self.ctrl.mem()
    }

    /// Mutable untimed storage access for preload.
    pub fn mem_mut(&mut self) -> &mut SdramArray {
        self.ctrl.mem_mut()
    }

    /// Forces the controller back to its power-up sequence and discards
    /// all grants and pending requests. Memory contents survive.
    pub fn reset(&mut self) {
        self.ctrl.reset();
        self.arbiter.reset();
        self.last_state = self.ctrl.state();
    }

    /// Advances the whole system by one channel-clock cycle.
    pub fn step(&mut self) -> Result<(), TimingViolation> {
        self.cycle += 1;
        self.arbiter.drive(&mut self.ctrl);
        self.ctrl.step(self.cycle)?;
        let granted = self.arbiter.granted();
        self.arbiter.collect(&self.ctrl);

        if self.trace {
            self.trace_cycle(granted);
        }
        self.last_state = self.ctrl.state();
        Ok(())
    }

    /// Runs `cycles` steps, stopping at the first timing violation.
    pub fn run(&mut self, cycles: u64) -> Result<(), TimingViolation> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Steps until the controller reports ready, up to `limit` cycles.
    ///
    /// Returns `true` if ready was observed. Used to skip the power-up
    /// sequence and refresh windows.
    pub fn run_until_ready(&mut self, limit: u64) -> Result<bool, TimingViolation> {
        for _ in 0..limit {
            self.step()?;
            if self.ctrl.out.ready {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A statistics snapshot of the current counters.
    pub fn stats(&self) -> SimStats {
        SimStats::collect(
            self.cycle,
            &self.arbiter.counters,
            &self.ctrl.counters,
            self.start_time,
        )
    }

    fn trace_cycle(&self, granted: Option<usize>) {
        if let Some(g) = granted {
            if self.ctrl.out.accepted {
                eprintln!(
                    "ARB cycle={} grant port={} ({})",
                    self.cycle, g, PORT_NAMES[g]
                );
            }
            if self.ctrl.out.word_valid {
                eprintln!(
                    "MEM cycle={} port={} word={:#06x}",
                    self.cycle, g, self.ctrl.out.word_data
                );
            }
            if self.ctrl.out.ack {
                eprintln!(
                    "MEM cycle={} ack port={} words={}",
                    self.cycle, g, self.ctrl.out.words_done
                );
            }
        }
        if self.ctrl.state() == CtrlState::Refresh && self.last_state != CtrlState::Refresh {
            eprintln!("MEM cycle={} refresh", self.cycle);
        }
    }
}
