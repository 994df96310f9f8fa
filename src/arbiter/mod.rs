//! Strict-Priority Port Arbiter.
//!
//! Multiplexes the four request ports onto the single channel controller.
//! Priority is fixed by port number, port 0 highest: an ordered scan of
//! the pending latches picks the winner, and a pending request on a
//! higher-priority port preempts an in-flight burst by asserting the
//! controller's cancel line. The preempted port observes `ack` with a
//! truncated word count and is responsible for reissuing the remainder;
//! under a saturating high-priority port, lower ports starve by design.
//!
//! The arbiter runs in two phases around the controller step: `drive`
//! presents the winning request (or the cancel line and the next write
//! word) on [`CtrlIn`], and `collect` routes [`CtrlOut`] back to the
//! granted port only.

use crate::common::data::Direction;
use crate::sdram::controller::{ChannelController, CtrlIn};

pub mod port;

pub use port::{Port, PortOut, PORT_COUNT, PORT_DEPTH, PORT_DISPLAY, PORT_FRAMEBUFFER,
    PORT_NAMES, PORT_TEXTURE};

/// Arbiter state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbState {
    /// No port granted.
    Idle,
    /// A winner holds the channel request, not yet accepted.
    Grant,
    /// The granted transfer is in flight.
    Burst,
}

/// Grant and preemption counters for statistics reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArbCounters {
    /// Accepted transfers per port.
    pub grants: [u64; PORT_COUNT],
    /// Bursts truncated in favor of a higher-priority port.
    pub preemptions: u64,
}

/// The four-port strict-priority arbiter.
#[derive(Debug)]
pub struct Arbiter {
    /// The request ports, index = priority (0 highest).
    pub ports: [Port; PORT_COUNT],
    /// Grant and preemption counters.
    pub counters: ArbCounters,

    state: ArbState,
    granted: Option<usize>,
    preempting: bool,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Arbiter {
    /// Creates an arbiter with all ports empty.
    pub fn new() -> Self {
        Self {
            ports: Default::default(),
            counters: ArbCounters::default(),
            state: ArbState::Idle,
            granted: None,
            preempting: false,
        }
    }

    /// Current state, for inspection by tests.
    pub fn state(&self) -> ArbState {
        self.state
    }

    /// The port currently holding the grant, if any.
    pub fn granted(&self) -> Option<usize> {
        self.granted
    }

    /// Discards all grants and pending requests. Counters are retained.
    pub fn reset(&mut self) {
        self.ports = Default::default();
        self.state = ArbState::Idle;
        self.granted = None;
        self.preempting = false;
    }

    /// Highest-priority port with a pending request, by ordered scan.
    fn highest_pending(&self) -> Option<usize> {
        (0..PORT_COUNT).find(|&p| self.ports[p].pending().is_some())
    }

    /// Drive phase: present the winning request on the controller inputs.
    ///
    /// Must run before the controller step of the same cycle.
    pub fn drive(&mut self, ctrl: &mut ChannelController) {
        ctrl.input = CtrlIn::default();

        match self.state {
            ArbState::Idle => {
                if ctrl.out.ready {
                    if let Some(winner) = self.highest_pending() {
                        self.granted = Some(winner);
                        self.state = ArbState::Grant;
                    }
                }
            }
            ArbState::Grant => {
                // Nothing is committed until the controller accepts, so a
                // newly pending higher-priority port steals the grant.
                if let (Some(g), Some(hp)) = (self.granted, self.highest_pending()) {
                    if hp < g {
                        self.granted = Some(hp);
                    }
                }
            }
            ArbState::Burst => {}
        }

        let Some(g) = self.granted else {
            return;
        };
        let Some(req) = self.ports[g].pending() else {
            return;
        };

        match self.state {
            ArbState::Grant => {
                // Held until the controller pulses `accepted`; a refresh
                // winning the same-cycle race just defers acceptance.
                ctrl.input.req = true;
                ctrl.input.we = req.dir == Direction::Write;
                ctrl.input.addr = req.addr;
                ctrl.input.len = req.len;
                ctrl.input.wdata32 = req.wdata32;
            }
            ArbState::Burst => {
                let next = ctrl.out.words_done as usize;
                ctrl.input.burst_wdata = req.payload.get(next).copied().unwrap_or(0);

                // Mid-burst preemption: cancel at the next word boundary
                // when a strictly higher-priority port is waiting. Legacy
                // singles are atomic and never cancelled.
                if req.len > 0 {
                    if let Some(hp) = self.highest_pending() {
                        if hp < g {
                            ctrl.input.cancel = true;
                            if !self.preempting {
                                self.preempting = true;
                                self.counters.preemptions += 1;
                            }
                        }
                    }
                }
            }
            ArbState::Idle => {}
        }
    }

    /// Collect phase: route the controller outputs to the granted port.
    ///
    /// Must run after the controller step of the same cycle.
    pub fn collect(&mut self, ctrl: &ChannelController) {
        for p in &mut self.ports {
            p.clear_pulses();
        }

        if let Some(g) = self.granted {
            if ctrl.out.accepted {
                self.state = ArbState::Burst;
                self.counters.grants[g] += 1;
            }

            let out = &mut self.ports[g].out;
            out.words_done = ctrl.out.words_done;
            out.word_valid = ctrl.out.word_valid;
            out.word_data = ctrl.out.word_data;
            out.word_requested = ctrl.out.word_requested;
            out.rdata32 = ctrl.out.rdata32;
            out.burst_done = ctrl.out.burst_done;

            if ctrl.out.ack {
                out.ack = true;
                self.ports[g].clear_pending();
                self.granted = None;
                self.state = ArbState::Idle;
                self.preempting = false;
            }
        }

        // A port is ready when it is empty and a new request would be
        // served without queueing behind an equal-or-lower priority
        // grant: either the channel is free, or the request would
        // preempt the current holder.
        let chan_ready = ctrl.out.ready;
        let granted = self.granted;
        for (p, port) in self.ports.iter_mut().enumerate() {
            let would_preempt = matches!(granted, Some(g) if p < g);
            port.out.ready = port.pending().is_none() && (chan_ready || would_preempt);
        }
    }
}
