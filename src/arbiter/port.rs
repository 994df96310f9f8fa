//! Request ports and their client-facing signals.
//!
//! Each of the four ports carries at most one outstanding request and a
//! set of response signals mirroring the controller interface. Ports are
//! passive latches; all sequencing decisions live in the arbiter.

use crate::common::data::Request;

/// Number of request ports.
pub const PORT_COUNT: usize = 4;

/// Display refill port, highest priority.
pub const PORT_DISPLAY: usize = 0;
/// Framebuffer draw port.
pub const PORT_FRAMEBUFFER: usize = 1;
/// Depth buffer port.
pub const PORT_DEPTH: usize = 2;
/// Texture fetch port, lowest priority.
pub const PORT_TEXTURE: usize = 3;

/// Port names for trace and statistics output, indexed by port number.
pub const PORT_NAMES: [&str; PORT_COUNT] = ["display", "framebuffer", "depth", "texture"];

/// Response signals a port presents to its client, valid after each step.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortOut {
    /// The port can take a new request.
    pub ready: bool,
    /// One-cycle pulse: the request completed; `words_done` holds the
    /// final (possibly truncated) word count.
    pub ack: bool,
    /// Words transferred so far; final count at `ack`.
    pub words_done: u16,
    /// One-cycle pulse: `word_data` carries a valid burst read word.
    pub word_valid: bool,
    /// Burst read data, valid with `word_valid`.
    pub word_data: u16,
    /// Assembled result of a legacy single read, valid at `ack`.
    pub rdata32: u32,
    /// One-cycle pulse: the client must supply the next burst write word.
    pub word_requested: bool,
    /// One-cycle pulse with `ack` when the burst ran to its full length.
    pub burst_done: bool,
}

/// One request port: a single-entry request latch plus response signals.
#[derive(Debug, Default)]
pub struct Port {
    /// Client-visible response signals.
    pub out: PortOut,
    pending: Option<Request>,
}

impl Port {
    /// Creates an empty port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches `req` into the port.
    ///
    /// Returns `false` without latching if a request is already
    /// outstanding; the client must wait for `ack`.
    pub fn submit(&mut self, req: Request) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(req);
        true
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<&Request> {
        self.pending.as_ref()
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = None;
    }

    pub(crate) fn clear_pulses(&mut self) {
        self.out.ack = false;
        self.out.word_valid = false;
        self.out.word_requested = false;
        self.out.burst_done = false;
    }
}
