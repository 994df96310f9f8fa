//! Transfer Direction and Request Types.
//!
//! This module defines the request structure a client presents on its port
//! and the direction classification used by the arbiter and the channel
//! controller when sequencing commands.

/// Direction of a memory transfer.
///
/// Used by the arbiter to route word pulses and by the controller to pick
/// between the column-read and column-write sequencing paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Column-read transfer; data flows bank -> controller -> client.
    Read,

    /// Column-write transfer; data flows client -> controller -> bank.
    Write,
}

/// A client request as presented on a port.
///
/// `len == 0` selects the legacy single access: two sequential columns
/// assembled into (or split from) one 32-bit value, low half first. Any
/// other `len` is a burst of that many 16-bit words.
#[derive(Clone, Debug)]
pub struct Request {
    /// Transfer direction.
    pub dir: Direction,
    /// Starting 24-bit word address.
    pub addr: u32,
    /// Burst length in words; 0 = legacy single 32-bit access.
    pub len: u16,
    /// 32-bit payload for legacy single writes.
    pub wdata32: u32,
    /// Burst write payload, one entry per word of `len`.
    pub payload: Vec<u16>,
}

impl Request {
    /// Builds a legacy single 32-bit read (length 0).
    pub fn read32(addr: u32) -> Self {
        Self {
            dir: Direction::Read,
            addr,
            len: 0,
            wdata32: 0,
            payload: Vec::new(),
        }
    }

    /// Builds a legacy single 32-bit write (length 0).
    pub fn write32(addr: u32, value: u32) -> Self {
        Self {
            dir: Direction::Write,
            addr,
            len: 0,
            wdata32: value,
            payload: Vec::new(),
        }
    }

    /// Builds a burst read of `len` words.
    pub fn read_burst(addr: u32, len: u16) -> Self {
        Self {
            dir: Direction::Read,
            addr,
            len,
            wdata32: 0,
            payload: Vec::new(),
        }
    }

    /// Builds a burst write; the burst length is the payload length.
    pub fn write_burst(addr: u32, payload: Vec<u16>) -> Self {
        Self {
            dir: Direction::Write,
            addr,
            len: payload.len() as u16,
            wdata32: 0,
            payload,
        }
    }

    /// Number of column operations this request resolves to.
    ///
    /// The legacy single access is exactly two columns (low half, high
    /// half) treated by the client as one wide word.
    pub fn column_count(&self) -> u16 {
        if self.len == 0 {
            2
        } else {
            self.len
        }
    }
}
