//! SDRAM channel components.
//!
//! This module implements the leaf layer of the memory system: the word
//! storage array, the per-bank open-row and timing bookkeeping, and the
//! channel controller that sequences activate / column / precharge /
//! refresh commands against them.

/// Sparse word-addressed storage array.
pub mod array;

/// Per-bank open-row state and timing-constraint model.
pub mod bank;

/// Channel controller command sequencer.
pub mod controller;

pub use array::SdramArray;
pub use bank::BankSet;
pub use controller::{ChannelController, CtrlIn, CtrlOut, CtrlState};
