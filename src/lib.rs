//! GPU Shared-Memory Access Scheduler Library.
//!
//! This crate implements a cycle-stepped simulator for the shared-memory
//! access path of a small GPU: four request ports multiplexed by a
//! strict-priority arbiter onto a single SDRAM channel controller that
//! models a 32 MB, 16-bit-wide part at the command level.
//!
//! # Architecture
//!
//! * **Arbiter**: fixed-priority ordered scan over four ports, with
//!   mid-burst preemption of lower-priority transfers.
//! * **Controller**: power-up init, row activate/precharge, CAS-latency
//!   read streaming, write streaming, burst cancel, periodic refresh.
//! * **Banks**: four independent open-row state machines with checked
//!   minimum-delay constraints; a violation is a fatal design defect.
//!
//! # Modules
//!
//! * `common`: Shared address, request, and error types.
//! * `config`: Configuration loading and parsing.
//! * `arbiter`: Port latches and the strict-priority arbiter.
//! * `sdram`: Storage array, bank model, and channel controller.
//! * `system`: Top-level wiring and the cycle-step loop.
//! * `stats`: Simulation statistics collection.

/// Shared address decomposition, request, and timing-error types.
///
/// Provides the word-address split into bank, row, and column, the
/// request structure clients present on ports, and the timing-violation
/// error hierarchy used throughout the simulator.
pub mod common;

/// Configuration system for timing parameters and simulation options.
///
/// Loads and parses TOML configuration files; every parameter defaults
/// to the reference 100 MHz part so an empty file is a valid setup.
pub mod config;

/// Port latches and the four-port strict-priority arbiter.
pub mod arbiter;

/// SDRAM channel components: storage array, bank timing model, and the
/// channel controller command sequencer.
pub mod sdram;

/// Top-level memory system wiring and the cycle-step loop.
pub mod system;

/// Simulation statistics collection and reporting.
pub mod stats;
