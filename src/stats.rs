//! Simulation statistics collection and reporting.

use std::time::Instant;

use serde::Serialize;

use crate::arbiter::{ArbCounters, PORT_COUNT, PORT_NAMES};
use crate::sdram::controller::CtrlCounters;

/// A snapshot of the counters kept by the arbiter and the controller,
/// plus the wall-clock start time for throughput reporting.
#[derive(Debug, Serialize)]
pub struct SimStats {
    /// Channel-clock cycles simulated.
    pub cycles: u64,
    /// Accepted transfers per port.
    pub grants: [u64; PORT_COUNT],
    /// Bursts truncated by a higher-priority port.
    pub preemptions: u64,
    /// Row activate commands issued.
    pub activates: u64,
    /// Precharge commands issued.
    pub precharges: u64,
    /// Refresh commands issued after init.
    pub refreshes: u64,
    /// Transfers that reused an already-open row.
    pub row_hits: u64,
    /// Transfers that had to open their row.
    pub row_misses: u64,
    /// Column reads performed.
    pub words_read: u64,
    /// Column writes performed.
    pub words_written: u64,
    /// Host time at simulation start.
    #[serde(skip)]
    pub start_time: Instant,
}

impl SimStats {
    /// Assembles a snapshot from the component counters.
    pub fn collect(cycles: u64, arb: &ArbCounters, ctrl: &CtrlCounters, start_time: Instant) -> Self {
        Self {
            cycles,
            grants: arb.grants,
            preemptions: arb.preemptions,
            activates: ctrl.activates,
            precharges: ctrl.precharges,
            refreshes: ctrl.refreshes,
            row_hits: ctrl.row_hits,
            row_misses: ctrl.row_misses,
            words_read: ctrl.words_read,
            words_written: ctrl.words_written,
            start_time,
        }
    }

    /// Prints the human-readable report.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let khz = if seconds > 0.0 {
            self.cycles as f64 / seconds / 1_000.0
        } else {
            0.0
        };
        let words = self.words_read + self.words_written;
        let utilization = if self.cycles > 0 {
            100.0 * words as f64 / self.cycles as f64
        } else {
            0.0
        };
        let opens = self.row_hits + self.row_misses;
        let hit_rate = if opens > 0 {
            100.0 * self.row_hits as f64 / opens as f64
        } else {
            0.0
        };

        println!("\n==========================================================");
        println!("MEMORY SYSTEM SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("words_read               {}", self.words_read);
        println!("words_written            {}", self.words_written);
        println!("data_bus_utilization     {:.2}%", utilization);
        println!("----------------------------------------------------------");
        println!("ARBITER");
        for (port, name) in PORT_NAMES.iter().enumerate() {
            println!("  grants.{:<16} {}", name, self.grants[port]);
        }
        println!("  preemptions            {}", self.preemptions);
        println!("----------------------------------------------------------");
        println!("CHANNEL");
        println!("  activates              {}", self.activates);
        println!("  precharges             {}", self.precharges);
        println!("  refreshes              {}", self.refreshes);
        println!("  row_hits               {}", self.row_hits);
        println!("  row_misses             {}", self.row_misses);
        println!("  row_hit_rate           {:.2}%", hit_rate);
        println!("==========================================================");
    }
}
