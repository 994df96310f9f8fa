//! GPU Memory Scheduler Simulator CLI.
//!
//! The main executable for the simulator. It parses command-line
//! arguments, loads the TOML configuration, and runs a synthetic GPU
//! workload against the memory system: display scanout reads on port 0,
//! framebuffer draw writes on port 1, depth traffic on port 2, and
//! texture fetch reads on port 3.
//!
//! A timing violation reported by the controller is fatal: the run stops
//! immediately with the statistics collected so far.

use clap::Parser;
use std::{fs, process};

extern crate sdram_arbiter;

use sdram_arbiter::arbiter::{PORT_DEPTH, PORT_DISPLAY, PORT_FRAMEBUFFER, PORT_TEXTURE};
use sdram_arbiter::common::data::Request;
use sdram_arbiter::config::Config;
use sdram_arbiter::system::MemorySystem;

/// Command-line arguments for the memory scheduler simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "GPU Shared-Memory Access Scheduler Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Number of channel-clock cycles to simulate.
    #[arg(short = 'n', long, default_value_t = 100_000)]
    cycles: u64,

    /// Emit the statistics snapshot as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Per-cycle trace output, overriding the configuration file.
    #[arg(long)]
    trace: bool,
}

/// A synthetic burst traffic source bound to one port.
///
/// Issues fixed-length bursts through a striding cursor, waits for the
/// ack, and reissues the remainder whenever the burst was truncated by a
/// higher-priority preemption.
struct TrafficGen {
    port: usize,
    write: bool,
    /// Alternate read/write each burst (depth read-modify-write traffic).
    alternate: bool,
    region_base: u32,
    region_words: u32,
    burst_len: u16,
    interval: u64,

    cursor: u32,
    current: (u32, u16),
    in_flight: bool,
    wait_until: u64,
    bursts_completed: u64,
}

impl TrafficGen {
    fn new(
        port: usize,
        write: bool,
        alternate: bool,
        region_base: u32,
        region_words: u32,
        burst_len: u16,
        interval: u64,
    ) -> Self {
        Self {
            port,
            write,
            alternate,
            region_base,
            region_words,
            burst_len,
            interval,
            cursor: 0,
            current: (region_base, burst_len),
            in_flight: false,
            wait_until: 0,
            bursts_completed: 0,
        }
    }

    fn next_addr(&mut self) -> u32 {
        self.cursor = (self.cursor + self.burst_len as u32) % self.region_words;
        self.region_base + self.cursor
    }

    fn payload(addr: u32, len: u16) -> Vec<u16> {
        (0..len).map(|i| (addr as u16).wrapping_add(i) ^ 0xA5A5).collect()
    }

    fn tick(&mut self, sys: &mut MemorySystem) {
        if self.in_flight {
            let out = sys.port(self.port);
            if !out.ack {
                return;
            }
            self.in_flight = false;
            let (addr, len) = self.current;
            let done = out.words_done.min(len);
            if done < len {
                // Preempted: pick up where the truncated burst stopped.
                self.current = (addr + done as u32, len - done);
            } else {
                self.bursts_completed += 1;
                if self.alternate {
                    // Modify-write pass revisits the range just read.
                    self.write = !self.write;
                }
                let next = if self.alternate && self.write {
                    addr
                } else {
                    self.next_addr()
                };
                self.current = (next, self.burst_len);
                self.wait_until = sys.cycle() + self.interval;
            }
            return;
        }

        if sys.cycle() < self.wait_until {
            return;
        }
        let (addr, len) = self.current;
        let req = if self.write {
            Request::write_burst(addr, Self::payload(addr, len))
        } else {
            Request::read_burst(addr, len)
        };
        if sys.submit(self.port, req) {
            self.in_flight = true;
        }
    }
}

fn main() {
    let args = Args::parse();

    let config_text = match fs::read_to_string(&args.config) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("\n[!] FATAL: Could not read config '{}': {}", args.config, e);
            process::exit(1);
        }
    };
    let mut config = match Config::from_toml(&config_text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n[!] FATAL: Could not parse config '{}': {}", args.config, e);
            process::exit(1);
        }
    };
    if args.trace {
        config.general.trace = true;
    }

    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Trace:              {}", config.general.trace);
    println!("Timing (cycles):");
    println!("  tRCD:               {}", config.timing.t_rcd);
    println!("  CAS Latency:        {}", config.timing.cas_latency);
    println!("  tRP:                {}", config.timing.t_rp);
    println!("  tRAS:               {}", config.timing.t_ras);
    println!("  tRC:                {}", config.timing.t_rc);
    println!("  tWR:                {}", config.timing.t_wr);
    println!("  Refresh Interval:   {}", config.timing.refresh_interval);
    println!("  Refresh Duration:   {}", config.timing.refresh_duration);
    println!("  Init Settle:        {}", config.timing.init_settle);
    println!("Memory:");
    println!("  Max Burst:          {} words", config.memory.max_burst);
    println!("--------------------");

    let mut sys = MemorySystem::new(&config);

    // Scanout refills a line buffer at a steady rate; draw, depth, and
    // texture traffic compete for whatever is left.
    let mut gens = [
        TrafficGen::new(PORT_DISPLAY, false, false, 0x00_0000, 0x4_B000, 32, 160),
        TrafficGen::new(PORT_FRAMEBUFFER, true, false, 0x10_0000, 0x4_B000, 16, 24),
        TrafficGen::new(PORT_DEPTH, false, true, 0x20_0000, 0x4_B000, 16, 40),
        TrafficGen::new(PORT_TEXTURE, false, false, 0x80_0000, 0x10_0000, 64, 8),
    ];

    println!("[*] Running {} cycles", args.cycles);
    for _ in 0..args.cycles {
        if let Err(e) = sys.step() {
            eprintln!("\n[!] FATAL TIMING VIOLATION: {}", e);
            sys.stats().print();
            process::exit(1);
        }
        for gen in &mut gens {
            gen.tick(&mut sys);
        }
    }

    for gen in &gens {
        println!(
            "[*] port {} completed {} bursts",
            gen.port, gen.bursts_completed
        );
    }
    println!("[*] {} words populated", sys.mem().populated_words());

    let stats = sys.stats();
    stats.print();
    if args.json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("\n[!] FATAL: Could not serialize statistics: {}", e);
                process::exit(1);
            }
        }
    }
}
