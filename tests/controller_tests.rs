//! Unit tests for the channel controller command sequencer.
//!
//! The controller is driven directly through its signal interface, the
//! way the arbiter drives it: write `input`, call `step`, read `out`.

use sdram_arbiter::config::TimingConfig;
use sdram_arbiter::sdram::controller::{ChannelController, CtrlState};

/// A controller with a shortened settle period plus a cycle counter.
struct Harness {
    ctrl: ChannelController,
    now: u64,
}

impl Harness {
    fn new() -> Self {
        let timing = TimingConfig {
            init_settle: 4,
            ..TimingConfig::default()
        };
        Self {
            ctrl: ChannelController::new(timing),
            now: 0,
        }
    }

    fn step(&mut self) {
        self.now += 1;
        self.ctrl.step(self.now).unwrap();
    }

    fn run_until_ready(&mut self, limit: u64) -> bool {
        for _ in 0..limit {
            self.step();
            if self.ctrl.out.ready {
                return true;
            }
        }
        false
    }

    /// Steps until `ack`, returning the number of cycles it took.
    fn step_until_ack(&mut self, limit: u64) -> u64 {
        for i in 1..=limit {
            self.step();
            if self.ctrl.out.ack {
                return i;
            }
        }
        panic!("no ack within {} cycles", limit);
    }
}

/// Tests that the init sequence holds off ready until it completes.
#[test]
fn test_init_sequence() {
    let mut h = Harness::new();
    assert_eq!(h.ctrl.state(), CtrlState::Init);
    h.step();
    assert!(!h.ctrl.out.ready);

    // settle(4) + precharge-all(2) + two refreshes(6 each) + mode(2).
    assert!(h.run_until_ready(30));
    assert_eq!(h.ctrl.state(), CtrlState::Idle);
    assert_eq!(h.now, 20);
}

/// Tests a legacy single write followed by a read of the same address.
#[test]
fn test_single_write_then_read_back() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));

    h.ctrl.input.req = true;
    h.ctrl.input.we = true;
    h.ctrl.input.addr = 0x008;
    h.ctrl.input.len = 0;
    h.ctrl.input.wdata32 = 0xDEAD_5678;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let cycles = if h.ctrl.out.ack { 0 } else { h.step_until_ack(10) };
    assert_eq!(cycles, 2); // activate + tRCD
    assert_eq!(h.ctrl.out.words_done, 2);

    // Two columns, low half first.
    assert_eq!(h.ctrl.mem().read_word(0x008), 0x5678);
    assert_eq!(h.ctrl.mem().read_word(0x009), 0xDEAD);

    // Read back; the row is still open, so no activate is needed.
    h.ctrl.input.req = true;
    h.ctrl.input.we = false;
    h.ctrl.input.wdata32 = 0;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let mut saw_word_valid = false;
    let mut cycles = 0;
    while !h.ctrl.out.ack {
        h.step();
        cycles += 1;
        saw_word_valid |= h.ctrl.out.word_valid;
        assert!(cycles < 10);
    }
    assert_eq!(cycles, 3); // CAS latency only
    assert_eq!(h.ctrl.out.rdata32, 0xDEAD_5678);
    assert_eq!(h.ctrl.out.words_done, 2);
    // Singles deliver through rdata32, never the word pulse.
    assert!(!saw_word_valid);
    assert_eq!(h.ctrl.counters.row_hits, 1);
    assert_eq!(h.ctrl.counters.activates, 1);
}

/// Tests single-read latency into a closed bank: tRCD + CAS latency.
#[test]
fn test_single_read_latency_closed_bank() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));
    h.ctrl.mem_mut().write_word32(0x100, 0x1234_ABCD);

    h.ctrl.input.req = true;
    h.ctrl.input.addr = 0x100;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    assert_eq!(h.step_until_ack(10), 5);
    assert_eq!(h.ctrl.out.rdata32, 0x1234_ABCD);
}

/// Tests burst read first-word latency and one-word-per-cycle streaming.
#[test]
fn test_burst_read_streaming() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));
    let pattern = [0x1111u16, 0x2222, 0x3333, 0x4444];
    h.ctrl.mem_mut().fill(0x40, &pattern);

    h.ctrl.input.req = true;
    h.ctrl.input.addr = 0x40;
    h.ctrl.input.len = 4;
    let accept_cycle = h.now + 1;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let mut words = Vec::new();
    let mut valid_cycles = Vec::new();
    while !h.ctrl.out.ack {
        h.step();
        if h.ctrl.out.word_valid {
            words.push(h.ctrl.out.word_data);
            valid_cycles.push(h.now);
        }
        assert!(h.now < accept_cycle + 20);
    }
    assert_eq!(words, pattern);
    assert!(h.ctrl.out.burst_done);
    assert_eq!(h.ctrl.out.words_done, 4);

    // First word tRCD + CAS after acceptance, the rest back to back.
    assert_eq!(valid_cycles[0], accept_cycle + 5);
    assert_eq!(valid_cycles[3], accept_cycle + 8);
}

/// Tests burst write word pulls and the stored result.
#[test]
fn test_burst_write_word_pulls() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));
    let payload = [0xA0A0u16, 0xB1B1, 0xC2C2];

    h.ctrl.input.req = true;
    h.ctrl.input.we = true;
    h.ctrl.input.addr = 0x80;
    h.ctrl.input.len = 3;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let mut pulls = 0;
    for _ in 0..20 {
        if h.ctrl.out.word_requested {
            pulls += 1;
        }
        h.ctrl.input.burst_wdata = payload
            .get(h.ctrl.out.words_done as usize)
            .copied()
            .unwrap_or(0);
        h.step();
        if h.ctrl.out.ack {
            break;
        }
    }
    assert!(h.ctrl.out.ack);
    assert!(h.ctrl.out.burst_done);
    assert_eq!(h.ctrl.out.words_done, 3);
    assert_eq!(pulls, 3);
    assert_eq!(h.ctrl.mem().read_word(0x80), 0xA0A0);
    assert_eq!(h.ctrl.mem().read_word(0x81), 0xB1B1);
    assert_eq!(h.ctrl.mem().read_word(0x82), 0xC2C2);
}

/// Tests that cancel truncates a read burst and acks within three cycles.
#[test]
fn test_cancel_truncates_read_burst() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));
    h.ctrl.mem_mut().fill(0x100, &[0x5A5A; 16]);

    h.ctrl.input.req = true;
    h.ctrl.input.addr = 0x100;
    h.ctrl.input.len = 16;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let mut delivered = 0;
    while delivered < 3 {
        h.step();
        if h.ctrl.out.word_valid {
            delivered += 1;
        }
    }

    h.ctrl.input.cancel = true;
    let mut cancel_to_ack = 0;
    while !h.ctrl.out.ack {
        h.step();
        cancel_to_ack += 1;
        assert!(!h.ctrl.out.word_valid);
        assert!(cancel_to_ack <= 3);
    }
    h.ctrl.input.cancel = false;
    assert_eq!(h.ctrl.out.words_done, 3);
    assert!(!h.ctrl.out.burst_done);

    // The row was closed on the way out; a fresh transfer reopens it.
    h.ctrl.input.req = true;
    h.ctrl.input.len = 2;
    for _ in 0..10 {
        h.step();
        if h.ctrl.out.accepted {
            break;
        }
    }
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;
    h.step_until_ack(20);
    assert_eq!(h.ctrl.counters.activates, 2);
}

/// Tests that a burst overrunning the row wraps to its first column.
#[test]
fn test_burst_wraps_within_row() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));

    // Row 2 of bank 0: columns 510, 511, then 0 and 1 of the same row.
    let base = 2u32 << 9;
    h.ctrl.mem_mut().write_word(base + 510, 0xAAAA);
    h.ctrl.mem_mut().write_word(base + 511, 0xBBBB);
    h.ctrl.mem_mut().write_word(base, 0xCCCC);
    h.ctrl.mem_mut().write_word(base + 1, 0xDDDD);

    h.ctrl.input.req = true;
    h.ctrl.input.addr = base + 510;
    h.ctrl.input.len = 4;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;

    let mut words = Vec::new();
    while !h.ctrl.out.ack {
        h.step();
        if h.ctrl.out.word_valid {
            words.push(h.ctrl.out.word_data);
        }
        assert!(words.len() <= 4);
    }
    assert_eq!(words, vec![0xAAAA, 0xBBBB, 0xCCCC, 0xDDDD]);
}

/// Tests refresh periodicity and the channel block it causes.
#[test]
fn test_refresh_periodicity() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));

    let mut refresh_entries = Vec::new();
    let mut in_refresh = false;
    for _ in 0..2000 {
        h.step();
        let refreshing = h.ctrl.state() == CtrlState::Refresh;
        if refreshing {
            assert!(!h.ctrl.out.ready);
        }
        if refreshing && !in_refresh {
            refresh_entries.push(h.now);
        }
        in_refresh = refreshing;
    }
    assert_eq!(refresh_entries.len(), 2);
    assert_eq!(refresh_entries[1] - refresh_entries[0], 781);
    assert_eq!(h.ctrl.counters.refreshes, 2);
}

/// Tests that a due refresh wins over a simultaneous request.
#[test]
fn test_refresh_wins_request_race() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));

    while h.ctrl.refresh_counter() < 780 {
        h.step();
    }

    // The request shows up exactly as the obligation comes due.
    h.ctrl.input.req = true;
    h.ctrl.input.addr = 0x40;
    h.ctrl.input.len = 2;
    h.step();
    assert!(!h.ctrl.out.accepted);
    assert_eq!(h.ctrl.state(), CtrlState::Refresh);

    // Held request is accepted once the refresh window closes.
    let mut waited = 0;
    while !h.ctrl.out.accepted {
        h.step();
        waited += 1;
        assert!(waited < 20);
    }
    h.ctrl.input.req = false;
    assert_eq!(h.ctrl.counters.refreshes, 1);
}

/// Tests that reset discards the transfer but keeps memory contents.
#[test]
fn test_reset_returns_to_init() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));
    h.ctrl.mem_mut().write_word32(0x008, 0xCAFE_F00D);

    h.ctrl.input.req = true;
    h.ctrl.input.addr = 0x008;
    h.ctrl.input.len = 8;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;
    h.step();

    h.ctrl.reset();
    assert_eq!(h.ctrl.state(), CtrlState::Init);
    assert!(!h.ctrl.out.ready);
    assert!(h.run_until_ready(30));
    assert_eq!(h.ctrl.mem().read_word32(0x008), 0xCAFE_F00D);
}

/// Tests row-buffer reuse against a row conflict in the same bank.
#[test]
fn test_row_conflict_closes_and_reopens() {
    let mut h = Harness::new();
    assert!(h.run_until_ready(30));

    h.ctrl.input.req = true;
    h.ctrl.input.we = true;
    h.ctrl.input.addr = 0x000; // bank 0, row 0
    h.ctrl.input.len = 0;
    h.ctrl.input.wdata32 = 1;
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;
    if !h.ctrl.out.ack {
        h.step_until_ack(10);
    }

    // Same bank, different row: forces precharge + activate.
    h.ctrl.input.req = true;
    h.ctrl.input.addr = 5 << 9; // bank 0, row 5
    h.step();
    assert!(h.ctrl.out.accepted);
    h.ctrl.input.req = false;
    h.step_until_ack(20);

    assert_eq!(h.ctrl.counters.row_misses, 2);
    assert_eq!(h.ctrl.counters.precharges, 1);
    assert_eq!(h.ctrl.counters.activates, 2);
}
