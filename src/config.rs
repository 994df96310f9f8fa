//! Configuration loading and parsing.
//!
//! TOML-backed configuration for the channel timing parameters, the
//! memory geometry, and general simulation options. Every field has a
//! default matching the reference part (a 32 MB, 16-bit-wide SDRAM at a
//! 100 MHz channel clock), so an empty configuration file yields a fully
//! usable system.

use serde::Deserialize;

use crate::sdram::bank::BankTiming;

const T_RCD: u64 = 2;
const CAS_LATENCY: u64 = 3;
const T_RP: u64 = 2;
const T_RAS: u64 = 5;
const T_RC: u64 = 7;
const T_WR: u64 = 2;
const T_MRD: u64 = 2;

// 8192 refreshes per 64 ms at 100 MHz = 781.25 cycles per refresh.
const REFRESH_INTERVAL: u64 = 781;
const REFRESH_DURATION: u64 = 6;
const INIT_SETTLE: u64 = 200;

const MAX_BURST: u16 = 256;

/// Top-level simulator configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// General simulation options.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Channel timing parameters.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Memory geometry limits.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// General simulation options.
#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Print per-cycle arbiter and controller trace lines.
    #[serde(default)]
    pub trace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { trace: false }
    }
}

/// Channel timing parameters, all in channel-clock cycles.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TimingConfig {
    /// Activate to column command (row-to-column delay).
    #[serde(default = "d_t_rcd")]
    pub t_rcd: u64,

    /// Read command to first data word (CAS latency).
    #[serde(default = "d_cas")]
    pub cas_latency: u64,

    /// Precharge to activate.
    #[serde(default = "d_t_rp")]
    pub t_rp: u64,

    /// Minimum row active time before precharge.
    #[serde(default = "d_t_ras")]
    pub t_ras: u64,

    /// Activate to activate, same bank.
    #[serde(default = "d_t_rc")]
    pub t_rc: u64,

    /// Write recovery before precharge.
    #[serde(default = "d_t_wr")]
    pub t_wr: u64,

    /// Mode-register programming delay.
    #[serde(default = "d_t_mrd")]
    pub t_mrd: u64,

    /// Cycles between refresh obligations.
    #[serde(default = "d_refresh_interval")]
    pub refresh_interval: u64,

    /// Cycles a refresh keeps the channel busy.
    #[serde(default = "d_refresh_duration")]
    pub refresh_duration: u64,

    /// Power-up settle period before the init command sequence.
    #[serde(default = "d_init_settle")]
    pub init_settle: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            t_rcd: T_RCD,
            cas_latency: CAS_LATENCY,
            t_rp: T_RP,
            t_ras: T_RAS,
            t_rc: T_RC,
            t_wr: T_WR,
            t_mrd: T_MRD,
            refresh_interval: REFRESH_INTERVAL,
            refresh_duration: REFRESH_DURATION,
            init_settle: INIT_SETTLE,
        }
    }
}

impl TimingConfig {
    /// The subset of parameters enforced by the bank model.
    pub fn bank_timing(&self) -> BankTiming {
        BankTiming {
            t_rcd: self.t_rcd,
            t_rp: self.t_rp,
            t_ras: self.t_ras,
            t_rc: self.t_rc,
            t_wr: self.t_wr,
        }
    }
}

/// Memory geometry limits.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct MemoryConfig {
    /// Longest burst a port may request, in words.
    #[serde(default = "d_max_burst")]
    pub max_burst: u16,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_burst: MAX_BURST,
        }
    }
}

fn d_t_rcd() -> u64 {
    T_RCD
}

fn d_cas() -> u64 {
    CAS_LATENCY
}

fn d_t_rp() -> u64 {
    T_RP
}

fn d_t_ras() -> u64 {
    T_RAS
}

fn d_t_rc() -> u64 {
    T_RC
}

fn d_t_wr() -> u64 {
    T_WR
}

fn d_t_mrd() -> u64 {
    T_MRD
}

fn d_refresh_interval() -> u64 {
    REFRESH_INTERVAL
}

fn d_refresh_duration() -> u64 {
    REFRESH_DURATION
}

fn d_init_settle() -> u64 {
    INIT_SETTLE
}

fn d_max_burst() -> u16 {
    MAX_BURST
}
