//! Sparse SDRAM Storage Array.
//!
//! Models the channel's 16 Mi x 16-bit word array. Storage is sparse so
//! that instantiating the full 32 MB part does not allocate 32 MB; only
//! words that have been written occupy memory. Unwritten and out-of-range
//! words read as zero, and out-of-range writes are silently ignored.
//!
//! The untimed `read_word` / `write_word` accessors exist for test preload
//! and framebuffer-style readback; all timed access goes through the
//! channel controller.

use std::collections::HashMap;

use crate::common::addr::TOTAL_WORDS;

/// Sparse array of 16-bit words indexed by 24-bit word address.
#[derive(Debug, Default)]
pub struct SdramArray {
    words: HashMap<u32, u16>,
}

impl SdramArray {
    /// Creates an empty (all-zero) array.
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    /// Reads one 16-bit word; unwritten or out-of-range words read as 0.
    pub fn read_word(&self, word_addr: u32) -> u16 {
        if word_addr >= TOTAL_WORDS {
            return 0;
        }
        self.words.get(&word_addr).copied().unwrap_or(0)
    }

    /// Writes one 16-bit word; out-of-range writes are ignored.
    pub fn write_word(&mut self, word_addr: u32, data: u16) {
        if word_addr >= TOTAL_WORDS {
            return;
        }
        let _ = self.words.insert(word_addr, data);
    }

    /// Reads two consecutive words assembled into a 32-bit value.
    ///
    /// The word at `word_addr` is the low half, the word at
    /// `word_addr + 1` the high half.
    pub fn read_word32(&self, word_addr: u32) -> u32 {
        let low = self.read_word(word_addr) as u32;
        let high = self.read_word(word_addr.wrapping_add(1)) as u32;
        low | (high << 16)
    }

    /// Splits a 32-bit value into two consecutive words, low half first.
    pub fn write_word32(&mut self, word_addr: u32, value: u32) {
        self.write_word(word_addr, (value & 0xFFFF) as u16);
        self.write_word(word_addr.wrapping_add(1), (value >> 16) as u16);
    }

    /// Fills consecutive words from a slice, for test and asset preload.
    pub fn fill(&mut self, start_word_addr: u32, data: &[u16]) {
        for (i, word) in data.iter().enumerate() {
            self.write_word(start_word_addr.wrapping_add(i as u32), *word);
        }
    }

    /// Number of words that have been written at least once.
    pub fn populated_words(&self) -> usize {
        self.words.len()
    }
}
