//! Word-Address Decomposition.
//!
//! The channel addresses memory as a flat array of 16-bit words. A 24-bit
//! word address splits into bank, row, and column fields:
//!
//! ```text
//!   [23:22] bank    (4 banks)
//!   [21: 9] row     (8192 rows per bank)
//!   [ 8: 0] column  (512 columns per row)
//! ```
//!
//! One column is one 16-bit word. The geometry matches a 32 MB part
//! (16 Mi words) with four independently controllable banks.

/// Number of column-address bits.
pub const COL_BITS: u32 = 9;

/// Number of row-address bits.
pub const ROW_BITS: u32 = 13;

/// Number of bank-address bits.
pub const BANK_BITS: u32 = 2;

/// Columns per row (one column = one 16-bit word).
pub const COL_COUNT: u32 = 1 << COL_BITS;

/// Rows per bank.
pub const ROW_COUNT: u32 = 1 << ROW_BITS;

/// Number of independent banks.
pub const BANK_COUNT: usize = 1 << BANK_BITS;

/// Total number of addressable 16-bit words.
pub const TOTAL_WORDS: u32 = 1 << (COL_BITS + ROW_BITS + BANK_BITS);

const COL_MASK: u32 = COL_COUNT - 1;
const ROW_MASK: u32 = ROW_COUNT - 1;

/// A word address resolved into its bank, row, and column fields.
///
/// Produced when the controller accepts a transfer; the bank and row stay
/// fixed for the lifetime of the transfer while the column advances (and
/// wraps in place at the row boundary).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddr {
    /// Bank index (0..4).
    pub bank: usize,
    /// Row index within the bank.
    pub row: u16,
    /// Column index within the row.
    pub col: u16,
}

impl DecodedAddr {
    /// Decomposes a 24-bit word address.
    ///
    /// Address bits above bit 23 are ignored, matching the channel's
    /// 24-bit address bus.
    pub fn decode(word_addr: u32) -> Self {
        Self {
            bank: ((word_addr >> (COL_BITS + ROW_BITS)) as usize) & (BANK_COUNT - 1),
            row: ((word_addr >> COL_BITS) & ROW_MASK) as u16,
            col: (word_addr & COL_MASK) as u16,
        }
    }

    /// Recomposes the flat word address.
    pub fn encode(&self) -> u32 {
        ((self.bank as u32) << (COL_BITS + ROW_BITS))
            | ((self.row as u32) << COL_BITS)
            | (self.col as u32)
    }

    /// Advances the column by one, wrapping within the same row.
    ///
    /// The row boundary is deliberately not auto-advanced: a burst that
    /// overruns the row continues at column 0 of the *same* row. Issuing
    /// at the correct row is the caller's responsibility.
    pub fn advance_column(&mut self) {
        self.col = ((self.col as u32 + 1) & COL_MASK) as u16;
    }
}
