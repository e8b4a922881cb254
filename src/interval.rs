//! The code-space window shared by the encoder and decoder.
//!
//! Both sides narrow `[low, high]` with exactly the same integer arithmetic
//! and classify the same renormalisation steps; only what happens on a step
//! differs (the encoder emits bits, the decoder shifts them in). Keeping the
//! arithmetic here, in one place, is what keeps the two sides in lockstep.
//!
//! ```text
//! 0          FIRST_QTR         HALF         THIRD_QTR        TOP_VALUE
//! |--------------|---------------|---------------|----------------|
//!   E1: high < HALF         E3: FIRST_QTR <= low, high < THIRD_QTR
//!                                  E2: low >= HALF
//! ```

use crate::model::{CumulativeTable, Symbol};

/// Width of the code space in bits.
pub const CODE_VALUE_BITS: u32 = 32;

/// Largest code value.
pub const TOP_VALUE: u32 = u32::MAX;

/// Start of the second quarter of the code space.
pub const FIRST_QTR: u32 = TOP_VALUE / 4 + 1;

/// Midpoint of the code space.
pub const HALF: u32 = 2 * FIRST_QTR;

/// Start of the fourth quarter of the code space.
pub const THIRD_QTR: u32 = 3 * FIRST_QTR;

/// One renormalisation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Renorm {
    /// E1: the interval lies in the lower half; the next bit is 0.
    Lower,
    /// E2: the interval lies in the upper half; the next bit is 1.
    Upper,
    /// E3: the interval straddles the midpoint inside the middle half; the
    /// next bit is not known yet.
    Middle,
}

impl Renorm {
    /// Amount subtracted from the bounds before doubling.
    pub fn offset(self) -> u32 {
        match self {
            Renorm::Lower => 0,
            Renorm::Upper => HALF,
            Renorm::Middle => FIRST_QTR,
        }
    }
}

/// The current `[low, high]` window, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    low: u32,
    high: u32,
}

impl Interval {
    /// The full code space.
    pub fn new() -> Self {
        Self {
            low: 0,
            high: TOP_VALUE,
        }
    }

    /// Lower bound.
    pub fn low(&self) -> u32 {
        self.low
    }

    /// Upper bound.
    pub fn high(&self) -> u32 {
        self.high
    }

    /// `high - low + 1`, which is `2^32` for the full window.
    pub fn range(&self) -> u64 {
        self.high as u64 - self.low as u64 + 1
    }

    /// Narrow to the sub-interval of `symbol`.
    ///
    /// Both bounds are computed from the old `low`. The symbol must have a
    /// non-zero count and the table total must not exceed
    /// [`crate::model::MAX_TOTAL`].
    pub fn narrow(&mut self, cum: &CumulativeTable, symbol: Symbol) {
        let (lo, hi) = cum.bounds(symbol);
        debug_assert!(lo < hi, "symbol {symbol} has zero frequency");

        let range = self.range();
        let total = cum.total() as u64;
        let base = self.low as u64;
        self.high = (base + range * hi as u64 / total - 1) as u32;
        self.low = (base + range * lo as u64 / total) as u32;
        debug_assert!(self.low <= self.high);
    }

    /// The renormalisation step that applies now, if any.
    pub fn renorm_step(&self) -> Option<Renorm> {
        if self.high < HALF {
            Some(Renorm::Lower)
        } else if self.low >= HALF {
            Some(Renorm::Upper)
        } else if self.low >= FIRST_QTR && self.high < THIRD_QTR {
            Some(Renorm::Middle)
        } else {
            None
        }
    }

    /// Apply one step: debase, then double the window.
    pub fn shift(&mut self, step: Renorm) {
        let offset = step.offset();
        self.low = (self.low - offset) << 1;
        self.high = ((self.high - offset) << 1) | 1;
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new()
    }
}
