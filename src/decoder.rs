//! Arithmetic decoder.
//!
//! Mirrors [`crate::encoder::ArithmeticEncoder`]: the same interval
//! arithmetic, plus a `value` register holding the next 32 bits of the
//! stream. Each step finds the symbol whose sub-interval contains `value`,
//! narrows to it and shifts fresh bits into `value` wherever the encoder
//! would have emitted (or deferred) one.

use std::io::Read;

use crate::bitio::BitSource;
use crate::error::{Error, Result};
use crate::interval::{Interval, CODE_VALUE_BITS};
use crate::model::{CumulativeTable, Symbol, EOF_SYMBOL};

/// Static-model arithmetic decoder reading from `R`.
pub struct ArithmeticDecoder<'a, R> {
    cum: &'a CumulativeTable,
    interval: Interval,
    value: u32,
    source: BitSource<R>,
    finished: bool,
}

impl<'a, R: Read> ArithmeticDecoder<'a, R> {
    /// Create a decoder and prime it with the first 32 bits of `input`.
    ///
    /// # Errors
    /// Returns `Error::Io` if the reader fails. A short stream is not an
    /// error here; missing bits read as zero.
    pub fn new(cum: &'a CumulativeTable, input: R) -> Result<Self> {
        let mut source = BitSource::new(input);
        let mut value = 0u32;
        for _ in 0..CODE_VALUE_BITS {
            value = (value << 1) | source.read_bit()? as u32;
        }
        Ok(Self {
            cum,
            interval: Interval::new(),
            value,
            source,
            finished: false,
        })
    }

    /// Decode the next symbol.
    ///
    /// Returns [`EOF_SYMBOL`] once the end of the stream is reached, and on
    /// every call after that.
    ///
    /// # Errors
    /// Returns `Error::TruncatedStream` if the decoder has run further past
    /// the end of input than any well-formed stream allows, `Error::Io` if
    /// the reader fails.
    pub fn decode_symbol(&mut self) -> Result<Symbol> {
        if self.finished {
            return Ok(EOF_SYMBOL);
        }
        // A complete stream always carries at least one bit beyond the
        // decoder's 32-bit lookahead, so more phantom bits than that means
        // the body was cut short.
        if self.source.phantom_bits() > CODE_VALUE_BITS as u64 {
            return Err(Error::TruncatedStream);
        }

        let symbol = self.cum.symbol_for(self.scaled_value());
        if symbol == EOF_SYMBOL {
            self.finished = true;
            return Ok(symbol);
        }

        self.interval.narrow(self.cum, symbol);
        while let Some(step) = self.interval.renorm_step() {
            self.interval.shift(step);
            self.value = ((self.value - step.offset()) << 1) | self.source.read_bit()? as u32;
        }
        Ok(symbol)
    }

    /// Decode every byte up to the end-of-stream symbol into `out`.
    pub fn decode_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        loop {
            let symbol = self.decode_symbol()?;
            if symbol == EOF_SYMBOL {
                return Ok(out.len() - start);
            }
            out.push(symbol as u8);
        }
    }

    /// Whether the end-of-stream symbol has been decoded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Body bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.source.bytes_read()
    }

    /// Current interval.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Position of `value` inside the interval, scaled to the table total.
    fn scaled_value(&self) -> u32 {
        let low = self.interval.low() as u64;
        let value = self.value as u64;
        debug_assert!(low <= value && value <= self.interval.high() as u64);

        let total = self.cum.total() as u64;
        (((value - low + 1) * total - 1) / self.interval.range()) as u32
    }
}
