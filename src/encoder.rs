//! Arithmetic encoder.
//!
//! The encoder narrows the interval once per symbol and renormalises it
//! whenever it fits inside a half (emitting the now-certain bit) or inside
//! the middle half (deferring a bit whose value is not yet known).

use std::io::Write;

use crate::bitio::BitSink;
use crate::error::{Error, Result};
use crate::interval::{Interval, Renorm, FIRST_QTR};
use crate::model::{CumulativeTable, Symbol, EOF_SYMBOL};

/// Bits owed after E3 steps.
///
/// Each deferred bit is the complement of the next determinate bit, so the
/// whole backlog is paid off as soon as one is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingBits {
    count: u64,
}

impl PendingBits {
    /// No bits owed.
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Owe one more bit.
    pub fn defer(&mut self) {
        self.count += 1;
    }

    /// Number of bits currently owed.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Write `bit`, then every owed bit as `!bit`, and clear the backlog.
    pub fn emit<W: Write>(&mut self, bit: u8, sink: &mut BitSink<W>) -> Result<()> {
        sink.write_bit(bit)?;
        let complement = bit ^ 1;
        while self.count > 0 {
            sink.write_bit(complement)?;
            self.count -= 1;
        }
        Ok(())
    }
}

/// Static-model arithmetic encoder writing to `W`.
pub struct ArithmeticEncoder<'a, W> {
    cum: &'a CumulativeTable,
    interval: Interval,
    pending: PendingBits,
    sink: BitSink<W>,
}

impl<'a, W: Write> ArithmeticEncoder<'a, W> {
    /// Create an encoder over the given cumulative table.
    pub fn new(cum: &'a CumulativeTable, output: W) -> Self {
        Self {
            cum,
            interval: Interval::new(),
            pending: PendingBits::new(),
            sink: BitSink::new(output),
        }
    }

    /// Encode one symbol.
    ///
    /// The end-of-stream symbol is written by [`ArithmeticEncoder::finish`];
    /// encoding it here as well would end the stream early for the decoder.
    ///
    /// # Errors
    /// Returns `Error::ZeroFrequency` if the symbol has no room in the model,
    /// `Error::Io` if the writer fails.
    pub fn encode_symbol(&mut self, symbol: Symbol) -> Result<()> {
        let (lo, hi) = self.cum.bounds(symbol);
        if lo == hi {
            return Err(Error::ZeroFrequency(symbol));
        }
        self.interval.narrow(self.cum, symbol);
        while let Some(step) = self.interval.renorm_step() {
            match step {
                Renorm::Lower => self.pending.emit(0, &mut self.sink)?,
                Renorm::Upper => self.pending.emit(1, &mut self.sink)?,
                Renorm::Middle => self.pending.defer(),
            }
            self.interval.shift(step);
        }
        Ok(())
    }

    /// Encode every byte of `bytes`.
    pub fn encode_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        for &b in bytes {
            self.encode_symbol(b as Symbol)?;
        }
        Ok(())
    }

    /// Current interval.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Bits written so far, deferred bits excluded.
    pub fn bits_written(&self) -> u64 {
        self.sink.bits_written()
    }

    /// Encode the end-of-stream symbol, write the bits that pin down the
    /// final interval, flush the partial byte and return the writer.
    pub fn finish(mut self) -> Result<W> {
        self.encode_symbol(EOF_SYMBOL)?;

        // Two more bits select a quarter that lies wholly inside the
        // interval: 01 if low < FIRST_QTR, else 10.
        self.pending.defer();
        let bit = if self.interval.low() < FIRST_QTR { 0 } else { 1 };
        self.pending.emit(bit, &mut self.sink)?;

        self.sink.finish()
    }
}
