//! Bit-level I/O over byte streams.
//!
//! Both directions pack bits MSB-first. The sink zero-pads the final partial
//! byte and stores no bit count; the source yields zeros forever once the
//! underlying reader is exhausted. The arithmetic decoder relies on that:
//! it looks a full code word ahead of what the encoder explicitly wrote, and
//! stops on the end-of-stream symbol rather than on physical end of input.

use std::io::{ErrorKind, Read, Write};

use crate::error::Result;

/// Accumulates single bits and writes completed bytes to `W`.
pub struct BitSink<W> {
    inner: W,
    buffer: u8,
    nbits: u8,
    written: u64,
}

impl<W: Write> BitSink<W> {
    /// Create a sink writing into `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: 0,
            nbits: 0,
            written: 0,
        }
    }

    /// Append one bit (any non-zero value counts as 1).
    pub fn write_bit(&mut self, bit: u8) -> Result<()> {
        if bit != 0 {
            self.buffer |= 0x80 >> self.nbits;
        }
        self.nbits += 1;
        self.written += 1;
        if self.nbits == 8 {
            self.inner.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.nbits = 0;
        }
        Ok(())
    }

    /// Total number of bits written so far, padding excluded.
    pub fn bits_written(&self) -> u64 {
        self.written
    }

    /// Flush a pending partial byte (zero-padded in its low bits) and hand
    /// back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        if self.nbits > 0 {
            self.inner.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.nbits = 0;
        }
        Ok(self.inner)
    }
}

/// Reads single bits out of `R`, MSB-first.
pub struct BitSource<R> {
    inner: R,
    buffer: u8,
    nbits: u8,
    exhausted: bool,
    consumed: u64,
    phantom: u64,
}

impl<R: Read> BitSource<R> {
    /// Create a source reading from `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: 0,
            nbits: 0,
            exhausted: false,
            consumed: 0,
            phantom: 0,
        }
    }

    /// Read the next bit. Returns 0 once the reader is exhausted.
    ///
    /// # Errors
    /// Propagates I/O errors from the underlying reader. End of input is not
    /// an error.
    pub fn read_bit(&mut self) -> Result<u8> {
        if self.nbits == 0 {
            match self.refill()? {
                Some(byte) => {
                    self.consumed += 1;
                    self.buffer = byte;
                    self.nbits = 8;
                }
                None => {
                    self.phantom += 1;
                    return Ok(0);
                }
            }
        }
        let bit = self.buffer >> 7;
        self.buffer <<= 1;
        self.nbits -= 1;
        Ok(bit)
    }

    /// Bytes pulled from the underlying reader.
    pub fn bytes_read(&self) -> u64 {
        self.consumed
    }

    /// Number of zero bits handed out after the reader ran dry.
    pub fn phantom_bits(&self) -> u64 {
        self.phantom
    }

    fn refill(&mut self) -> Result<Option<u8>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
