//! # Static-Model Arithmetic Coding
//!
//! *Whole-file byte compression by interval narrowing.*
//!
//! ## Intuition First
//!
//! Think of every possible message as a point on the line `[0, 1)`. The first
//! byte picks a slice of that line whose width is proportional to how often
//! the byte occurs; the second byte picks a slice of that slice, and so on.
//! After the last byte the slice is tiny, and any number inside it, written
//! out in binary, identifies the whole message. Frequent bytes cut wide
//! slices and cost few bits; rare bytes cut narrow ones and cost many.
//!
//! ## The Problem
//!
//! Exact fractions grow without bound. Practical arithmetic coders work in a
//! fixed-width integer window `[low, high]` and keep it wide by
//! *renormalising*:
//! - **E1** (window in the lower half): the next output bit is certainly 0.
//! - **E2** (window in the upper half): the next output bit is certainly 1.
//! - **E3** (window straddles the midpoint inside the middle half): the bit
//!   is not known yet, so it is *deferred* and later written as the
//!   complement of whichever bit is decided next.
//!
//! Each step shifts one bit out and doubles the window.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon               Entropy as the fundamental limit
//! 1952  Huffman               Prefix codes: fast, but integer bit lengths
//! 1976  Rissanen, Pasco       Arithmetic coding with finite precision
//! 1979  Martin                Range coding
//! 1987  Witten, Neal, Cleary  The CACM coder with E3 "bits to follow"
//! ```
//!
//! ## Mathematical Formulation
//!
//! With counts $c_s$, cumulative sums $C_s = \sum_{t<s} c_t$ and total $T$,
//! encoding symbol $s$ maps the window of width $r = high - low + 1$ to
//!
//! ```text
//! high' = low + floor(r * C_{s+1} / T) - 1
//! low'  = low + floor(r * C_s / T)
//! ```
//!
//! The decoder inverts this with the running code value $v$:
//! `floor(((v - low + 1) * T - 1) / r)` lands in exactly one $[C_s, C_{s+1})$.
//!
//! ## Model and Format
//!
//! The model is static: one pass counts all 256 byte values, an extra
//! end-of-stream symbol (256) gets a count of one, and the table is stored in
//! front of the bitstream as 257 little-endian `u32`s. There is no magic
//! number, version or checksum. The decoder stops when it decodes the
//! end-of-stream symbol, never on physical end of input.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(n \log 257)$ overall; decoding binary-searches the
//!   cumulative table per symbol.
//! - **Space**: $O(1)$ coder state plus the 1028-byte header.
//!
//! ## Failure Modes
//!
//! 1. **Precision**: the total count must stay below a quarter of the code
//!    space; larger inputs have their counts rescaled.
//! 2. **Static model**: input whose statistics drift gains nothing from
//!    locality, since one histogram covers the whole input.
//!
//! ## References
//!
//! - Witten, I. H., Neal, R. M., Cleary, J. G. (1987). "Arithmetic Coding for Data Compression." CACM 30(6).
//! - Moffat, A., Neal, R. M., Witten, I. H. (1998). "Arithmetic Coding Revisited." ACM TOIS 16(3).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitio;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod interval;
pub mod model;

use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};

use tracing::debug;

pub use decoder::ArithmeticDecoder;
pub use encoder::{ArithmeticEncoder, PendingBits};
pub use error::{Error, Result};
pub use model::{CumulativeTable, FrequencyTable, Symbol, EOF_SYMBOL, HEADER_LEN, NUM_SYMBOLS};

const IO_CHUNK: usize = 8 * 1024;

/// Byte counts for one compress or decompress pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodecStats {
    /// Bytes consumed from the input.
    pub input_bytes: u64,
    /// Bytes written to the output.
    pub output_bytes: u64,
}

/// Compress `input` into a header followed by the coded bitstream.
pub fn encode(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + input.len() / 2);
    compress(io::Cursor::new(input), &mut out)?;
    Ok(out)
}

/// Reverse [`encode`].
///
/// # Errors
/// Returns `Error::TruncatedHeader` or `Error::InvalidModel` for a bad
/// header and `Error::TruncatedStream` if the body ends far too early.
pub fn decode(blob: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decompress(blob, &mut out)?;
    Ok(out)
}

/// Compress from a seekable reader in two passes: count, rewind, encode.
///
/// Coding starts at the reader's current position.
pub fn compress<R: Read + Seek, W: Write>(mut input: R, output: W) -> Result<CodecStats> {
    let start = input.stream_position()?;
    let table = FrequencyTable::from_reader(&mut input)?;
    input.seek(SeekFrom::Start(start))?;

    let mut output = CountingWriter::new(output);
    table.serialize(&mut output)?;

    let cum = table.cumulative();
    let mut encoder = ArithmeticEncoder::new(&cum, &mut output);
    let mut chunk = [0u8; IO_CHUNK];
    let mut input_bytes = 0u64;
    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        encoder.encode_bytes(&chunk[..n])?;
        input_bytes += n as u64;
    }
    encoder.finish()?;
    output.flush()?;

    let stats = CodecStats {
        input_bytes,
        output_bytes: output.count,
    };
    debug!(
        input_bytes = stats.input_bytes,
        output_bytes = stats.output_bytes,
        total = cum.total(),
        "compressed"
    );
    Ok(stats)
}

/// Decompress a header and bitstream from `input` into `output`.
///
/// # Errors
/// See [`decode`].
pub fn decompress<R: Read, W: Write>(input: R, mut output: W) -> Result<CodecStats> {
    let mut input = BufReader::new(input);
    let table = FrequencyTable::deserialize(&mut input)?;
    let cum = table.cumulative();

    let mut decoder = ArithmeticDecoder::new(&cum, &mut input)?;
    let mut buffer = Vec::with_capacity(IO_CHUNK);
    let mut output_bytes = 0u64;
    loop {
        let symbol = decoder.decode_symbol()?;
        if symbol == EOF_SYMBOL {
            break;
        }
        buffer.push(symbol as u8);
        if buffer.len() == IO_CHUNK {
            output.write_all(&buffer)?;
            output_bytes += buffer.len() as u64;
            buffer.clear();
        }
    }
    output.write_all(&buffer)?;
    output_bytes += buffer.len() as u64;
    output.flush()?;

    let stats = CodecStats {
        input_bytes: HEADER_LEN as u64 + decoder.bytes_read(),
        output_bytes,
    };
    debug!(
        input_bytes = stats.input_bytes,
        output_bytes = stats.output_bytes,
        total = cum.total(),
        "decompressed"
    );
    Ok(stats)
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_basic() {
        let data = b"abracadabra, abracadabra";
        let blob = encode(data).unwrap();
        assert_eq!(decode(&blob).unwrap(), data.to_vec());
    }

    #[test]
    fn test_empty_input() {
        let blob = encode(&[]).unwrap();
        assert_eq!(blob.len(), HEADER_LEN + 1);
        assert!(decode(&blob).unwrap().is_empty());
    }

    #[test]
    fn test_compress_reports_stats() {
        let data = vec![7u8; 5000];
        let mut out = Vec::new();
        let stats = compress(io::Cursor::new(&data), &mut out).unwrap();
        assert_eq!(stats.input_bytes, 5000);
        assert_eq!(stats.output_bytes, out.len() as u64);

        let mut back = Vec::new();
        let stats = decompress(out.as_slice(), &mut back).unwrap();
        assert_eq!(stats.output_bytes, 5000);
        assert!(stats.input_bytes <= out.len() as u64);
        assert_eq!(back, data);
    }

    #[test]
    fn test_compress_starts_at_current_position() {
        let data = b"skip-me:payload payload payload";
        let mut cursor = io::Cursor::new(&data[..]);
        cursor.seek(SeekFrom::Start(8)).unwrap();
        let mut out = Vec::new();
        compress(&mut cursor, &mut out).unwrap();
        assert_eq!(decode(&out).unwrap(), data[8..].to_vec());
    }

    #[test]
    fn test_decode_short_header() {
        let err = decode(&[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { found: 1 }));
    }
}
