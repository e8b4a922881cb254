//! Static frequency model.
//!
//! One pass over the input counts every byte value; the end-of-stream symbol
//! always gets a count of one so the decoder has something to stop on. The
//! encoder and decoder both derive the same [`CumulativeTable`] from the same
//! [`FrequencyTable`], which is what keeps them in lockstep.
//!
//! # Header layout
//!
//! ```text
//! count[0] count[1] ... count[255] count[256]     257 x u32, little-endian
//! ```

use std::io::{ErrorKind, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::interval::FIRST_QTR;

/// A coded unit: byte values `0..=255`, or [`EOF_SYMBOL`].
pub type Symbol = u16;

/// Size of the alphabet: 256 byte values plus end-of-stream.
pub const NUM_SYMBOLS: usize = 257;

/// The reserved end-of-stream marker.
pub const EOF_SYMBOL: Symbol = 256;

/// Serialized size of a [`FrequencyTable`] in bytes.
pub const HEADER_LEN: usize = NUM_SYMBOLS * 4;

/// Largest total frequency the coder can represent without a present symbol
/// collapsing to an empty sub-interval.
pub const MAX_TOTAL: u32 = FIRST_QTR - 1;

const SCAN_CHUNK: usize = 8 * 1024;

/// Per-symbol counts in symbol order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u32; NUM_SYMBOLS],
}

impl FrequencyTable {
    /// Count every byte of `bytes` and force the end-of-stream count to one.
    pub fn build(bytes: &[u8]) -> Self {
        let mut raw = [0u64; NUM_SYMBOLS];
        for &b in bytes {
            raw[b as usize] += 1;
        }
        Self::from_raw_counts(raw)
    }

    /// Like [`FrequencyTable::build`], but scans a reader to its end.
    ///
    /// # Errors
    /// Returns `Error::Io` if the reader fails.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = [0u64; NUM_SYMBOLS];
        let mut chunk = [0u8; SCAN_CHUNK];
        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for &b in &chunk[..n] {
                raw[b as usize] += 1;
            }
        }
        Ok(Self::from_raw_counts(raw))
    }

    /// Validate explicit counts, e.g. ones read back from a header.
    ///
    /// # Errors
    /// Returns `Error::InvalidModel` if the end-of-stream count is zero or the
    /// total exceeds [`MAX_TOTAL`].
    pub fn from_counts(counts: [u32; NUM_SYMBOLS]) -> Result<Self> {
        if counts[EOF_SYMBOL as usize] == 0 {
            return Err(Error::InvalidModel("end-of-stream count is zero"));
        }
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total > MAX_TOTAL as u64 {
            return Err(Error::InvalidModel("total frequency exceeds coder precision"));
        }
        Ok(Self { counts })
    }

    fn from_raw_counts(mut raw: [u64; NUM_SYMBOLS]) -> Self {
        raw[EOF_SYMBOL as usize] = 1;
        let raw_total: u64 = raw.iter().sum();

        let mut counts = [0u32; NUM_SYMBOLS];
        if raw_total <= MAX_TOTAL as u64 {
            for (dst, &c) in counts.iter_mut().zip(raw.iter()) {
                *dst = c as u32;
            }
        } else {
            // Leave room for every present symbol being bumped up to one.
            let target = (MAX_TOTAL as u64 - NUM_SYMBOLS as u64) as u128;
            for (dst, &c) in counts.iter_mut().zip(raw.iter()) {
                if c > 0 {
                    let scaled = (c as u128 * target / raw_total as u128) as u32;
                    *dst = scaled.max(1);
                }
            }
            debug!(
                raw_total,
                scaled_total = counts.iter().map(|&c| c as u64).sum::<u64>(),
                "rescaled frequency counts"
            );
        }
        Self { counts }
    }

    /// Count for one symbol.
    pub fn count(&self, symbol: Symbol) -> u32 {
        self.counts[symbol as usize]
    }

    /// All counts in symbol order.
    pub fn counts(&self) -> &[u32; NUM_SYMBOLS] {
        &self.counts
    }

    /// Sum of all counts, end-of-stream included.
    pub fn total(&self) -> u32 {
        // Bounded by MAX_TOTAL, checked on construction.
        self.counts.iter().sum()
    }

    /// Prefix sums over the counts.
    pub fn cumulative(&self) -> CumulativeTable {
        let mut cum = [0u32; NUM_SYMBOLS + 1];
        for (i, &c) in self.counts.iter().enumerate() {
            cum[i + 1] = cum[i] + c;
        }
        debug_assert!(cum[NUM_SYMBOLS] >= 1, "frequency total must be non-zero");
        CumulativeTable { cum }
    }

    /// Write the table as a [`HEADER_LEN`]-byte header.
    pub fn serialize<W: Write>(&self, mut writer: W) -> Result<()> {
        for &c in &self.counts {
            writer.write_u32::<LittleEndian>(c)?;
        }
        trace!(total = self.total(), "wrote frequency header");
        Ok(())
    }

    /// Header bytes as an owned buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_LEN];
        LittleEndian::write_u32_into(&self.counts, &mut out);
        out
    }

    /// Read a header written by [`FrequencyTable::serialize`].
    ///
    /// # Errors
    /// Returns `Error::TruncatedHeader` if fewer than [`HEADER_LEN`] bytes are
    /// available, `Error::InvalidModel` if the counts cannot drive a decoder.
    pub fn deserialize<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        reader
            .by_ref()
            .take(HEADER_LEN as u64)
            .read_to_end(&mut buf)?;
        if buf.len() < HEADER_LEN {
            return Err(Error::TruncatedHeader {
                found: buf.len() / 4,
            });
        }
        let mut counts = [0u32; NUM_SYMBOLS];
        LittleEndian::read_u32_into(&buf, &mut counts);
        let table = Self::from_counts(counts)?;
        trace!(total = table.total(), "read frequency header");
        Ok(table)
    }
}

/// Cumulative frequencies: `cum[0] = 0`, `cum[s + 1] = cum[s] + count[s]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CumulativeTable {
    cum: [u32; NUM_SYMBOLS + 1],
}

impl CumulativeTable {
    /// Total frequency, `cum[257]`.
    pub fn total(&self) -> u32 {
        self.cum[NUM_SYMBOLS]
    }

    /// `(cum[s], cum[s + 1])` for a symbol.
    pub fn bounds(&self, symbol: Symbol) -> (u32, u32) {
        let s = symbol as usize;
        (self.cum[s], self.cum[s + 1])
    }

    /// The symbol whose range contains `scaled`, i.e. the first `s` with
    /// `cum[s + 1] > scaled`. Zero-count symbols are never returned.
    pub fn symbol_for(&self, scaled: u32) -> Symbol {
        debug_assert!(scaled < self.total());
        self.cum[1..].partition_point(|&c| c <= scaled) as Symbol
    }

    /// The raw prefix sums.
    pub fn as_slice(&self) -> &[u32] {
        &self.cum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::ArithmeticDecoder;
    use crate::encoder::ArithmeticEncoder;
    use proptest::prelude::*;

    #[test]
    fn test_build_empty_forces_eof() {
        let table = FrequencyTable::build(&[]);
        assert!(table.counts()[..256].iter().all(|&c| c == 0));
        assert_eq!(table.count(EOF_SYMBOL), 1);
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_build_counts_bytes() {
        let table = FrequencyTable::build(b"abracadabra");
        assert_eq!(table.count(b'a' as Symbol), 5);
        assert_eq!(table.count(b'b' as Symbol), 2);
        assert_eq!(table.count(b'r' as Symbol), 2);
        assert_eq!(table.count(b'c' as Symbol), 1);
        assert_eq!(table.count(b'd' as Symbol), 1);
        assert_eq!(table.count(EOF_SYMBOL), 1);
        assert_eq!(table.total(), 12);
    }

    #[test]
    fn test_from_reader_matches_build() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i * 31 % 251) as u8).collect();
        let scanned = FrequencyTable::from_reader(data.as_slice()).unwrap();
        assert_eq!(scanned, FrequencyTable::build(&data));
    }

    #[test]
    fn test_cumulative_layout() {
        let table = FrequencyTable::build(&[0, 0, 2]);
        let cum = table.cumulative();
        assert_eq!(&cum.as_slice()[..4], &[0, 2, 2, 3]);
        assert_eq!(cum.total(), 4);
        assert_eq!(cum.bounds(0), (0, 2));
        assert_eq!(cum.bounds(2), (2, 3));
        assert_eq!(cum.bounds(EOF_SYMBOL), (3, 4));
    }

    #[test]
    fn test_symbol_for_skips_empty_symbols() {
        let table = FrequencyTable::build(&[0, 0, 2]);
        let cum = table.cumulative();
        assert_eq!(cum.symbol_for(0), 0);
        assert_eq!(cum.symbol_for(1), 0);
        assert_eq!(cum.symbol_for(2), 2);
        assert_eq!(cum.symbol_for(3), EOF_SYMBOL);
    }

    #[test]
    fn test_header_layout_is_little_endian() {
        let table = FrequencyTable::build(&[1, 1, 1]);
        let bytes = table.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
        assert_eq!(&bytes[HEADER_LEN - 4..], &[1, 0, 0, 0]);

        let mut streamed = Vec::new();
        table.serialize(&mut streamed).unwrap();
        assert_eq!(streamed, bytes);
    }

    #[test]
    fn test_deserialize_truncated_header() {
        let bytes = FrequencyTable::build(b"hello").to_bytes();
        let err = FrequencyTable::deserialize(&bytes[..HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { found: 256 }));

        let err = FrequencyTable::deserialize(&[0u8; 0][..]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { found: 0 }));
    }

    #[test]
    fn test_deserialize_leaves_body_unread() {
        let mut bytes = FrequencyTable::build(b"xyz").to_bytes();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let mut reader = bytes.as_slice();
        FrequencyTable::deserialize(&mut reader).unwrap();
        assert_eq!(reader, &[0xAA, 0xBB]);
    }

    #[test]
    fn test_from_counts_rejects_unusable_models() {
        let mut counts = [0u32; NUM_SYMBOLS];
        counts[7] = 10;
        assert!(matches!(
            FrequencyTable::from_counts(counts),
            Err(Error::InvalidModel(_))
        ));

        counts[EOF_SYMBOL as usize] = 1;
        counts[8] = MAX_TOTAL;
        assert!(matches!(
            FrequencyTable::from_counts(counts),
            Err(Error::InvalidModel(_))
        ));

        counts[8] = MAX_TOTAL - 11;
        assert!(FrequencyTable::from_counts(counts).is_ok());
    }

    #[test]
    fn test_rescale_large_counts() {
        let mut raw = [0u64; NUM_SYMBOLS];
        raw[0] = 10 * MAX_TOTAL as u64;
        raw[1] = 3;
        raw[2] = MAX_TOTAL as u64;
        let table = FrequencyTable::from_raw_counts(raw);

        assert!(table.total() <= MAX_TOTAL);
        assert_eq!(table.count(1), 1);
        assert_eq!(table.count(3), 0);
        assert_eq!(table.count(EOF_SYMBOL), 1);
        assert!(table.count(0) > 9 * table.count(2));
        assert!(FrequencyTable::from_counts(*table.counts()).is_ok());
    }

    #[test]
    fn test_rescaled_table_roundtrips() {
        let mut raw = [0u64; NUM_SYMBOLS];
        raw[b'a' as usize] = 40 * MAX_TOTAL as u64;
        raw[b'b' as usize] = 7;
        raw[b'c' as usize] = MAX_TOTAL as u64 / 3;
        let table = FrequencyTable::from_raw_counts(raw);
        assert!(table.total() <= MAX_TOTAL);
        assert!(table.total() > MAX_TOTAL - 2 * NUM_SYMBOLS as u32);

        let data = b"abacabbbaaaacacbbbabcaaaab";
        let cum = table.cumulative();
        let mut encoder = ArithmeticEncoder::new(&cum, Vec::new());
        encoder.encode_bytes(data).unwrap();
        let body = encoder.finish().unwrap();

        let mut decoder = ArithmeticDecoder::new(&cum, body.as_slice()).unwrap();
        let mut out = Vec::new();
        decoder.decode_to_end(&mut out).unwrap();
        assert_eq!(out, data.to_vec());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_symbol_for_matches_linear_scan(
            data in prop::collection::vec(any::<u8>(), 0..300),
            pick in any::<u32>(),
        ) {
            let cum = FrequencyTable::build(&data).cumulative();
            let scaled = pick % cum.total();
            let linear = (0..NUM_SYMBOLS)
                .find(|&s| cum.as_slice()[s + 1] > scaled)
                .unwrap() as Symbol;
            prop_assert_eq!(cum.symbol_for(scaled), linear);
        }
    }
}
