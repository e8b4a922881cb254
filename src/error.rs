//! Error types for arithmetic coding.

use thiserror::Error;

/// Error variants for encode and decode passes.
#[derive(Debug, Error)]
pub enum Error {
    /// The frequency header ended before all 257 counts were read.
    #[error("truncated header: expected 257 frequency counts, found {found}")]
    TruncatedHeader {
        /// Number of complete counts that were available.
        found: usize,
    },

    /// The frequency header was complete but describes an unusable model.
    #[error("invalid frequency model: {0}")]
    InvalidModel(&'static str),

    /// A symbol with a zero count in the model was handed to the encoder,
    /// e.g. because the input changed between the counting and coding passes.
    #[error("symbol {0} has zero frequency in the model")]
    ZeroFrequency(u16),

    /// The bitstream ran out long before an end-of-stream symbol was decoded.
    #[error("bitstream truncated before end-of-stream symbol")]
    TruncatedStream,

    /// An I/O error occurred during encoding or decoding.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for arithmetic coding operations.
pub type Result<T> = std::result::Result<T, Error>;
