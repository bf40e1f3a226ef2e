//! Library-wide error and result types.

use std::fmt;
use std::io;

use crate::formats::fres::PrimitiveTopology;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All fatal errors the decoder can produce.
///
/// Positional variants carry the absolute file offset so a failure can be
/// located in a hex editor. Non-fatal anomalies are reported separately as
/// [`crate::diagnostics::IntegrityWarning`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input does not start with any magic this crate can decode.
    #[error("unsupported file type: {}", Hex(.magic))]
    UnsupportedFileType { magic: Vec<u8> },
    /// A structure's magic did not match the expected value.
    #[error("bad magic at {offset:#x}: expected {}, found {}", Hex(.expected), Hex(.actual))]
    BadMagic {
        offset: u64,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
    /// The byte-order marker is neither 0xFFFE nor 0xFEFF.
    #[error("invalid byte-order marker {0:#06x}")]
    InvalidByteOrder(u16),
    /// A read would run past the end of the buffer.
    #[error("read of {len} bytes at {offset:#x} exceeds buffer size {size:#x}")]
    OutOfBounds { offset: u64, len: usize, size: usize },
    /// A fixed structure is malformed.
    #[error("decode error at {offset:#x}: {context} (near {})", Hex(.near))]
    Decode {
        offset: u64,
        context: String,
        near: Vec<u8>,
    },
    /// A string-table or name string is not valid Shift-JIS.
    #[error("cannot decode string at {offset:#x} as Shift-JIS: {}", Hex(.bytes))]
    StringDecode { offset: u64, bytes: Vec<u8> },
    /// A declared count is larger than the configured limit.
    #[error("{what} count {count} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        count: u64,
        limit: u64,
    },
    /// Face construction was asked for a topology it cannot expand.
    #[error("unsupported primitive topology: {0}")]
    UnsupportedPrimitiveTopology(PrimitiveTopology),
    /// A decoded record has no field with the requested name or type.
    #[error("{codec} record has no field `{field}` of the requested type")]
    MissingField {
        codec: &'static str,
        field: &'static str,
    },
    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Zstandard decompression failed.
    #[cfg(feature = "compression")]
    #[error("zstd decompression failed: {0}")]
    Zstd(#[source] io::Error),
}

impl Error {
    /// Build a [`Error::Decode`] with a copy of the bytes at `offset`.
    pub(crate) fn decode(data: &[u8], offset: u64, context: impl Into<String>) -> Self {
        Error::Decode {
            offset,
            context: context.into(),
            near: near(data, offset),
        }
    }
}

/// Up to 16 bytes starting at `offset`, for error reports.
pub(crate) fn near(data: &[u8], offset: u64) -> Vec<u8> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
    let end = start.saturating_add(16).min(data.len());
    data[start..end].to_vec()
}

/// Hex rendering of a byte slice (`46 52 45 53`).
pub(crate) struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_reports_offset_and_nearby_bytes() {
        let data = [0u8, 1, 2, 3, 0xAB, 0xCD];
        let err = Error::decode(&data, 4, "bad thing");
        let msg = err.to_string();
        assert!(msg.contains("0x4"), "{msg}");
        assert!(msg.contains("AB CD"), "{msg}");
    }

    #[test]
    fn near_clamps_past_end() {
        assert!(near(&[1, 2, 3], 10).is_empty());
        assert_eq!(near(&[1, 2, 3], 1), vec![2, 3]);
    }
}
