//! Zstandard decompression (requires the `compression` feature).
//!
//! Newer Switch titles ship models as `.bfres.zs`: a complete FRES file
//! compressed as a single Zstd stream. Decompress the whole file with
//! [`decompress_zstd`], then decode the result.

#![cfg(feature = "compression")]

use std::io::Read;

use crate::formats::FileKind;
use crate::{Error, Result};

/// Decompress a complete Zstandard-compressed buffer of at most `limit`
/// unpacked bytes.
///
/// Returns [`Error::Zstd`] on any decompression failure and
/// [`Error::LimitExceeded`] when the output would pass `limit`. Output that is
/// itself another Zstandard frame is rejected rather than unpacked again.
pub fn decompress_zstd(data: &[u8], limit: u64) -> Result<Vec<u8>> {
    let decoder = zstd::Decoder::new(data).map_err(Error::Zstd)?;
    let mut out = Vec::new();
    decoder
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(Error::Zstd)?;
    if out.len() as u64 > limit {
        return Err(Error::LimitExceeded {
            what: "decompressed byte",
            count: out.len() as u64,
            limit,
        });
    }
    if FileKind::detect(&out) == FileKind::Zstd {
        return Err(Error::decode(&out, 0, "zstd stream unpacks to another zstd frame"));
    }
    tracing::debug!(compressed = data.len(), decompressed = out.len(), "zstd stream unpacked");
    Ok(out)
}
