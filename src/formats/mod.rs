//! Parsers for Nintendo binary resource formats.
//!
//! All parsers follow the same conventions:
//!
//! * **Owned buffer, positioned reads** - the whole file is held in memory
//!   and every structure is decoded at an absolute offset through
//!   [`crate::reader::ByteReader`]. Nothing mutates the buffer.
//! * **Declarative records** - fixed-layout structures are described once
//!   as a [`crate::codec::StructCodec`] and decoded into named fields.
//! * **Diagnostics are injected** - recoverable anomalies go to the
//!   [`crate::diagnostics::Diagnostics`] sink passed into the decode call.
//! * **Compression is separate** - `.zs` inputs are unpacked by
//!   [`crate::compression`] before parsing.
//!
//! ## Format overview
//!
//! | Module   | Format | Description |
//! |----------|--------|-------------|
//! | [`fres`] | BFRES  | Model resource container: models, skeletons, materials, embedded files |
//! | [`bntx`] | BNTX   | GPU texture container, usually embedded in a BFRES |

pub mod bntx;
pub mod fres;

/// What a byte buffer contains, judged from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `FRES` model resource.
    Fres,
    /// `BNTX` texture container.
    Bntx,
    /// `Yaz0` / `Yaz1` compressed data.
    Yaz0,
    /// Zstandard frame.
    Zstd,
    /// Anything else; holds the first four bytes, zero-padded.
    Unknown([u8; 4]),
}

impl FileKind {
    /// Classify `data` by its leading magic.
    pub fn detect(data: &[u8]) -> Self {
        let mut magic = [0u8; 4];
        let n = data.len().min(4);
        magic[..n].copy_from_slice(&data[..n]);
        match &magic {
            b"FRES" => FileKind::Fres,
            b"BNTX" => FileKind::Bntx,
            b"Yaz0" | b"Yaz1" => FileKind::Yaz0,
            [0x28, 0xB5, 0x2F, 0xFD] => FileKind::Zstd,
            _ => FileKind::Unknown(magic),
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Fres => "bfres",
            FileKind::Bntx => "bntx",
            FileKind::Yaz0 => "szs",
            FileKind::Zstd => "zs",
            FileKind::Unknown(_) => "bin",
        }
    }
}
