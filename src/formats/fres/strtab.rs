//! `_STR` string table.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "_STR"     (4 bytes)
//! [0x04] Padding          (4 bytes)
//! [0x08] Size             (u32)
//! [0x0C] Padding          (4 bytes)
//! [0x10] String count     (u32)
//! [0x14] Strings
//! ```
//!
//! Each string starts on an even offset: a `u16` byte length, the Shift-JIS
//! bytes, then a NUL. Strings are keyed by the offset of their length prefix,
//! which is what name fields elsewhere in the file point at.

use std::collections::HashMap;

use crate::codec::{Field, FieldKind, StructCodec};
use crate::options::DecodeOptions;
use crate::reader::{decode_shift_jis, ByteReader};
use crate::Result;

pub(crate) static STR_HEADER: StructCodec = StructCodec::new(
    "_STR",
    &[
        Field::new("magic", FieldKind::Magic(b"_STR")),
        Field::pad(4),
        Field::new("size", FieldKind::U32),
        Field::pad(4),
        Field::new("num_strs", FieldKind::U32),
    ],
);

/// Decoded `_STR` block.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    /// Offset of the `_STR` magic.
    pub offset: u64,
    pub size: u32,
    strings: HashMap<u64, String>,
    order: Vec<u64>,
}

impl StringTable {
    pub const HEADER_SIZE: u64 = STR_HEADER.size as u64;

    /// Decode the table whose `_STR` header starts at `offset`.
    pub fn decode(r: &ByteReader<'_>, offset: u64, opts: &DecodeOptions) -> Result<Self> {
        let header = STR_HEADER.decode(r, offset)?;
        let count = opts.check_entries("string", header.uint("num_strs")?)?;

        let mut strings = HashMap::with_capacity(count);
        let mut order = Vec::with_capacity(count);
        let mut pos = offset + Self::HEADER_SIZE;
        for _ in 0..count {
            pos += pos & 1;
            let len: u16 = r.read_at(pos)?;
            let text = decode_shift_jis(r.bytes_at(pos + 2, len as usize)?, pos)?;
            strings.insert(pos, text);
            order.push(pos);
            pos += len as u64 + 3;
        }
        tracing::debug!(offset, count, "decoded string table");

        Ok(Self {
            offset,
            size: header.uint("size")? as u32,
            strings,
            order,
        })
    }

    /// The string whose length prefix is at `offset`.
    pub fn get(&self, offset: u64) -> Option<&str> {
        self.strings.get(&offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(offset, string)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.order
            .iter()
            .filter_map(|o| self.strings.get(o).map(|s| (*o, s.as_str())))
    }
}
