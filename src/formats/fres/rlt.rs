//! `_RLT` relocation table.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "_RLT"                 (4 bytes)
//! [0x04] Offset of this table         (u32)
//! [0x08] Section count                (u32)
//! [0x0C] Padding                      (4 bytes)
//! [0x10] Sections                     (count × 0x18)
//!        Entries                      (n × 0x08)
//! ```
//!
//! Section 1's position (the u32 at 0x30) is the start of the raw data
//! region. Vertex and index buffer offsets are relative to it.

use crate::codec::{Field, FieldKind, Record, StructCodec};
use crate::options::DecodeOptions;
use crate::reader::ByteReader;
use crate::Result;

pub(crate) static RLT_HEADER: StructCodec = StructCodec::new(
    "_RLT",
    &[
        Field::new("magic", FieldKind::Magic(b"_RLT")),
        Field::new("self_offset", FieldKind::Offset32),
        Field::new("section_count", FieldKind::U32),
        Field::pad(4),
        Field::pad(0x20),
        Field::new("data_start", FieldKind::Offset32),
    ],
);

pub(crate) static RLT_SECTION: StructCodec = StructCodec::new(
    "_RLT section",
    &[
        Field::new("base", FieldKind::U64),
        Field::new("position", FieldKind::U32),
        Field::new("size", FieldKind::U32),
        Field::new("entry_index", FieldKind::U32),
        Field::new("entry_count", FieldKind::U32),
    ],
);

pub(crate) static RLT_ENTRY: StructCodec = StructCodec::new(
    "_RLT entry",
    &[
        Field::new("position", FieldKind::U32),
        Field::new("struct_count", FieldKind::U16),
        Field::new("offset_count", FieldKind::U8),
        Field::new("padding_count", FieldKind::U8),
    ],
);

/// A contiguous region the loader patches pointers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocSection {
    pub base: u64,
    pub position: u32,
    pub size: u32,
    pub entry_index: u32,
    pub entry_count: u32,
}

/// A run of pointer slots to patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocEntry {
    pub position: u32,
    pub struct_count: u16,
    pub offset_count: u8,
    pub padding_count: u8,
}

/// Decoded `_RLT` block.
#[derive(Debug, Clone)]
pub struct RelocationTable {
    pub offset: u64,
    /// Absolute start of the raw data region.
    pub data_start: u64,
    pub sections: Vec<RelocSection>,
    pub entries: Vec<RelocEntry>,
    pub header: Record,
}

impl RelocationTable {
    pub fn decode(r: &ByteReader<'_>, offset: u64, opts: &DecodeOptions) -> Result<Self> {
        let header = RLT_HEADER.decode(r, offset)?;
        let data_start = header.offset_of("data_start")?;
        let count = opts.check_entries("relocation section", header.uint("section_count")?)?;

        let sections = RLT_SECTION
            .decode_array(r, offset + 0x10, count)?
            .iter()
            .map(|s| {
                Ok(RelocSection {
                    base: s.uint("base")?,
                    position: s.uint("position")? as u32,
                    size: s.uint("size")? as u32,
                    entry_index: s.uint("entry_index")? as u32,
                    entry_count: s.uint("entry_count")? as u32,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total = sections
            .iter()
            .map(|s| s.entry_index as u64 + s.entry_count as u64)
            .max()
            .unwrap_or(0);
        let total = opts.check_entries("relocation entry", total)?;
        let entries_at = offset + 0x10 + (count * RLT_SECTION.size) as u64;
        let entries = RLT_ENTRY
            .decode_array(r, entries_at, total)?
            .iter()
            .map(|e| {
                Ok(RelocEntry {
                    position: e.uint("position")? as u32,
                    struct_count: e.uint("struct_count")? as u16,
                    offset_count: e.uint("offset_count")? as u8,
                    padding_count: e.uint("padding_count")? as u8,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            offset,
            data_start,
            sections = sections.len(),
            entries = entries.len(),
            "decoded relocation table"
        );
        Ok(Self {
            offset,
            data_start,
            sections,
            entries,
            header,
        })
    }
}
