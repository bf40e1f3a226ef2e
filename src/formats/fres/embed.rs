//! Embedded files.
//!
//! Each record is 0x10 bytes: data offset (u64), size (u32), padding (u32).
//! Names come from the section dictionary, index for index.

use std::io::Cursor;
use std::path::{Component, Path};

use super::Ctx;
use crate::codec::{Field, FieldKind, StructCodec};
use crate::formats::FileKind;
use crate::Result;

pub(crate) static EMBED: StructCodec = StructCodec::new(
    "embedded file",
    &[
        Field::new("data_offset", FieldKind::Offset64),
        Field::new("size", FieldKind::U32),
        Field::pad(4),
    ],
);

/// A file stored inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub name: String,
    /// Offset of the 0x10-byte record.
    pub record: u64,
    /// Absolute offset of the data.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl EmbeddedFile {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, record: u64, name: String) -> Result<Self> {
        let rec = EMBED.decode(&ctx.r, record)?;
        let offset = rec.offset_of("data_offset")?;
        let size = rec.uint("size")? as usize;
        let data = ctx.r.bytes_at(offset, size)?.to_vec();
        tracing::trace!(offset, size, name = %name, "decoded embedded file");
        Ok(Self {
            name,
            record,
            offset,
            data,
        })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// What the payload looks like, from its magic.
    pub fn kind(&self) -> FileKind {
        FileKind::detect(&self.data)
    }

    /// Last component of the stored name, usable as a file name in an
    /// output directory.
    ///
    /// `None` when the name is empty or contains a root, prefix, `.` or `..`
    /// component, since joining those could leave the directory.
    pub fn file_name(&self) -> Option<&str> {
        let path = Path::new(&self.name);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        path.file_name()?.to_str()
    }

    /// An independent readable stream over a copy of the payload.
    pub fn materialize(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.data.clone())
    }
}
