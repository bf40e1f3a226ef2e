//! BNTX texture containers, read as far as their texture list.
//!
//! BFRES files usually carry their textures as an embedded BNTX. Only the
//! metadata is decoded; GPU data is located but never deswizzled.
//!
//! Three records are described with [`StructCodec`]:
//!
//! * `BNTX_HEADER` at 0 holds the byte-order marker at 0x0C, which is read
//!   as raw bytes before anything else, and the container name.
//! * `NX_SECTION` follows at 0x20. Its `texture_count` is checked against
//!   [`DecodeOptions::max_entries`] and `info_ptrs_offset` points at that many
//!   u64 offsets, one per texture.
//! * `BRTI` is decoded at each of those offsets. Its size, format, mip count
//!   and data placement fill a [`TextureInfo`]; `data_offset_rel` is relative
//!   to the NX section's `data_blk_offset`.

use std::io::{Read, Seek, SeekFrom};

use crate::codec::{Field, FieldKind, Record, StructCodec};
use crate::options::DecodeOptions;
use crate::reader::{ByteOrder, ByteReader};
use crate::{Error, Result};

pub(crate) static BNTX_HEADER: StructCodec = StructCodec::new(
    "BNTX",
    &[
        Field::new("magic", FieldKind::Magic(b"BNTX\0\0\0\0")),
        Field::new("version", FieldKind::U32),
        Field::new("byte_order", FieldKind::Bytes(2)),
        Field::new("alignment", FieldKind::U8),
        Field::new("address_size", FieldKind::U8),
        Field::new("name", FieldKind::CStr32),
        Field::new("flags", FieldKind::U16),
        Field::new("block_offset", FieldKind::U16),
        Field::new("rlt_offset", FieldKind::Offset32),
        Field::new("file_size", FieldKind::U32),
    ],
);

pub(crate) static NX_SECTION: StructCodec = StructCodec::new(
    "NX",
    &[
        Field::new("magic", FieldKind::Magic(b"NX  ")),
        Field::new("texture_count", FieldKind::U32),
        Field::new("info_ptrs_offset", FieldKind::Offset64),
        Field::new("data_blk_offset", FieldKind::Offset64),
        Field::new("dict_offset", FieldKind::Offset64),
        Field::new("str_dict_offset", FieldKind::Offset32),
        Field::pad(4),
    ],
);

pub(crate) static BRTI: StructCodec = StructCodec::new(
    "BRTI",
    &[
        Field::new("magic", FieldKind::Magic(b"BRTI")),
        Field::new("length", FieldKind::U32),
        Field::new("data_length", FieldKind::U64),
        Field::new("flags", FieldKind::U8),
        Field::new("dimensions", FieldKind::U8),
        Field::new("tile_mode", FieldKind::U16),
        Field::new("swizzle", FieldKind::U16),
        Field::new("mipmap_count", FieldKind::U16),
        Field::new("ms_count", FieldKind::U16),
        Field::pad(2),
        Field::new("format", FieldKind::U32),
        Field::new("access_flags", FieldKind::U32),
        Field::new("width", FieldKind::U32),
        Field::new("height", FieldKind::U32),
        Field::new("depth", FieldKind::U32),
        Field::new("array_count", FieldKind::U32),
        Field::new("block_height_log2", FieldKind::U32),
        Field::pad(0x14),
        Field::new("data_offset_rel", FieldKind::U32),
        Field::new("name", FieldKind::Str64),
        Field::new("parent_offset", FieldKind::Offset64),
        Field::new("ptrs_offset", FieldKind::Offset64),
    ],
);

/// Metadata for a single texture stored in a BNTX file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Depth (for 3D textures) or face count (for cube maps).
    pub depth: u32,
    pub array_count: u32,
    pub mipmap_count: u16,
    pub dimensions: u8,
    pub tile_mode: u16,
    /// Raw format identifier.
    pub format: u32,
    /// Byte offset of GPU data relative to the data block start.
    pub data_offset_rel: u32,
    /// Total size of GPU data in bytes.
    pub data_length: u64,
}

/// Parsed BNTX texture container.
#[derive(Debug, Clone)]
pub struct Bntx {
    pub name: String,
    pub byte_order: ByteOrder,
    pub textures: Vec<TextureInfo>,
    /// Absolute offset of the GPU data block.
    pub data_block_offset: u64,
    pub header: Record,
}

impl Bntx {
    /// Parse a BNTX file from `r`, which must be positioned anywhere inside
    /// a stream that starts at the beginning of the file.
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        r.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::decode(&data, &DecodeOptions::default())
    }

    pub fn decode(data: &[u8], opts: &DecodeOptions) -> Result<Self> {
        if data.get(..4) != Some(b"BNTX".as_slice()) {
            return Err(Error::UnsupportedFileType {
                magic: data.iter().take(4).copied().collect(),
            });
        }
        let probe = ByteReader::new(data, ByteOrder::Big);
        let byte_order = ByteOrder::from_marker(probe.read_at(0x0C)?)?;
        let r = probe.with_order(byte_order);

        let header = BNTX_HEADER.decode(&r, 0)?;
        let nx = NX_SECTION.decode(&r, BNTX_HEADER.size as u64)?;
        let count = opts.check_entries("texture", nx.uint("texture_count")?)?;
        let brti_offsets = r.read_many_at::<u64>(nx.offset_of("info_ptrs_offset")?, count)?;

        let mut textures = Vec::with_capacity(count);
        for at in brti_offsets {
            let t = BRTI.decode(&r, at)?;
            textures.push(TextureInfo {
                name: t.text("name")?.to_owned(),
                width: t.uint("width")? as u32,
                height: t.uint("height")? as u32,
                depth: t.uint("depth")? as u32,
                array_count: t.uint("array_count")? as u32,
                mipmap_count: t.uint("mipmap_count")? as u16,
                dimensions: t.uint("dimensions")? as u8,
                tile_mode: t.uint("tile_mode")? as u16,
                format: t.uint("format")? as u32,
                data_offset_rel: t.uint("data_offset_rel")? as u32,
                data_length: t.uint("data_length")?,
            });
        }
        tracing::debug!(textures = textures.len(), "decoded BNTX");

        Ok(Bntx {
            name: header.text("name")?.to_owned(),
            byte_order,
            textures,
            data_block_offset: nx.offset_of("data_blk_offset")?,
            header,
        })
    }

    pub fn texture(&self, name: &str) -> Option<&TextureInfo> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// Absolute file offset of the GPU data for `tex`.
    pub fn texture_data_offset(&self, tex: &TextureInfo) -> u64 {
        self.data_block_offset + tex.data_offset_rel as u64
    }

    /// The GPU data for `tex` within `data`, the file this was decoded from.
    pub fn texture_data<'a>(&self, data: &'a [u8], tex: &TextureInfo) -> Result<&'a [u8]> {
        let len = usize::try_from(tex.data_length).map_err(|_| Error::OutOfBounds {
            offset: self.texture_data_offset(tex),
            len: usize::MAX,
            size: data.len(),
        })?;
        ByteReader::new(data, self.byte_order).bytes_at(self.texture_data_offset(tex), len)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    // header, NX section, one pointer, one BRTI, name, 16 bytes of data
    fn sample() -> Vec<u8> {
        let mut b = vec![0u8; 0x200];
        b[..8].copy_from_slice(b"BNTX\0\0\0\0");
        b[0x0C..0x0E].copy_from_slice(&[0xFF, 0xFE]);
        b[0x10..0x14].copy_from_slice(&0x152u32.to_le_bytes());
        b[0x20..0x24].copy_from_slice(b"NX  ");
        b[0x24..0x28].copy_from_slice(&1u32.to_le_bytes());
        b[0x28..0x30].copy_from_slice(&0x48u64.to_le_bytes());
        b[0x30..0x38].copy_from_slice(&0x180u64.to_le_bytes());
        b[0x48..0x50].copy_from_slice(&0x50u64.to_le_bytes());
        let t = 0x50;
        b[t..t + 4].copy_from_slice(b"BRTI");
        b[t + 0x08..t + 0x10].copy_from_slice(&16u64.to_le_bytes());
        b[t + 0x11] = 2;
        b[t + 0x16..t + 0x18].copy_from_slice(&1u16.to_le_bytes());
        b[t + 0x1C..t + 0x20].copy_from_slice(&0x1A01u32.to_le_bytes());
        b[t + 0x24..t + 0x28].copy_from_slice(&4u32.to_le_bytes());
        b[t + 0x28..t + 0x2C].copy_from_slice(&2u32.to_le_bytes());
        b[t + 0x2C..t + 0x30].copy_from_slice(&1u32.to_le_bytes());
        b[t + 0x4C..t + 0x50].copy_from_slice(&0x10u32.to_le_bytes());
        b[t + 0x50..t + 0x58].copy_from_slice(&0x150u64.to_le_bytes());
        b[0x150..0x152].copy_from_slice(&4u16.to_le_bytes());
        b[0x152..0x157].copy_from_slice(b"grid\0");
        for (i, x) in b[0x190..0x1A0].iter_mut().enumerate() {
            *x = i as u8;
        }
        b
    }

    #[test]
    fn texture_metadata() {
        let data = sample();
        let bntx = Bntx::parse(&mut Cursor::new(&data)).unwrap();
        assert_eq!(bntx.name, "grid");
        assert_eq!(bntx.byte_order, ByteOrder::Little);
        assert_eq!(bntx.textures.len(), 1);
        let tex = bntx.texture("grid").unwrap();
        assert_eq!((tex.width, tex.height, tex.depth), (4, 2, 1));
        assert_eq!(tex.format, 0x1A01);
        assert_eq!(bntx.texture_data_offset(tex), 0x190);
        assert_eq!(bntx.texture_data(&data, tex).unwrap()[15], 15);
    }

    #[test]
    fn rejects_other_files() {
        assert!(matches!(
            Bntx::decode(b"FRES    ", &DecodeOptions::default()),
            Err(Error::UnsupportedFileType { .. })
        ));
    }
}
