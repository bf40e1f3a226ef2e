//! FRES file header.
//!
//! ## Layout (0xD0 bytes)
//! ```text
//! [0x00] Magic "FRES    "                     (8 bytes)
//! [0x08] Version                              (2 × u16)
//! [0x0C] BOM (FF FE = LE, FE FF = BE)         (2 raw bytes)
//! [0x0E] HeaderLen                            (u16)
//! [0x10] Name (-> null-terminated)            (u32)
//! [0x14] Alignment                            (u32)
//! [0x18] RelocTableOffset                     (u32)
//! [0x1C] FileSize                             (u32)
//! [0x20] Name2 (-> length-prefixed)           (u64)
//! [0x28] Model array / dict                   (2 × u64)
//! [0x38] Skeletal anim array / dict           (2 × u64)
//! [0x48] Material anim array / dict           (2 × u64)
//! [0x58] Visibility anim array / dict         (2 × u64)
//! [0x68] Shape anim array / dict              (2 × u64)
//! [0x78] Scene anim array / dict              (2 × u64)
//! [0x88] Buffer memory pool / pool info       (2 × u64)
//! [0x98] Embedded file array / dict           (2 × u64)
//! [0xA8] Reserved                             (u64)
//! [0xB0] StringTableOffset (-> first string)  (u64)
//! [0xB8] StringTableSize                      (u32)
//! [0xBC] Counts, one per section kind         (7 × u16)
//! [0xCA] Reserved                             (3 × u16)
//! ```

use std::fmt;

use crate::codec::{Field, FieldKind, Record, StructCodec, Value};
use crate::diagnostics::{Diagnostics, IntegrityWarning};
use crate::reader::{ByteOrder, ByteReader};
use crate::{Error, Result};

/// The only version this decoder was written against.
pub const KNOWN_VERSION: (u16, u16) = (3, 5);

pub(crate) static HEADER: StructCodec = StructCodec::new(
    "FRES",
    &[
        Field::new("magic", FieldKind::Magic(b"FRES    ")),
        Field::new("version", FieldKind::Repeat(&FieldKind::U16, 2)),
        Field::new("byte_order", FieldKind::Bytes(2)),
        Field::new("header_len", FieldKind::U16),
        Field::new("name", FieldKind::CStr32),
        Field::new("alignment", FieldKind::U32),
        Field::new("rlt_offset", FieldKind::Offset32),
        Field::new("file_size", FieldKind::U32),
        Field::new("name2", FieldKind::Str64),
        Field::new("fmdl_offset", FieldKind::Offset64),
        Field::new("fmdl_dict_offset", FieldKind::Offset64),
        Field::new("fska_offset", FieldKind::Offset64),
        Field::new("fska_dict_offset", FieldKind::Offset64),
        Field::new("fmaa_offset", FieldKind::Offset64),
        Field::new("fmaa_dict_offset", FieldKind::Offset64),
        Field::new("fvis_offset", FieldKind::Offset64),
        Field::new("fvis_dict_offset", FieldKind::Offset64),
        Field::new("fshu_offset", FieldKind::Offset64),
        Field::new("fshu_dict_offset", FieldKind::Offset64),
        Field::new("fscn_offset", FieldKind::Offset64),
        Field::new("fscn_dict_offset", FieldKind::Offset64),
        Field::new("buf_mem_pool", FieldKind::Offset64),
        Field::new("buf_mem_pool_info", FieldKind::Offset64),
        Field::new("embed_offset", FieldKind::Offset64),
        Field::new("embed_dict_offset", FieldKind::Offset64),
        Field::new("unk_a8", FieldKind::U64),
        Field::new("str_tab_offset", FieldKind::Offset64),
        Field::new("str_tab_size", FieldKind::U32),
        Field::new("fmdl_cnt", FieldKind::U16),
        Field::new("fska_cnt", FieldKind::U16),
        Field::new("fmaa_cnt", FieldKind::U16),
        Field::new("fvis_cnt", FieldKind::U16),
        Field::new("fshu_cnt", FieldKind::U16),
        Field::new("fscn_cnt", FieldKind::U16),
        Field::new("embed_cnt", FieldKind::U16),
        Field::new("unk_ca", FieldKind::U16),
        Field::new("unk_cc", FieldKind::U16),
        Field::new("unk_ce", FieldKind::U16),
    ],
);

/// Kinds of top-level section a FRES can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Model = 0,
    SkeletalAnim,
    MaterialAnim,
    VisibilityAnim,
    ShapeAnim,
    SceneAnim,
    EmbeddedFile,
}

impl SectionKind {
    /// Every kind, in header order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Model,
        SectionKind::SkeletalAnim,
        SectionKind::MaterialAnim,
        SectionKind::VisibilityAnim,
        SectionKind::ShapeAnim,
        SectionKind::SceneAnim,
        SectionKind::EmbeddedFile,
    ];

    /// Short tag used in dumps and log lines.
    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::Model => "FMDL",
            SectionKind::SkeletalAnim => "FSKA",
            SectionKind::MaterialAnim => "FMAA",
            SectionKind::VisibilityAnim => "FVIS",
            SectionKind::ShapeAnim => "FSHU",
            SectionKind::SceneAnim => "FSCN",
            SectionKind::EmbeddedFile => "EMBED",
        }
    }

    fn fields(self) -> (&'static str, &'static str, &'static str) {
        match self {
            SectionKind::Model => ("fmdl_offset", "fmdl_dict_offset", "fmdl_cnt"),
            SectionKind::SkeletalAnim => ("fska_offset", "fska_dict_offset", "fska_cnt"),
            SectionKind::MaterialAnim => ("fmaa_offset", "fmaa_dict_offset", "fmaa_cnt"),
            SectionKind::VisibilityAnim => ("fvis_offset", "fvis_dict_offset", "fvis_cnt"),
            SectionKind::ShapeAnim => ("fshu_offset", "fshu_dict_offset", "fshu_cnt"),
            SectionKind::SceneAnim => ("fscn_offset", "fscn_dict_offset", "fscn_cnt"),
            SectionKind::EmbeddedFile => ("embed_offset", "embed_dict_offset", "embed_cnt"),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where one kind of section lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionSlot {
    /// Offset of the record array (0 = absent).
    pub offset: u64,
    /// Offset of the name dictionary (0 = absent).
    pub dict_offset: u64,
    /// Number of records.
    pub count: u16,
}

/// Decoded FRES header.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    pub version: (u16, u16),
    pub byte_order: ByteOrder,
    /// The byte-order marker as read from the file (0xFFFE or 0xFEFF).
    pub marker: u16,
    pub header_len: u16,
    pub name: String,
    pub name2: String,
    pub alignment: u32,
    pub rlt_offset: u64,
    pub file_size: u32,
    pub buf_mem_pool: u64,
    pub buf_mem_pool_info: u64,
    pub str_tab_offset: u64,
    pub str_tab_size: u32,
    sections: [SectionSlot; 7],
    /// Every header field by name.
    pub record: Record,
}

impl ContainerHeader {
    pub const SIZE: usize = HEADER.size;

    /// Decode the header at the start of `data`.
    ///
    /// The byte order is taken from the marker at 0x0C before any multi-byte
    /// field is read.
    pub fn decode(data: &[u8], diag: &mut dyn Diagnostics) -> Result<Self> {
        if data.get(..4) != Some(b"FRES".as_slice()) {
            return Err(Error::UnsupportedFileType {
                magic: data.iter().take(4).copied().collect(),
            });
        }
        let probe = ByteReader::new(data, ByteOrder::Big);
        let marker: u16 = probe.read_at(0x0C)?;
        let byte_order = ByteOrder::from_marker(marker)?;
        let r = probe.with_order(byte_order);

        let rec = HEADER.decode(&r, 0)?;
        let version = match rec.list("version")? {
            [Value::UInt(a), Value::UInt(b)] => (*a as u16, *b as u16),
            _ => return Err(Error::decode(data, 0x08, "malformed version field")),
        };
        if version != KNOWN_VERSION {
            diag.warn(IntegrityWarning::UnknownVersion { version });
        }

        let mut sections = [SectionSlot::default(); 7];
        for kind in SectionKind::ALL {
            let (off, dict, cnt) = kind.fields();
            sections[kind as usize] = SectionSlot {
                offset: rec.offset_of(off)?,
                dict_offset: rec.offset_of(dict)?,
                count: rec.uint(cnt)? as u16,
            };
        }

        let header = Self {
            version,
            byte_order,
            marker,
            header_len: rec.uint("header_len")? as u16,
            name: rec.text("name")?.to_owned(),
            name2: rec.text("name2")?.to_owned(),
            alignment: rec.uint("alignment")? as u32,
            rlt_offset: rec.offset_of("rlt_offset")?,
            file_size: rec.uint("file_size")? as u32,
            buf_mem_pool: rec.offset_of("buf_mem_pool")?,
            buf_mem_pool_info: rec.offset_of("buf_mem_pool_info")?,
            str_tab_offset: rec.offset_of("str_tab_offset")?,
            str_tab_size: rec.uint("str_tab_size")? as u32,
            sections,
            record: rec,
        };
        header.validate(data)?;
        Ok(header)
    }

    /// Every offset must be 0 or inside the buffer.
    fn validate(&self, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        for (name, value) in self.record.iter() {
            if let Value::Offset(off) = value
                && *off >= len
            {
                return Err(Error::decode(
                    data,
                    self.record.offset,
                    format!("header field {name} = {off:#x} lies outside the file ({len:#x} bytes)"),
                ));
            }
        }
        Ok(())
    }

    /// Location of one kind of section.
    pub fn section(&self, kind: SectionKind) -> SectionSlot {
        self.sections[kind as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Collector;

    fn minimal(marker: [u8; 2]) -> Vec<u8> {
        let mut b = vec![0u8; 0xD0];
        b[..8].copy_from_slice(b"FRES    ");
        b[0x08..0x0A].copy_from_slice(&3u16.to_le_bytes());
        b[0x0A..0x0C].copy_from_slice(&5u16.to_le_bytes());
        b[0x0C..0x0E].copy_from_slice(&marker);
        b[0x0E..0x10].copy_from_slice(&0x0Cu16.to_le_bytes());
        b[0xBC..0xBE].copy_from_slice(&2u16.to_le_bytes());
        b
    }

    #[test]
    fn header_is_0xd0_bytes() {
        assert_eq!(ContainerHeader::SIZE, 0xD0);
    }

    #[test]
    fn little_endian_marker() {
        let mut diag = Collector::new();
        let h = ContainerHeader::decode(&minimal([0xFF, 0xFE]), &mut diag).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Little);
        assert_eq!(h.marker, 0xFFFE);
        assert_eq!(h.version, (3, 5));
        assert_eq!(h.section(SectionKind::Model).count, 2);
        assert!(diag.is_empty());
    }

    #[test]
    fn big_endian_marker() {
        let mut b = minimal([0xFE, 0xFF]);
        b[0x08..0x0A].copy_from_slice(&3u16.to_be_bytes());
        b[0x0A..0x0C].copy_from_slice(&5u16.to_be_bytes());
        b[0xBC..0xBE].copy_from_slice(&2u16.to_be_bytes());
        let h = ContainerHeader::decode(&b, &mut Collector::new()).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Big);
        assert_eq!(h.section(SectionKind::Model).count, 2);
    }

    #[test]
    fn slots_follow_header_order() {
        for (i, kind) in SectionKind::ALL.into_iter().enumerate() {
            assert_eq!(kind as usize, i, "{kind}");
        }
        let mut b = minimal([0xFF, 0xFE]);
        b[0xC8..0xCA].copy_from_slice(&3u16.to_le_bytes());
        let h = ContainerHeader::decode(&b, &mut Collector::new()).unwrap();
        assert_eq!(h.section(SectionKind::Model).count, 2);
        assert_eq!(h.section(SectionKind::EmbeddedFile).count, 3);
        for kind in &SectionKind::ALL[1..6] {
            assert_eq!(h.section(*kind).count, 0, "{kind}");
        }
    }

    #[test]
    fn other_marker_is_fatal() {
        let err = ContainerHeader::decode(&minimal([0x12, 0x34]), &mut Collector::new());
        assert!(matches!(err, Err(Error::InvalidByteOrder(0x1234))));
    }

    #[test]
    fn unknown_version_warns() {
        let mut b = minimal([0xFF, 0xFE]);
        b[0x0A..0x0C].copy_from_slice(&9u16.to_le_bytes());
        let mut diag = Collector::new();
        ContainerHeader::decode(&b, &mut diag).unwrap();
        assert_eq!(
            diag.warnings,
            vec![IntegrityWarning::UnknownVersion { version: (3, 9) }]
        );
    }

    #[test]
    fn offsets_outside_file_are_rejected() {
        let mut b = minimal([0xFF, 0xFE]);
        b[0x28..0x30].copy_from_slice(&0x1000u64.to_le_bytes());
        assert!(matches!(
            ContainerHeader::decode(&b, &mut Collector::new()),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn non_fres_input_is_unsupported() {
        let err = ContainerHeader::decode(b"Yaz0\0\0\0\0", &mut Collector::new());
        assert!(matches!(err, Err(Error::UnsupportedFileType { magic }) if magic == b"Yaz0"));
    }
}
