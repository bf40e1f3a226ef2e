//! BFRES (`FRES`) - Nintendo Switch binary model resource container.
//!
//! Holds models (FMDL) with their vertex buffers (FVTX), shapes (FSHP),
//! materials (FMAT) and skeleton (FSKL), animation sections, and arbitrary
//! embedded files (usually BNTX textures).
//!
//! ## Layout
//! ```text
//! [0x00]  FRES header        (0xD0 bytes, see [`header`])
//! [...]   Section records    (FMDL, FVTX, FSHP, FSKL, FMAT, ...)
//! [...]   _DIC name trees    (one per section list)
//! [...]   _STR string table
//! [...]   _RLT relocation table
//! [data]  Raw vertex / index buffers, embedded file payloads
//! ```
//!
//! Decoding is a single pass over an owned byte buffer:
//!
//! 1. header, which fixes the byte order
//! 2. relocation table, which gives the start of the raw data region
//! 3. string table
//! 4. each section kind, through its name dictionary
//!
//! A failure inside one model or embedded file is recorded in
//! [`Container::failures`] and the remaining sections still decode, unless
//! [`DecodeOptions::strict`] is set.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::codec::{Record, StructCodec};
use crate::diagnostics::{Diagnostics, IntegrityWarning, TracingSink};
use crate::formats::FileKind;
use crate::options::DecodeOptions;
use crate::reader::{ByteOrder, ByteReader, Primitive};
use crate::{Error, Result};

pub mod attrib;
pub mod dict;
pub mod dump;
pub mod embed;
pub mod fmat;
pub mod fmdl;
pub mod fshp;
pub mod fskl;
pub mod fvtx;
pub mod header;
pub mod rlt;
pub mod strtab;

pub use attrib::{AttribFormat, AttribValue, Component, Conversion};
pub use dict::NameDict;
pub use dump::Dump;
pub use embed::EmbeddedFile;
pub use fmat::Material;
pub use fmdl::Model;
pub use fshp::{Faces, IndexFormat, Lod, PrimitiveTopology, Shape, Submesh};
pub use fskl::{Bone, Matrix4x3, Skeleton};
pub use fvtx::{Attribute, Buffer, Vertex, VertexBuffer};
pub use header::{ContainerHeader, SectionKind, SectionSlot};
pub use rlt::RelocationTable;
pub use strtab::StringTable;

/// Shared state for one container decode.
pub(crate) struct Ctx<'a> {
    pub r: ByteReader<'a>,
    pub data_start: u64,
    pub opts: &'a DecodeOptions,
    pub diag: &'a mut dyn Diagnostics,
    skeletons: HashMap<u64, Arc<Skeleton>>,
}

impl<'a> Ctx<'a> {
    pub fn new(
        r: ByteReader<'a>,
        data_start: u64,
        opts: &'a DecodeOptions,
        diag: &'a mut dyn Diagnostics,
    ) -> Self {
        Self {
            r,
            data_start,
            opts,
            diag,
            skeletons: HashMap::new(),
        }
    }

    /// Decode the dictionary at `offset`; an absent (0) offset gives an
    /// empty dictionary.
    pub fn dict(&mut self, offset: u64, context: &str) -> Result<NameDict> {
        if offset == 0 {
            return Ok(NameDict::default());
        }
        NameDict::decode(&self.r, offset, self.opts, self.diag, context)
    }

    /// The skeleton at `offset`, decoded once per container.
    pub fn skeleton(&mut self, offset: u64) -> Result<Arc<Skeleton>> {
        if let Some(s) = self.skeletons.get(&offset) {
            return Ok(Arc::clone(s));
        }
        let s = Arc::new(Skeleton::decode(self, offset)?);
        self.skeletons.insert(offset, Arc::clone(&s));
        Ok(s)
    }
}

/// Names of one kind of top-level section, without decoding the records.
#[derive(Debug, Clone)]
pub struct SectionIndex {
    pub kind: SectionKind,
    /// Offset of the record array.
    pub offset: u64,
    /// Declared record count.
    pub count: u16,
    pub dict: NameDict,
}

impl SectionIndex {
    /// Entry names in storage order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dict.entries().map(|(n, _)| n)
    }
}

/// A top-level section that failed to decode.
#[derive(Debug)]
pub struct SectionFailure {
    pub kind: SectionKind,
    pub index: usize,
    pub name: String,
    pub error: Error,
}

/// A decoded FRES file.
#[derive(Debug)]
pub struct Container {
    data: Vec<u8>,
    pub header: ContainerHeader,
    pub relocation: RelocationTable,
    pub strings: StringTable,
    pub models: Vec<Model>,
    pub embeds: Vec<EmbeddedFile>,
    /// Every populated section kind, in header order.
    pub sections: Vec<SectionIndex>,
    /// Sections skipped in non-strict mode.
    pub failures: Vec<SectionFailure>,
}

impl Container {
    /// Decode with default options, sending warnings to `tracing`.
    pub fn decode(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::decode_with(data, &DecodeOptions::default(), &mut TracingSink)
    }

    /// Read a whole stream and decode it.
    pub fn from_reader<R: Read>(r: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::decode(data)
    }

    pub fn decode_with(
        data: impl Into<Vec<u8>>,
        opts: &DecodeOptions,
        diag: &mut dyn Diagnostics,
    ) -> Result<Self> {
        let data = data.into();
        match FileKind::detect(&data) {
            FileKind::Fres => {}
            #[cfg(feature = "compression")]
            FileKind::Zstd => {
                tracing::debug!(len = data.len(), "decompressing zstd input");
                let inner =
                    crate::compression::zstd::decompress_zstd(&data, opts.max_decompressed_size)?;
                return Self::decode_with(inner, opts, diag);
            }
            _ => {
                return Err(Error::UnsupportedFileType {
                    magic: data.iter().take(4).copied().collect(),
                });
            }
        }

        let header = ContainerHeader::decode(&data, diag)?;
        tracing::debug!(
            name = %header.name,
            version = ?header.version,
            order = header.byte_order.name(),
            "decoding FRES"
        );
        let r = ByteReader::new(&data, header.byte_order);
        let relocation = RelocationTable::decode(&r, header.rlt_offset, opts)?;
        let strings = match header.str_tab_offset {
            0 => StringTable::default(),
            at => {
                let table = at.checked_sub(StringTable::HEADER_SIZE).ok_or_else(|| {
                    Error::decode(&data, 0xB0, format!("string table offset {at:#x} too small"))
                })?;
                StringTable::decode(&r, table, opts)?
            }
        };

        let mut ctx = Ctx::new(r, relocation.data_start, opts, diag);
        let mut sections = Vec::new();
        let mut failures = Vec::new();
        let mut models = Vec::new();
        let mut embeds = Vec::new();

        for kind in SectionKind::ALL {
            let slot = header.section(kind);
            if slot.dict_offset == 0 {
                if slot.count > 0 {
                    tracing::debug!(%kind, count = slot.count, "section has records but no dictionary");
                } else {
                    tracing::debug!(%kind, "no sections");
                }
                continue;
            }
            let index = match section_index(&mut ctx, kind, slot) {
                Ok(index) => index,
                Err(error) if !opts.strict => {
                    tracing::warn!(%kind, %error, "section dictionary failed to decode");
                    failures.push(SectionFailure {
                        kind,
                        index: 0,
                        name: String::new(),
                        error,
                    });
                    continue;
                }
                Err(error) => return Err(error),
            };

            match kind {
                SectionKind::Model => {
                    for i in 0..index.count as usize {
                        let at = slot.offset + (i * fmdl::FMDL_HEADER.size) as u64;
                        let name = index.dict.name(i).unwrap_or_default().to_owned();
                        match Model::decode(&mut ctx, at) {
                            Ok(mut m) => {
                                // A short dictionary leaves the record's own name.
                                if !name.is_empty() && m.name != name {
                                    if !m.name.is_empty() {
                                        ctx.diag.warn(IntegrityWarning::NameMismatch {
                                            context: kind.tag().to_owned(),
                                            dict: name.clone(),
                                            record: std::mem::take(&mut m.name),
                                        });
                                    }
                                    m.name = name;
                                }
                                models.push(m);
                            }
                            Err(error) => {
                                fail(opts, &mut failures, kind, i, name, error)?;
                            }
                        }
                    }
                }
                SectionKind::EmbeddedFile => {
                    for i in 0..index.count as usize {
                        let at = slot.offset + (i * embed::EMBED.size) as u64;
                        let name = index.dict.name(i).unwrap_or_default().to_owned();
                        match EmbeddedFile::decode(&mut ctx, at, name.clone()) {
                            Ok(f) => embeds.push(f),
                            Err(error) => {
                                fail(opts, &mut failures, kind, i, name, error)?;
                            }
                        }
                    }
                }
                _ => {}
            }
            sections.push(index);
        }
        drop(ctx);

        Ok(Self {
            data,
            header,
            relocation,
            strings,
            models,
            embeds,
            sections,
            failures,
        })
    }

    /// The decoded file bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A reader over the file in its byte order.
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.data, self.header.byte_order)
    }

    /// Read `count` values at absolute `pos`.
    pub fn read<T: Primitive>(&self, pos: u64, count: usize) -> Result<Vec<T>> {
        self.reader().read_many_at(pos, count)
    }

    /// Read `count` values at `pos` relative to the raw data region.
    pub fn read_relative<T: Primitive>(&self, pos: u64, count: usize) -> Result<Vec<T>> {
        self.read(self.relocation.data_start + pos, count)
    }

    /// Decode any fixed-layout record at `pos`.
    pub fn read_struct(&self, codec: &'static StructCodec, pos: u64) -> Result<Record> {
        codec.decode(&self.reader(), pos)
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn version(&self) -> (u16, u16) {
        self.header.version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Model named `name`, through the model dictionary.
    pub fn model(&self, name: &str) -> Option<&Model> {
        let at = self.section(SectionKind::Model)?.dict.lookup(name)?;
        self.models.iter().find(|m| m.offset == at)
    }

    /// Embedded file named `name`, through the embedded-file dictionary.
    pub fn embed(&self, name: &str) -> Option<&EmbeddedFile> {
        let at = self.section(SectionKind::EmbeddedFile)?.dict.lookup(name)?;
        self.embeds.iter().find(|f| f.record == at)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionIndex> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

fn section_index(ctx: &mut Ctx<'_>, kind: SectionKind, slot: SectionSlot) -> Result<SectionIndex> {
    ctx.opts.check_entries("section", slot.count as u64)?;
    let stride = match kind {
        SectionKind::Model => Some(fmdl::FMDL_HEADER.size),
        SectionKind::EmbeddedFile => Some(embed::EMBED.size),
        _ => None,
    };
    let mut dict = ctx.dict(slot.dict_offset, kind.tag())?;
    if let Some(stride) = stride {
        dict = dict.bind(slot.offset, stride as u64);
    }
    if dict.len() < slot.count as usize {
        ctx.diag.warn(IntegrityWarning::DictCountMismatch {
            context: kind.to_string(),
            entries: dict.len(),
            count: slot.count as usize,
        });
    }
    Ok(SectionIndex {
        kind,
        offset: slot.offset,
        count: slot.count,
        dict,
    })
}

fn fail(
    opts: &DecodeOptions,
    failures: &mut Vec<SectionFailure>,
    kind: SectionKind,
    index: usize,
    name: String,
    error: Error,
) -> Result<()> {
    if opts.strict {
        return Err(error);
    }
    tracing::warn!(%kind, index, name = %name, %error, "section failed to decode; skipping");
    failures.push(SectionFailure {
        kind,
        index,
        name,
        error,
    });
    Ok(())
}
