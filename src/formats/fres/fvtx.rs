//! FVTX vertex buffers.
//!
//! ## Layout (0x60 bytes)
//! ```text
//! [0x00] Magic "FVTX"                 (4 bytes)
//! [0x04] Block header                 (3 × u32)
//! [0x10] Attribute array              (u64)
//! [0x18] Attribute dict               (u64)
//! [0x20] Memory pool                  (u64)
//! [0x28] Runtime buffer array         (u64)
//! [0x30] User buffer array            (u64)
//! [0x38] Buffer size array            (u64, 0x10-byte entries)
//! [0x40] Buffer stride array          (u64, 0x10-byte entries)
//! [0x48] Buffer array                 (u64)
//! [0x50] Buffer data offset           (u32, relative to the data region)
//! [0x54] Attribute count              (u8)
//! [0x55] Buffer count                 (u8)
//! [0x56] Index                        (u16)
//! [0x58] Vertex count                 (u32)
//! [0x5C] Skin weight influence        (u32)
//! ```
//!
//! Attributes are 0x10 bytes: name (u64), format (u32), offset within the
//! vertex (u16), buffer index (u16). Buffers are stored back to back from the
//! buffer data offset.

use std::collections::HashMap;

use super::attrib::{AttribFormat, AttribValue};
use super::dict::NameDict;
use super::Ctx;
use crate::codec::{Field, FieldKind, Record, StructCodec};
use crate::diagnostics::IntegrityWarning;
use crate::reader::ByteOrder;
use crate::{Error, Result};

pub(crate) static FVTX_HEADER: StructCodec = StructCodec::new(
    "FVTX",
    &[
        Field::new("magic", FieldKind::Magic(b"FVTX")),
        Field::new("block", FieldKind::Repeat(&FieldKind::U32, 3)),
        Field::new("attrib_array_offs", FieldKind::Offset64),
        Field::new("attrib_dict_offs", FieldKind::Offset64),
        Field::new("mem_pool", FieldKind::Offset64),
        Field::new("runtime_buf_array", FieldKind::Offset64),
        Field::new("user_buf_array", FieldKind::Offset64),
        Field::new("bufsize_offs", FieldKind::Offset64),
        Field::new("stride_offs", FieldKind::Offset64),
        Field::new("buf_array_offs", FieldKind::Offset64),
        Field::new("vtx_buf_offs", FieldKind::Offset32),
        Field::new("num_attrs", FieldKind::U8),
        Field::new("num_bufs", FieldKind::U8),
        Field::new("index", FieldKind::U16),
        Field::new("num_vtxs", FieldKind::U32),
        Field::new("skin_weight_influence", FieldKind::U32),
    ],
);

pub(crate) static ATTRIBUTE: StructCodec = StructCodec::new(
    "FVTX attribute",
    &[
        Field::new("name", FieldKind::Str64),
        Field::new("format", FieldKind::Bytes(4)),
        Field::new("buf_offs", FieldKind::U16),
        Field::new("buf_idx", FieldKind::U16),
    ],
);

pub(crate) static BUFFER_INFO: StructCodec = StructCodec::new(
    "FVTX buffer info",
    &[Field::new("value", FieldKind::U32), Field::pad(12)],
);

/// One attribute declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub offset: u64,
    /// Raw format code, kept even when the format is unknown.
    pub format_code: u32,
    pub format: Option<AttribFormat>,
    /// Byte offset of this attribute within one vertex.
    pub buf_offs: u16,
    pub buf_idx: u16,
}

/// One raw vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    /// Absolute offset of the data.
    pub offset: u64,
    pub size: u32,
    pub stride: u32,
    pub data: Vec<u8>,
}

/// Per-vertex values, indexed like [`VertexBuffer::attributes`].
///
/// An entry is `None` when its attribute's format is unknown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vertex {
    pub values: Vec<Option<AttribValue>>,
}

impl Vertex {
    pub fn get(&self, attr: usize) -> Option<&AttribValue> {
        self.values.get(attr).and_then(Option::as_ref)
    }
}

/// A decoded FVTX.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    pub offset: u64,
    pub index: u16,
    pub num_vertices: u32,
    pub skin_weight_influence: u32,
    pub attributes: Vec<Attribute>,
    pub attrib_dict: NameDict,
    pub buffers: Vec<Buffer>,
    /// Empty unless vertex materialisation is enabled.
    pub vertices: Vec<Vertex>,
    order: ByteOrder,
    by_name: HashMap<String, usize>,
    pub header: Record,
}

impl VertexBuffer {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64) -> Result<Self> {
        let header = FVTX_HEADER.decode(&ctx.r, offset)?;
        let num_attrs = ctx.opts.check_entries("attribute", header.uint("num_attrs")?)?;
        let num_bufs = ctx.opts.check_entries("vertex buffer", header.uint("num_bufs")?)?;
        let num_vertices = ctx.opts.check_vertices("vertex", header.uint("num_vtxs")?)?;

        let mut attributes = Vec::with_capacity(num_attrs);
        for rec in ATTRIBUTE.decode_array(&ctx.r, header.offset_of("attrib_array_offs")?, num_attrs)? {
            let format_code = u32::from_be_bytes(
                rec.bytes("format")?
                    .try_into()
                    .map_err(|_| Error::decode(ctx.r.data(), rec.offset, "short format field"))?,
            ) & 0xFFFF;
            let name = rec.text("name")?.to_owned();
            let format = AttribFormat::from_code(format_code);
            if format.is_none() {
                ctx.diag.warn(IntegrityWarning::UnknownAttribFormat {
                    name: name.clone(),
                    offset: rec.offset,
                    code: format_code,
                });
            }
            attributes.push(Attribute {
                name,
                offset: rec.offset,
                format_code,
                format,
                buf_offs: rec.uint("buf_offs")? as u16,
                buf_idx: rec.uint("buf_idx")? as u16,
            });
        }

        let mut by_name = HashMap::with_capacity(attributes.len());
        for (i, a) in attributes.iter().enumerate() {
            if by_name.insert(a.name.clone(), i).is_some() {
                ctx.diag.warn(IntegrityWarning::DuplicateName {
                    context: format!("vertex buffer at {offset:#x}"),
                    name: a.name.clone(),
                });
            }
        }
        let attrib_dict = ctx.dict(header.offset_of("attrib_dict_offs")?, "vertex attributes")?;

        let sizes = BUFFER_INFO.decode_array(&ctx.r, header.offset_of("bufsize_offs")?, num_bufs)?;
        let strides = BUFFER_INFO.decode_array(&ctx.r, header.offset_of("stride_offs")?, num_bufs)?;
        let mut pos = ctx.data_start + header.offset_of("vtx_buf_offs")?;
        let mut buffers = Vec::with_capacity(num_bufs);
        for (size, stride) in sizes.iter().zip(&strides) {
            let size = size.uint("value")? as u32;
            let stride = stride.uint("value")? as u32;
            buffers.push(Buffer {
                offset: pos,
                size,
                stride,
                data: ctx.r.bytes_at(pos, size as usize)?.to_vec(),
            });
            pos += size as u64;
        }

        for a in &attributes {
            if a.buf_idx as usize >= buffers.len() {
                return Err(Error::decode(
                    ctx.r.data(),
                    a.offset,
                    format!(
                        "attribute '{}' uses buffer {} of {}",
                        a.name,
                        a.buf_idx,
                        buffers.len()
                    ),
                ));
            }
        }

        let mut vb = Self {
            offset,
            index: header.uint("index")? as u16,
            num_vertices: num_vertices as u32,
            skin_weight_influence: header.uint("skin_weight_influence")? as u32,
            attributes,
            attrib_dict,
            buffers,
            vertices: Vec::new(),
            order: ctx.r.order(),
            by_name,
            header,
        };
        if ctx.opts.materialize_vertices {
            vb.vertices = (0..num_vertices)
                .map(|v| {
                    let values = (0..vb.attributes.len())
                        .map(|a| vb.read_vertex(a, v))
                        .collect::<Result<_>>()?;
                    Ok(Vertex { values })
                })
                .collect::<Result<_>>()?;
        }
        tracing::trace!(
            offset,
            attrs = vb.attributes.len(),
            buffers = vb.buffers.len(),
            vertices = num_vertices,
            "decoded vertex buffer"
        );
        Ok(vb)
    }

    /// Index of the attribute named `name`.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attribute_index(name).map(|i| &self.attributes[i])
    }

    /// Decode attribute `attr` of vertex `vertex` straight from its buffer.
    ///
    /// `Ok(None)` when the attribute's format is unknown.
    pub fn read_vertex(&self, attr: usize, vertex: usize) -> Result<Option<AttribValue>> {
        let a = self.attributes.get(attr).ok_or(Error::OutOfBounds {
            offset: self.offset,
            len: attr,
            size: self.attributes.len(),
        })?;
        let Some(format) = a.format else {
            return Ok(None);
        };
        let buf = self.buffers.get(a.buf_idx as usize).ok_or(Error::OutOfBounds {
            offset: a.offset,
            len: a.buf_idx as usize,
            size: self.buffers.len(),
        })?;
        let start = a.buf_offs as usize + vertex * buf.stride as usize;
        let bytes = buf
            .data
            .get(start..start + format.size())
            .ok_or(Error::OutOfBounds {
                offset: buf.offset + start as u64,
                len: format.size(),
                size: buf.data.len(),
            })?;
        Ok(Some(format.unpack(bytes, self.order)))
    }

    /// Every vertex's value for the attribute named `name`.
    pub fn column(&self, name: &str) -> Result<Vec<Option<AttribValue>>> {
        let Some(a) = self.attribute_index(name) else {
            return Ok(Vec::new());
        };
        (0..self.num_vertices as usize)
            .map(|v| match self.vertices.get(v) {
                Some(vtx) => Ok(vtx.values.get(a).cloned().flatten()),
                None => self.read_vertex(a, v),
            })
            .collect()
    }
}
