//! FSHP shapes and their levels of detail.
//!
//! ## Layout (0x70 bytes)
//! ```text
//! [0x00] Magic "FSHP"                 (4 bytes)
//! [0x04] Block header                 (3 × u32)
//! [0x10] Name                         (u64)
//! [0x18] FVTX offset                  (u64)
//! [0x20] LOD array                    (u64)
//! [0x28] Skin bone index array        (u64)
//! [0x30] Unknown                      (2 × u64)
//! [0x40] Bounding box array           (u64)
//! [0x48] Bounding radius array        (u64)
//! [0x50] Unknown                      (u64)
//! [0x58] Flags                        (u32)
//! [0x5C] Index                        (u16)
//! [0x5E] Material index               (u16)
//! [0x60] Single bind bone             (u16)
//! [0x62] FVTX index                   (u16)
//! [0x64] Skin bone index count        (u16)
//! [0x66] Vertex skin count            (u8)
//! [0x67] LOD count                    (u8)
//! [0x68] Visibility group count       (u32)
//! [0x6C] Bounding array count         (u16)
//! [0x6E] Padding                      (2 bytes)
//! ```
//!
//! LODs are 0x38 bytes each:
//! ```text
//! [0x00] Submesh array                (u64)
//! [0x08] Memory pool                  (u64)
//! [0x10] Buffer                       (u64)
//! [0x18] Buffer size                  (u64)
//! [0x20] Index buffer offset          (u32, relative to the data region)
//! [0x24] Primitive topology           (u32)
//! [0x28] Index format                 (u32)
//! [0x2C] Index count                  (u32)
//! [0x30] First vertex                 (u32)
//! [0x34] Submesh count                (u16)
//! [0x36] Padding                      (2 bytes)
//! ```

use std::fmt;

use super::dict::NameDict;
use super::fvtx::VertexBuffer;
use super::Ctx;
use crate::codec::{Field, FieldKind, FlagSet, FlagTable, Record, StructCodec};
use crate::diagnostics::IntegrityWarning;
use crate::{Error, Result};

pub const SHAPE_FLAGS: FlagTable = &[
    ("HAS_VERTEX_BUFFER", 0x2),
    ("SUBMESH_BOUNDARY_CONSISTENT", 0x4),
];

pub(crate) static FSHP_HEADER: StructCodec = StructCodec::new(
    "FSHP",
    &[
        Field::new("magic", FieldKind::Magic(b"FSHP")),
        Field::new("block", FieldKind::Repeat(&FieldKind::U32, 3)),
        Field::new("name", FieldKind::Str64),
        Field::new("fvtx_offset", FieldKind::Offset64),
        Field::new("lod_offset", FieldKind::Offset64),
        Field::new("skin_bone_idx_offs", FieldKind::Offset64),
        Field::new("unk30", FieldKind::Offset64),
        Field::new("unk38", FieldKind::Offset64),
        Field::new("bbox_offset", FieldKind::Offset64),
        Field::new("bradius_offset", FieldKind::Offset64),
        Field::new("unk50", FieldKind::Offset64),
        Field::new("flags", FieldKind::Flags32(SHAPE_FLAGS)),
        Field::new("index", FieldKind::U16),
        Field::new("fmat_idx", FieldKind::U16),
        Field::new("single_bind", FieldKind::U16),
        Field::new("fvtx_idx", FieldKind::U16),
        Field::new("skin_bone_idx_cnt", FieldKind::U16),
        Field::new("vtx_skin_cnt", FieldKind::U8),
        Field::new("lod_cnt", FieldKind::U8),
        Field::new("vis_group_cnt", FieldKind::U32),
        Field::new("fskl_array_cnt", FieldKind::U16),
        Field::pad(2),
    ],
);

pub(crate) static LOD: StructCodec = StructCodec::new(
    "FSHP LOD",
    &[
        Field::new("submesh_array_offs", FieldKind::Offset64),
        Field::new("mem_pool", FieldKind::Offset64),
        Field::new("buffer", FieldKind::Offset64),
        Field::new("bufsize_offs", FieldKind::Offset64),
        Field::new("face_buf_offs", FieldKind::Offset32),
        Field::new("prim_fmt", FieldKind::U32),
        Field::new("idx_fmt", FieldKind::U32),
        Field::new("idx_cnt", FieldKind::U32),
        Field::new("first_vtx", FieldKind::U32),
        Field::new("submesh_cnt", FieldKind::U16),
        Field::pad(2),
    ],
);

pub(crate) static SUBMESH: StructCodec = StructCodec::new(
    "FSHP submesh",
    &[
        Field::new("offset", FieldKind::U32),
        Field::new("count", FieldKind::U32),
    ],
);

/// How an index buffer groups vertices into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    LinesAdjacency,
    LineStripAdjacency,
    TrianglesAdjacency,
    TriangleStripAdjacency,
    Patches,
    Other(u32),
}

impl PrimitiveTopology {
    pub fn from_raw(raw: u32) -> Self {
        use PrimitiveTopology::*;
        match raw {
            0x00 => Points,
            0x01 => Lines,
            0x02 => LineLoop,
            0x03 => LineStrip,
            0x04 => Triangles,
            0x05 => TriangleStrip,
            0x06 => TriangleFan,
            0x07 => Quads,
            0x08 => QuadStrip,
            0x09 => LinesAdjacency,
            0x0A => LineStripAdjacency,
            0x0B => TrianglesAdjacency,
            0x0C => TriangleStripAdjacency,
            0x0D => Patches,
            other => Other(other),
        }
    }
}

impl fmt::Display for PrimitiveTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PrimitiveTopology::*;
        let name = match self {
            Points => "points",
            Lines => "lines",
            LineLoop => "line_loop",
            LineStrip => "line_strip",
            Triangles => "triangles",
            TriangleStrip => "triangle_strip",
            TriangleFan => "triangle_fan",
            Quads => "quads",
            QuadStrip => "quad_strip",
            LinesAdjacency => "lines_adjacency",
            LineStripAdjacency => "line_strip_adjacency",
            TrianglesAdjacency => "triangles_adjacency",
            TriangleStripAdjacency => "triangle_strip_adjacency",
            Patches => "patches",
            Other(raw) => return write!(f, "unknown ({raw:#x})"),
        };
        f.write_str(name)
    }
}

/// Width of one stored index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

impl IndexFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(IndexFormat::U8),
            1 => Some(IndexFormat::U16),
            2 => Some(IndexFormat::U32),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// A range of the index buffer drawn as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submesh {
    /// Byte offset into the index buffer.
    pub offset: u32,
    /// Number of indices.
    pub count: u32,
}

/// Fixed-arity primitives built from an index buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faces {
    /// Vertices per primitive.
    pub arity: usize,
    pub indices: Vec<u32>,
}

impl Faces {
    pub fn len(&self) -> usize {
        self.indices.len() / self.arity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        self.indices.chunks_exact(self.arity)
    }
}

/// One level of detail.
#[derive(Debug, Clone)]
pub struct Lod {
    pub offset: u64,
    pub topology: PrimitiveTopology,
    pub index_format: IndexFormat,
    /// Absolute offset of the index data.
    pub index_offset: u64,
    pub indices: Vec<u32>,
    pub first_vertex: u32,
    pub submeshes: Vec<Submesh>,
    pub header: Record,
}

impl Lod {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64) -> Result<Self> {
        let header = LOD.decode(&ctx.r, offset)?;
        let raw_fmt = header.uint("idx_fmt")? as u32;
        let index_format = IndexFormat::from_raw(raw_fmt).ok_or_else(|| {
            Error::decode(
                ctx.r.data(),
                offset + 0x28,
                format!("unknown index format {raw_fmt}"),
            )
        })?;
        let count = ctx.opts.check_vertices("index", header.uint("idx_cnt")?)?;
        let index_offset = ctx.data_start + header.offset_of("face_buf_offs")?;
        let indices: Vec<u32> = match index_format {
            IndexFormat::U8 => ctx.r.bytes_at(index_offset, count)?.iter().map(|b| *b as u32).collect(),
            IndexFormat::U16 => ctx
                .r
                .read_many_at::<u16>(index_offset, count)?
                .into_iter()
                .map(u32::from)
                .collect(),
            IndexFormat::U32 => ctx.r.read_many_at::<u32>(index_offset, count)?,
        };

        let num_submeshes = ctx.opts.check_entries("submesh", header.uint("submesh_cnt")?)?;
        let submeshes = SUBMESH
            .decode_array(&ctx.r, header.offset_of("submesh_array_offs")?, num_submeshes)?
            .iter()
            .map(|s| {
                Ok(Submesh {
                    offset: s.uint("offset")? as u32,
                    count: s.uint("count")? as u32,
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            offset,
            topology: PrimitiveTopology::from_raw(header.uint("prim_fmt")? as u32),
            index_format,
            index_offset,
            indices,
            first_vertex: header.uint("first_vtx")? as u32,
            submeshes,
            header,
        })
    }

    /// The indices covered by submesh `i`.
    pub fn submesh_indices(&self, i: usize) -> Option<&[u32]> {
        let s = self.submeshes.get(i)?;
        let start = s.offset as usize / self.index_format.size();
        self.indices.get(start..start + s.count as usize)
    }

    /// Group the index buffer into primitives.
    ///
    /// Triangle strips are unrolled into triangles with alternating winding.
    /// A trailing partial primitive is dropped.
    pub fn faces(&self) -> Result<Faces> {
        let (arity, indices) = match self.topology {
            PrimitiveTopology::Points => (1, self.indices.clone()),
            PrimitiveTopology::Lines => (2, self.indices.clone()),
            PrimitiveTopology::Triangles => (3, self.indices.clone()),
            PrimitiveTopology::Quads => (4, self.indices.clone()),
            PrimitiveTopology::TriangleStrip => {
                let tris = self
                    .indices
                    .windows(3)
                    .enumerate()
                    .flat_map(|(i, w)| {
                        if i % 2 == 0 {
                            [w[0], w[1], w[2]]
                        } else {
                            [w[1], w[0], w[2]]
                        }
                    })
                    .collect();
                (3, tris)
            }
            other => return Err(Error::UnsupportedPrimitiveTopology(other)),
        };
        let whole = indices.len() - indices.len() % arity;
        let mut indices = indices;
        indices.truncate(whole);
        Ok(Faces { arity, indices })
    }
}

/// A decoded FSHP.
#[derive(Debug, Clone)]
pub struct Shape {
    pub name: String,
    pub offset: u64,
    pub flags: FlagSet,
    pub index: u16,
    pub material_index: u16,
    /// Bone the whole shape is bound to when it has no skinning.
    pub single_bind: u16,
    /// Index into the owning model's vertex buffers.
    pub vertex_buffer: usize,
    pub vertex_skin_count: u8,
    pub skin_bone_indices: Vec<u16>,
    pub vis_group_count: u32,
    pub lods: Vec<Lod>,
    pub header: Record,
}

impl Shape {
    /// Decode the shape at `offset`. `fvtx_offsets` are the offsets of the
    /// owning model's vertex buffers, used to resolve the shape's buffer.
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64, fvtx_offsets: &[u64]) -> Result<Self> {
        let header = FSHP_HEADER.decode(&ctx.r, offset)?;
        let name = header.text("name")?.to_owned();

        let fvtx_offset = header.offset_of("fvtx_offset")?;
        let fvtx_idx = header.uint("fvtx_idx")? as usize;
        let vertex_buffer = match fvtx_offsets.iter().position(|o| *o == fvtx_offset) {
            Some(i) => i,
            None if fvtx_idx < fvtx_offsets.len() => {
                ctx.diag.warn(IntegrityWarning::VertexBufferMismatch {
                    shape: name.clone(),
                    offset: fvtx_offset,
                    index: fvtx_idx,
                });
                fvtx_idx
            }
            None => {
                return Err(Error::decode(
                    ctx.r.data(),
                    offset + 0x18,
                    format!(
                        "shape '{name}' references vertex buffer {fvtx_idx} at {fvtx_offset:#x}; model has {}",
                        fvtx_offsets.len()
                    ),
                ));
            }
        };

        let num_lods = ctx.opts.check_entries("LOD", header.uint("lod_cnt")?)?;
        let lod_offset = header.offset_of("lod_offset")?;
        let lods = (0..num_lods)
            .map(|i| Lod::decode(ctx, lod_offset + (i * LOD.size) as u64))
            .collect::<Result<_>>()?;

        let num_skin = ctx.opts.check_entries("skin bone index", header.uint("skin_bone_idx_cnt")?)?;
        let skin_bone_indices = match header.offset_of("skin_bone_idx_offs")? {
            0 => Vec::new(),
            at => ctx.r.read_many_at::<u16>(at, num_skin)?,
        };

        tracing::trace!(offset, name = %name, lods = num_lods, "decoded shape");
        Ok(Self {
            name,
            offset,
            flags: header.flags("flags")?.clone(),
            index: header.uint("index")? as u16,
            material_index: header.uint("fmat_idx")? as u16,
            single_bind: header.uint("single_bind")? as u16,
            vertex_buffer,
            vertex_skin_count: header.uint("vtx_skin_cnt")? as u8,
            skin_bone_indices,
            vis_group_count: header.uint("vis_group_cnt")? as u32,
            lods,
            header,
        })
    }

    /// This shape's vertex buffer within `buffers` (the owning model's).
    pub fn vertex_buffer<'m>(&self, buffers: &'m [VertexBuffer]) -> Option<&'m VertexBuffer> {
        buffers.get(self.vertex_buffer)
    }
}

/// Shapes of one model with their name dictionary.
pub(crate) fn decode_shapes(
    ctx: &mut Ctx<'_>,
    array: u64,
    count: usize,
    dict: &NameDict,
    fvtx_offsets: &[u64],
) -> Result<Vec<Shape>> {
    if dict.len() != count && !dict.is_empty() {
        ctx.diag.warn(IntegrityWarning::DictCountMismatch {
            context: "shapes".into(),
            entries: dict.len(),
            count,
        });
    }
    (0..count)
        .map(|i| Shape::decode(ctx, array + (i * FSHP_HEADER.size) as u64, fvtx_offsets))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lod(topology: u32, indices: &[u32]) -> Lod {
        Lod {
            offset: 0,
            topology: PrimitiveTopology::from_raw(topology),
            index_format: IndexFormat::U16,
            index_offset: 0,
            indices: indices.to_vec(),
            first_vertex: 0,
            submeshes: vec![Submesh { offset: 2, count: 2 }],
            header: dummy_record(),
        }
    }

    fn dummy_record() -> Record {
        static EMPTY: StructCodec = StructCodec::new("empty", &[]);
        let r = crate::reader::ByteReader::new(&[], crate::reader::ByteOrder::Little);
        EMPTY.decode(&r, 0).unwrap()
    }

    #[test]
    fn layout_sizes() {
        assert_eq!(FSHP_HEADER.size, 0x70);
        assert_eq!(LOD.size, 0x38);
    }

    #[test]
    fn triangles_group_by_three() {
        let faces = lod(4, &[0, 1, 2, 2, 1, 3, 9]).faces().unwrap();
        assert_eq!(faces.len(), 2);
        let tris: Vec<_> = faces.iter().collect();
        assert_eq!(tris, [&[0, 1, 2][..], &[2, 1, 3][..]]);
    }

    #[test]
    fn strips_alternate_winding() {
        let faces = lod(5, &[0, 1, 2, 3, 4]).faces().unwrap();
        assert_eq!(faces.indices, [0, 1, 2, 2, 1, 3, 2, 3, 4]);
    }

    #[test]
    fn points_lines_and_quads() {
        assert_eq!(lod(0, &[5, 6]).faces().unwrap().arity, 1);
        assert_eq!(lod(1, &[0, 1, 2]).faces().unwrap().indices, [0, 1]);
        assert_eq!(lod(7, &[0, 1, 2, 3]).faces().unwrap().len(), 1);
    }

    #[test]
    fn other_topologies_are_unsupported() {
        assert!(matches!(
            lod(6, &[0, 1, 2]).faces(),
            Err(Error::UnsupportedPrimitiveTopology(PrimitiveTopology::TriangleFan))
        ));
        match lod(0x42, &[]).faces() {
            Err(Error::UnsupportedPrimitiveTopology(t)) => {
                assert_eq!(t, PrimitiveTopology::Other(0x42));
                assert_eq!(t.to_string(), "unknown (0x42)");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn submesh_ranges_use_byte_offsets() {
        let l = lod(4, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(l.submesh_indices(0), Some(&[1, 2][..]));
        assert_eq!(l.submesh_indices(1), None);
    }

    #[test]
    fn shape_flags_decode() {
        let set = FlagSet::decode(0x6, SHAPE_FLAGS);
        assert_eq!(set.names, ["HAS_VERTEX_BUFFER", "SUBMESH_BOUNDARY_CONSISTENT"]);
    }
}
