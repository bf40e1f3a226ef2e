//! FMDL models.
//!
//! ## Layout (0x78 bytes)
//! ```text
//! [0x00] Magic "FMDL"                 (4 bytes)
//! [0x04] Block header                 (3 × u32)
//! [0x10] Name                         (u64)
//! [0x18] Path                         (u64)
//! [0x20] Skeleton                     (u64)
//! [0x28] FVTX array                   (u64, 0x60-byte records)
//! [0x30] Shape array / dict           (2 × u64, 0x70-byte records)
//! [0x40] Material array / dict        (2 × u64, 0xB0-byte records)
//! [0x50] User data array / dict       (2 × u64)
//! [0x60] User pointer                 (u64)
//! [0x68] FVTX count                   (u16)
//! [0x6A] Shape count                  (u16)
//! [0x6C] Material count               (u16)
//! [0x6E] User data count              (u16)
//! [0x70] Total vertex count           (u32)
//! [0x74] Padding                      (4 bytes)
//! ```

use std::sync::Arc;

use super::dict::NameDict;
use super::fmat::{Material, FMAT_HEADER};
use super::fshp::{decode_shapes, Shape, FSHP_HEADER};
use super::fskl::Skeleton;
use super::fvtx::{VertexBuffer, FVTX_HEADER};
use super::Ctx;
use crate::codec::{Field, FieldKind, Record, StructCodec};
use crate::{Error, Result};

pub(crate) static FMDL_HEADER: StructCodec = StructCodec::new(
    "FMDL",
    &[
        Field::new("magic", FieldKind::Magic(b"FMDL")),
        Field::new("block", FieldKind::Repeat(&FieldKind::U32, 3)),
        Field::new("name", FieldKind::Str64),
        Field::new("path", FieldKind::Str64),
        Field::new("fskl_offset", FieldKind::Offset64),
        Field::new("fvtx_offset", FieldKind::Offset64),
        Field::new("fshp_offset", FieldKind::Offset64),
        Field::new("fshp_dict_offset", FieldKind::Offset64),
        Field::new("fmat_offset", FieldKind::Offset64),
        Field::new("fmat_dict_offset", FieldKind::Offset64),
        Field::new("user_data_offset", FieldKind::Offset64),
        Field::new("user_data_dict_offset", FieldKind::Offset64),
        Field::new("user_pointer", FieldKind::U64),
        Field::new("fvtx_cnt", FieldKind::U16),
        Field::new("fshp_cnt", FieldKind::U16),
        Field::new("fmat_cnt", FieldKind::U16),
        Field::new("user_data_cnt", FieldKind::U16),
        Field::new("total_vtxs", FieldKind::U32),
        Field::pad(4),
    ],
);

/// A decoded FMDL.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub path: String,
    pub offset: u64,
    /// Shared with other models that point at the same FSKL.
    pub skeleton: Arc<Skeleton>,
    pub vertex_buffers: Vec<VertexBuffer>,
    pub shapes: Vec<Shape>,
    pub shape_dict: NameDict,
    pub materials: Vec<Material>,
    pub material_dict: NameDict,
    pub total_vertices: u32,
    pub header: Record,
}

impl Model {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64) -> Result<Self> {
        let header = FMDL_HEADER.decode(&ctx.r, offset)?;
        let name = header.text("name")?.to_owned();
        tracing::debug!(offset, name = %name, "decoding model");

        let skeleton = match header.offset_of("fskl_offset")? {
            0 => {
                return Err(Error::decode(
                    ctx.r.data(),
                    offset + 0x20,
                    format!("model '{name}' has no skeleton"),
                ));
            }
            at => ctx.skeleton(at)?,
        };

        let num_fvtx = ctx.opts.check_entries("vertex buffer", header.uint("fvtx_cnt")?)?;
        let fvtx_array = header.offset_of("fvtx_offset")?;
        let fvtx_offsets: Vec<u64> = (0..num_fvtx)
            .map(|i| fvtx_array + (i * FVTX_HEADER.size) as u64)
            .collect();
        let vertex_buffers = fvtx_offsets
            .iter()
            .map(|at| VertexBuffer::decode(ctx, *at))
            .collect::<Result<Vec<_>>>()?;

        let num_shapes = ctx.opts.check_entries("shape", header.uint("fshp_cnt")?)?;
        let shape_array = header.offset_of("fshp_offset")?;
        let shape_dict = ctx
            .dict(header.offset_of("fshp_dict_offset")?, "shapes")?
            .bind(shape_array, FSHP_HEADER.size as u64);
        let shapes = decode_shapes(ctx, shape_array, num_shapes, &shape_dict, &fvtx_offsets)?;

        let num_mats = ctx.opts.check_entries("material", header.uint("fmat_cnt")?)?;
        let mat_array = header.offset_of("fmat_offset")?;
        let material_dict = ctx
            .dict(header.offset_of("fmat_dict_offset")?, "materials")?
            .bind(mat_array, FMAT_HEADER.size as u64);
        let materials = (0..num_mats)
            .map(|i| Material::decode(ctx, mat_array + (i * FMAT_HEADER.size) as u64))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            path: header.text("path")?.to_owned(),
            offset,
            skeleton,
            vertex_buffers,
            shapes,
            shape_dict,
            materials,
            material_dict,
            total_vertices: header.uint("total_vtxs")? as u32,
            header,
        })
    }

    /// Shape named `name`, found through the shape dictionary.
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        match self.shape_dict.index_of(name) {
            Some(i) => self.shapes.get(i),
            None => self.shapes.iter().find(|s| s.name == name),
        }
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        match self.material_dict.index_of(name) {
            Some(i) => self.materials.get(i),
            None => self.materials.iter().find(|m| m.name == name),
        }
    }

    /// The vertex buffer a shape draws from.
    pub fn vertex_buffer_of(&self, shape: &Shape) -> Option<&VertexBuffer> {
        shape.vertex_buffer(&self.vertex_buffers)
    }

    /// The material a shape is drawn with.
    pub fn material_of(&self, shape: &Shape) -> Option<&Material> {
        self.materials.get(shape.material_index as usize)
    }
}
