//! FSKL skeletons and their bones.
//!
//! ## Layout (0x48 bytes)
//! ```text
//! [0x00] Magic "FSKL"                 (4 bytes)
//! [0x04] Size                         (u32)
//! [0x08] Size 2                       (u32)
//! [0x0C] Padding                      (4 bytes)
//! [0x10] Bone dict                    (u64)
//! [0x18] Bone array                   (u64)
//! [0x20] Smooth index array           (u64, i16 entries)
//! [0x28] Smooth matrix array          (u64, 4×3 f32 entries)
//! [0x30] Unknown                      (u64)
//! [0x38] Flags                        (u32)
//! [0x3C] Bone count                   (u16)
//! [0x3E] Smooth index count           (u16)
//! [0x40] Rigid index count            (u16)
//! [0x42] Extra count                  (u16)
//! [0x44] Unknown                      (u32)
//! ```
//!
//! Bones are 0x50 bytes:
//! ```text
//! [0x00] Name                         (u64)
//! [0x08] User data array / dict       (2 × u64)
//! [0x18] Index                        (u16)
//! [0x1A] Parent index                 (i16, -1 = none)
//! [0x1C] Smooth matrix index          (i16)
//! [0x1E] Rigid matrix index           (i16)
//! [0x20] Billboard index              (i16)
//! [0x22] User data count              (u16)
//! [0x24] Flags                        (u32)
//! [0x28] Scale                        (3 × f32)
//! [0x34] Rotation                     (4 × f32)
//! [0x44] Translation                  (3 × f32)
//! ```

use std::collections::HashMap;

use super::dict::NameDict;
use super::Ctx;
use crate::codec::{Field, FieldKind, FlagSet, FlagTable, Record, StructCodec};
use crate::diagnostics::{Diagnostics, IntegrityWarning};
use crate::Result;

pub const SKELETON_FLAGS: FlagTable = &[
    ("SCALE_STD", 0x100),
    ("SCALE_MAYA", 0x200),
    ("SCALE_SOFTIMAGE", 0x300),
    ("EULER", 0x1000),
];

pub const BONE_FLAGS: FlagTable = &[
    ("VISIBLE", 0x1),
    ("EULER", 0x1000),
    ("SCALE_UNIFORM", 0x0100_0000),
    ("SCALE_ONE", 0x0200_0000),
    ("ROT_ZERO", 0x0400_0000),
    ("TRANS_ZERO", 0x0800_0000),
];

pub(crate) static FSKL_HEADER: StructCodec = StructCodec::new(
    "FSKL",
    &[
        Field::new("magic", FieldKind::Magic(b"FSKL")),
        Field::new("size", FieldKind::U32),
        Field::new("size2", FieldKind::U32),
        Field::pad(4),
        Field::new("bone_idx_group_offs", FieldKind::Offset64),
        Field::new("bone_array_offs", FieldKind::Offset64),
        Field::new("smooth_idx_offs", FieldKind::Offset64),
        Field::new("smooth_mtx_offs", FieldKind::Offset64),
        Field::new("unk30", FieldKind::U64),
        Field::new("flags", FieldKind::Flags32(SKELETON_FLAGS)),
        Field::new("num_bones", FieldKind::U16),
        Field::new("num_smooth_idxs", FieldKind::U16),
        Field::new("num_rigid_idxs", FieldKind::U16),
        Field::new("num_extra", FieldKind::U16),
        Field::new("unk44", FieldKind::U32),
    ],
);

static BONE_TRANSFORM: StructCodec = StructCodec::new(
    "FSKL bone transform",
    &[
        Field::new("scale", FieldKind::Repeat(&FieldKind::F32, 3)),
        Field::new("rotation", FieldKind::Repeat(&FieldKind::F32, 4)),
        Field::new("translation", FieldKind::Repeat(&FieldKind::F32, 3)),
    ],
);

pub(crate) static BONE: StructCodec = StructCodec::new(
    "FSKL bone",
    &[
        Field::new("name", FieldKind::Str64),
        Field::new("user_data_array", FieldKind::Offset64),
        Field::new("user_data_dict", FieldKind::Offset64),
        Field::new("index", FieldKind::U16),
        Field::new("parent_idx", FieldKind::I16),
        Field::new("smooth_mtx_idx", FieldKind::I16),
        Field::new("rigid_mtx_idx", FieldKind::I16),
        Field::new("billboard_idx", FieldKind::I16),
        Field::new("num_user_data", FieldKind::U16),
        Field::new("flags", FieldKind::Flags32(BONE_FLAGS)),
        Field::new("transform", FieldKind::Nested(&BONE_TRANSFORM)),
    ],
);

/// A 4×3 matrix: four rows of three columns.
pub type Matrix4x3 = [[f32; 3]; 4];

const MATRIX_SIZE: u64 = 4 * 3 * 4;

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub offset: u64,
    pub index: u16,
    /// Raw parent index as stored.
    pub parent_idx: i16,
    pub smooth_mtx_idx: i16,
    pub rigid_mtx_idx: i16,
    pub billboard_idx: i16,
    pub flags: FlagSet,
    pub scale: [f32; 3],
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
    /// Resolved parent, `None` for roots and invalid indices.
    pub parent: Option<usize>,
    pub header: Record,
}

impl Bone {
    fn decode(rec: Record) -> Result<Self> {
        let xf = rec.record("transform")?;
        Ok(Self {
            name: rec.text("name")?.to_owned(),
            offset: rec.offset,
            index: rec.uint("index")? as u16,
            parent_idx: rec.sint("parent_idx")? as i16,
            smooth_mtx_idx: rec.sint("smooth_mtx_idx")? as i16,
            rigid_mtx_idx: rec.sint("rigid_mtx_idx")? as i16,
            billboard_idx: rec.sint("billboard_idx")? as i16,
            flags: rec.flags("flags")?.clone(),
            scale: xf.floats("scale")?,
            rotation: xf.floats("rotation")?,
            translation: xf.floats("translation")?,
            parent: None,
            header: rec,
        })
    }
}

/// A decoded FSKL.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub offset: u64,
    pub flags: FlagSet,
    pub bones: Vec<Bone>,
    pub bone_dict: NameDict,
    pub smooth_indices: Vec<i16>,
    pub smooth_matrices: Vec<Matrix4x3>,
    pub num_rigid: u16,
    by_name: HashMap<String, usize>,
    pub header: Record,
}

impl Skeleton {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64) -> Result<Self> {
        let header = FSKL_HEADER.decode(&ctx.r, offset)?;
        let num_bones = ctx.opts.check_entries("bone", header.uint("num_bones")?)?;
        let num_smooth = ctx.opts.check_entries("smooth index", header.uint("num_smooth_idxs")?)?;

        let smooth_indices = match header.offset_of("smooth_idx_offs")? {
            0 => Vec::new(),
            at => ctx.r.read_many_at::<i16>(at, num_smooth)?,
        };

        // one matrix per smooth group
        let num_matrices = smooth_indices
            .iter()
            .max()
            .map_or(0, |m| (*m as i64 + 1).max(0) as u64);
        let num_matrices = ctx.opts.check_entries("smooth matrix", num_matrices)?;
        let mtx_at = header.offset_of("smooth_mtx_offs")?;
        let mut smooth_matrices = Vec::with_capacity(num_matrices);
        if mtx_at != 0 {
            for m in 0..num_matrices {
                let vals = ctx.r.read_many_at::<f32>(mtx_at + m as u64 * MATRIX_SIZE, 12)?;
                smooth_matrices.push(sanitize_matrix(m, &vals, ctx.diag));
            }
        }

        let bone_array = header.offset_of("bone_array_offs")?;
        let mut bones = BONE
            .decode_array(&ctx.r, bone_array, num_bones)?
            .into_iter()
            .map(Bone::decode)
            .collect::<Result<Vec<_>>>()?;

        // parents are resolved once every bone exists
        let count = bones.len();
        for bone in bones.iter_mut() {
            bone.parent = match bone.parent_idx {
                p if p < 0 => None,
                p if (p as usize) < count => Some(p as usize),
                p => {
                    ctx.diag.warn(IntegrityWarning::ParentOutOfRange {
                        bone: bone.name.clone(),
                        parent_idx: p as i64,
                        bone_count: count,
                    });
                    None
                }
            };
        }

        let mut by_name = HashMap::with_capacity(count);
        for (i, bone) in bones.iter().enumerate() {
            if by_name.insert(bone.name.clone(), i).is_some() {
                ctx.diag.warn(IntegrityWarning::DuplicateName {
                    context: format!("skeleton at {offset:#x}"),
                    name: bone.name.clone(),
                });
            }
        }

        let bone_dict = ctx.dict(header.offset_of("bone_idx_group_offs")?, "bones")?;

        tracing::debug!(offset, bones = count, smooth = smooth_indices.len(), "decoded skeleton");
        Ok(Self {
            offset,
            flags: header.flags("flags")?.clone(),
            bones,
            bone_dict,
            smooth_indices,
            smooth_matrices,
            num_rigid: header.uint("num_rigid_idxs")? as u16,
            by_name,
            header,
        })
    }

    /// Bone named `name`. The last bone wins when names repeat.
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.by_name.get(name).map(|i| &self.bones[*i])
    }

    pub fn parent(&self, bone: &Bone) -> Option<&Bone> {
        bone.parent.and_then(|p| self.bones.get(p))
    }

    /// Bones whose parent is bone `idx`.
    pub fn children(&self, idx: usize) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(move |b| b.parent == Some(idx))
    }

    /// Bones without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.parent.is_none())
    }

    /// Map a vertex's bone-group index to its bone through the smooth index
    /// table. Out-of-range groups warn and yield `None`.
    pub fn resolve_group(&self, group: i64, diag: &mut dyn Diagnostics) -> Option<&Bone> {
        let bone = usize::try_from(group)
            .ok()
            .and_then(|g| self.smooth_indices.get(g))
            .and_then(|b| usize::try_from(*b).ok())
            .and_then(|b| self.bones.get(b));
        if bone.is_none() {
            diag.warn(IntegrityWarning::BoneGroupOutOfRange {
                group,
                count: self.smooth_indices.len(),
            });
        }
        bone
    }
}

fn sanitize_matrix(m: usize, vals: &[f32], diag: &mut dyn Diagnostics) -> Matrix4x3 {
    let mut out = [[0f32; 3]; 4];
    for (i, v) in vals.iter().enumerate().take(12) {
        let (row, col) = (i / 3, i % 3);
        out[row][col] = if v.is_finite() {
            *v
        } else {
            diag.warn(IntegrityWarning::NonFiniteMatrix {
                matrix: m,
                row,
                col,
                value: *v,
            });
            0.0
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Collector;

    #[test]
    fn layout_sizes() {
        assert_eq!(FSKL_HEADER.size, 0x48);
        assert_eq!(BONE.size, 0x50);
    }

    #[test]
    fn non_finite_elements_are_zeroed_once_each() {
        let mut vals = [1.0f32; 12];
        vals[4] = f32::NAN;
        vals[11] = f32::INFINITY;
        let mut diag = Collector::new();
        let m = sanitize_matrix(3, &vals, &mut diag);
        assert_eq!(m[1][1], 0.0);
        assert_eq!(m[3][2], 0.0);
        assert_eq!(m[0][0], 1.0);
        assert_eq!(diag.warnings.len(), 2);
        assert!(matches!(
            diag.warnings[1],
            IntegrityWarning::NonFiniteMatrix { matrix: 3, row: 3, col: 2, .. }
        ));
    }
}
