//! FMAT materials.
//!
//! Only the material's identity, texture references and parameter names are
//! decoded; shader parameter values stay in the raw record.
//!
//! ## Layout (0xB0 bytes)
//! ```text
//! [0x00] Magic "FMAT"                 (4 bytes)
//! [0x04] Block header                 (3 × u32)
//! [0x10] Name                         (u64)
//! [0x18] Render info array / dict     (2 × u64)
//! [0x28] Shader assign                (u64)
//! [0x30] Texture array                (u64)
//! [0x38] Texture name array           (u64, u64 string offsets)
//! [0x40] Sampler array / dict         (2 × u64)
//! [0x50] Shader param array / dict    (2 × u64)
//! [0x60] Param data                   (u64)
//! [0x68] User data array / dict       (2 × u64)
//! [0x78] Volatile flags               (u64)
//! [0x80] User pointer                 (u64)
//! [0x88] Sampler slot array           (u64)
//! [0x90] Texture slot array           (u64)
//! [0x98] Flags                        (u32)
//! [0x9C] Index                        (u16)
//! [0x9E] Render info count            (u16)
//! [0xA0] Texture count                (u8)
//! [0xA1] Sampler count                (u8)
//! [0xA2] Shader param count           (u16)
//! [0xA4] Volatile param count         (u16)
//! [0xA6] Param data size              (u16)
//! [0xA8] Raw param data size          (u16)
//! [0xAA] User data count              (u16)
//! [0xAC] Padding                      (4 bytes)
//! ```

use super::dict::NameDict;
use super::Ctx;
use crate::codec::{Field, FieldKind, FlagSet, FlagTable, Record, StructCodec};
use crate::Result;

pub const MATERIAL_FLAGS: FlagTable = &[("VISIBLE", 0x1)];

pub(crate) static FMAT_HEADER: StructCodec = StructCodec::new(
    "FMAT",
    &[
        Field::new("magic", FieldKind::Magic(b"FMAT")),
        Field::new("block", FieldKind::Repeat(&FieldKind::U32, 3)),
        Field::new("name", FieldKind::Str64),
        Field::new("render_info_array", FieldKind::Offset64),
        Field::new("render_info_dict", FieldKind::Offset64),
        Field::new("shader_assign", FieldKind::Offset64),
        Field::new("texture_array", FieldKind::Offset64),
        Field::new("texture_name_array", FieldKind::Offset64),
        Field::new("sampler_array", FieldKind::Offset64),
        Field::new("sampler_dict", FieldKind::Offset64),
        Field::new("shader_param_array", FieldKind::Offset64),
        Field::new("shader_param_dict", FieldKind::Offset64),
        Field::new("param_data", FieldKind::Offset64),
        Field::new("user_data_array", FieldKind::Offset64),
        Field::new("user_data_dict", FieldKind::Offset64),
        Field::new("volatile_flags", FieldKind::Offset64),
        Field::new("user_pointer", FieldKind::U64),
        Field::new("sampler_slot_array", FieldKind::Offset64),
        Field::new("texture_slot_array", FieldKind::Offset64),
        Field::new("flags", FieldKind::Flags32(MATERIAL_FLAGS)),
        Field::new("index", FieldKind::U16),
        Field::new("num_render_info", FieldKind::U16),
        Field::new("num_texture", FieldKind::U8),
        Field::new("num_sampler", FieldKind::U8),
        Field::new("num_shader_param", FieldKind::U16),
        Field::new("num_volatile_param", FieldKind::U16),
        Field::new("param_data_size", FieldKind::U16),
        Field::new("raw_param_data_size", FieldKind::U16),
        Field::new("num_user_data", FieldKind::U16),
        Field::pad(4),
    ],
);

/// A decoded FMAT.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub offset: u64,
    pub index: u16,
    pub flags: FlagSet,
    /// Names of the textures this material samples, in slot order.
    pub textures: Vec<String>,
    pub samplers: NameDict,
    pub render_infos: NameDict,
    pub shader_params: NameDict,
    pub header: Record,
}

impl Material {
    pub(crate) fn decode(ctx: &mut Ctx<'_>, offset: u64) -> Result<Self> {
        let header = FMAT_HEADER.decode(&ctx.r, offset)?;
        let name = header.text("name")?.to_owned();

        let num_textures = ctx.opts.check_entries("texture", header.uint("num_texture")?)?;
        let textures = match header.offset_of("texture_name_array")? {
            0 => Vec::new(),
            at => ctx
                .r
                .read_many_at::<u64>(at, num_textures)?
                .into_iter()
                .map(|s| ctx.r.prefixed_string_at(s))
                .collect::<Result<_>>()?,
        };

        let samplers = ctx.dict(header.offset_of("sampler_dict")?, "samplers")?;
        let render_infos = ctx.dict(header.offset_of("render_info_dict")?, "render infos")?;
        let shader_params = ctx.dict(header.offset_of("shader_param_dict")?, "shader params")?;

        tracing::trace!(offset, name = %name, textures = num_textures, "decoded material");
        Ok(Self {
            name,
            offset,
            index: header.uint("index")? as u16,
            flags: header.flags("flags")?.clone(),
            textures,
            samplers,
            render_infos,
            shader_params,
            header,
        })
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains("VISIBLE")
    }
}
