//! Human-readable dumps of decoded sections.
//!
//! Works only on the public decoded data; nothing here touches the file
//! bytes.

use std::fmt::{self, Write};

use super::{
    Bone, Container, EmbeddedFile, Lod, Material, Model, NameDict, RelocationTable, Shape,
    Skeleton, StringTable, VertexBuffer,
};
use crate::codec::{Record, Value};

/// Pretty-print capability for decoded structures.
pub trait Dump {
    /// Write this value into `out`, indenting every line by `depth` levels.
    fn dump_into(&self, out: &mut Out, depth: usize);

    /// The full dump as a string.
    fn dump(&self) -> String {
        let mut out = Out::default();
        self.dump_into(&mut out, 0);
        out.0
    }
}

/// Dump output buffer.
#[derive(Debug, Default)]
pub struct Out(String);

impl Out {
    pub fn line(&mut self, depth: usize, args: fmt::Arguments<'_>) {
        for _ in 0..depth {
            self.0.push_str("  ");
        }
        // writing into a String cannot fail
        let _ = self.0.write_fmt(args);
        self.0.push('\n');
    }
}

macro_rules! emit {
    ($out:expr, $depth:expr, $($arg:tt)*) => {
        $out.line($depth, format_args!($($arg)*))
    };
}

fn value(v: &Value) -> String {
    match v {
        Value::UInt(x) => format!("{x} ({x:#x})"),
        Value::SInt(x) => x.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bytes(b) => crate::error::Hex(b).to_string(),
        Value::Offset(o) => format!("-> {o:#x}"),
        Value::Text(t) => format!("\"{t}\""),
        Value::Flags(f) => format!("{:#010x} [{}]", f.raw, f.names.join(" | ")),
        Value::List(items) => {
            let parts: Vec<_> = items.iter().map(value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Record(r) => format!("{{{} fields}}", r.iter().count()),
    }
}

impl Dump for Record {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(out, depth, "{} @ {:#x}", self.codec().name, self.offset);
        for (name, v) in self.iter() {
            match v {
                Value::Record(inner) => {
                    emit!(out, depth + 1, "{name}:");
                    inner.dump_into(out, depth + 2);
                }
                _ => emit!(out, depth + 1, "{name:<24} {}", value(v)),
            }
        }
    }
}

impl Dump for NameDict {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(out, depth, "_DIC @ {:#x}: {} entries", self.offset, self.len());
        for (i, node) in self.nodes().iter().enumerate() {
            emit!(
                out,
                depth + 1,
                "[{i:3}] ref {:>10} left {:3} right {:3} \"{}\"",
                node.reference as i32,
                node.left,
                node.right,
                node.name
            );
        }
    }
}

impl Dump for StringTable {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(out, depth, "_STR @ {:#x}: {} strings, {} bytes", self.offset, self.len(), self.size);
        for (at, s) in self.iter() {
            emit!(out, depth + 1, "{at:#08x} \"{s}\"");
        }
    }
}

impl Dump for RelocationTable {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(out, depth, "_RLT @ {:#x}: data start {:#x}", self.offset, self.data_start);
        for (i, s) in self.sections.iter().enumerate() {
            emit!(
                out,
                depth + 1,
                "section {i}: pos {:#x} size {:#x} entries {}..{}",
                s.position,
                s.size,
                s.entry_index,
                s.entry_index + s.entry_count
            );
        }
    }
}

impl Dump for VertexBuffer {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "FVTX #{} @ {:#x}: {} vertices, skin influence {}",
            self.index,
            self.offset,
            self.num_vertices,
            self.skin_weight_influence
        );
        for a in &self.attributes {
            let format = match &a.format {
                Some(f) => f.to_string(),
                None => format!("unknown {:#06x}", a.format_code),
            };
            emit!(
                out,
                depth + 1,
                "attr {:<8} buf {} +{:#x} {format}",
                a.name,
                a.buf_idx,
                a.buf_offs
            );
        }
        for (i, b) in self.buffers.iter().enumerate() {
            emit!(out, depth + 1, "buf {i}: {:#x} bytes @ {:#x}, stride {}", b.size, b.offset, b.stride);
        }
        for (i, v) in self.vertices.iter().take(8).enumerate() {
            let vals: Vec<_> = v
                .values
                .iter()
                .map(|x| match x {
                    Some(val) => format!("{:?}", val.as_f32()),
                    None => "?".to_owned(),
                })
                .collect();
            emit!(out, depth + 1, "vtx {i}: {}", vals.join(" "));
        }
        if self.vertices.len() > 8 {
            emit!(out, depth + 1, "... {} more", self.vertices.len() - 8);
        }
    }
}

impl Dump for Lod {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "LOD @ {:#x}: {} {:?} indices ({}) @ {:#x}, {} submeshes",
            self.offset,
            self.indices.len(),
            self.index_format,
            self.topology,
            self.index_offset,
            self.submeshes.len()
        );
        for (i, s) in self.submeshes.iter().enumerate() {
            emit!(out, depth + 1, "submesh {i}: +{:#x} x{}", s.offset, s.count);
        }
    }
}

impl Dump for Shape {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "FSHP #{} \"{}\" @ {:#x}: material {}, fvtx {}, bone {}, flags [{}]",
            self.index,
            self.name,
            self.offset,
            self.material_index,
            self.vertex_buffer,
            self.single_bind,
            self.flags.names.join(" | ")
        );
        if !self.skin_bone_indices.is_empty() {
            emit!(out, depth + 1, "skin bones {:?}", self.skin_bone_indices);
        }
        for lod in &self.lods {
            lod.dump_into(out, depth + 1);
        }
    }
}

impl Dump for Bone {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        let parent = match self.parent {
            Some(p) => p.to_string(),
            None => "-".to_owned(),
        };
        emit!(
            out,
            depth,
            "bone {:3} \"{}\" parent {parent} smooth {} rigid {} [{}]",
            self.index,
            self.name,
            self.smooth_mtx_idx,
            self.rigid_mtx_idx,
            self.flags.names.join(" | ")
        );
        emit!(
            out,
            depth + 1,
            "S {:?} R {:?} T {:?}",
            self.scale,
            self.rotation,
            self.translation
        );
    }
}

impl Dump for Skeleton {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "FSKL @ {:#x}: {} bones, {} smooth, {} rigid [{}]",
            self.offset,
            self.bones.len(),
            self.smooth_indices.len(),
            self.num_rigid,
            self.flags.names.join(" | ")
        );
        for b in &self.bones {
            b.dump_into(out, depth + 1);
        }
        for (i, m) in self.smooth_matrices.iter().enumerate() {
            emit!(out, depth + 1, "matrix {i}: {m:?}");
        }
    }
}

impl Dump for Material {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "FMAT #{} \"{}\" @ {:#x} [{}]",
            self.index,
            self.name,
            self.offset,
            self.flags.names.join(" | ")
        );
        for t in &self.textures {
            emit!(out, depth + 1, "texture \"{t}\"");
        }
        for (name, _) in self.samplers.entries() {
            emit!(out, depth + 1, "sampler \"{name}\"");
        }
        for (name, _) in self.render_infos.entries() {
            emit!(out, depth + 1, "render info \"{name}\"");
        }
    }
}

impl Dump for Model {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "FMDL \"{}\" @ {:#x}: {} vertices total",
            self.name,
            self.offset,
            self.total_vertices
        );
        if !self.path.is_empty() {
            emit!(out, depth + 1, "path \"{}\"", self.path);
        }
        self.skeleton.dump_into(out, depth + 1);
        for vb in &self.vertex_buffers {
            vb.dump_into(out, depth + 1);
        }
        for s in &self.shapes {
            s.dump_into(out, depth + 1);
        }
        for m in &self.materials {
            m.dump_into(out, depth + 1);
        }
    }
}

impl Dump for EmbeddedFile {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        emit!(
            out,
            depth,
            "embedded \"{}\" @ {:#x}: {} bytes, {:?}",
            self.name,
            self.offset,
            self.size(),
            self.kind()
        );
    }
}

impl Dump for Container {
    fn dump_into(&self, out: &mut Out, depth: usize) {
        let h = &self.header;
        emit!(
            out,
            depth,
            "FRES \"{}\" v{}.{} {}-endian, {} bytes",
            h.name,
            h.version.0,
            h.version.1,
            h.byte_order.name(),
            self.data().len()
        );
        emit!(out, depth + 1, "data start {:#x}", self.relocation.data_start);
        for s in &self.sections {
            emit!(out, depth + 1, "{}: {} @ {:#x}", s.kind, s.count, s.offset);
            for name in s.names() {
                emit!(out, depth + 2, "\"{name}\"");
            }
        }
        for m in &self.models {
            m.dump_into(out, depth + 1);
        }
        for e in &self.embeds {
            e.dump_into(out, depth + 1);
        }
        for f in &self.failures {
            emit!(out, depth + 1, "FAILED {} #{} \"{}\": {}", f.kind, f.index, f.name, f.error);
        }
    }
}
