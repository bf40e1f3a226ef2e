//! Synthetic BFRES builder for integration tests.
//!
//! Lays out a complete container (header, string table, relocation table,
//! models with skeleton, vertex buffers, shapes and materials, embedded
//! files, name dictionaries and the raw data region) in either byte order.

#![allow(dead_code)]

use std::collections::HashMap;

pub const FLOAT3: u32 = 0x1805;
pub const UNORM8X4: u32 = 0x0B01;

pub const POINTS: u32 = 0x00;
pub const TRIANGLES: u32 = 0x04;
pub const TRIANGLE_STRIP: u32 = 0x05;
pub const TRIANGLE_FAN: u32 = 0x06;

pub const INDEX_U16: u32 = 1;
pub const INDEX_U32: u32 = 2;

#[derive(Debug, Clone)]
pub struct FresSpec {
    pub name: String,
    pub big_endian: bool,
    pub version: (u16, u16),
    pub models: Vec<ModelSpec>,
    pub embeds: Vec<EmbedSpec>,
    pub skeletal_anims: Vec<String>,
}

impl Default for FresSpec {
    fn default() -> Self {
        Self {
            name: "sample".into(),
            big_endian: false,
            version: (3, 5),
            models: Vec::new(),
            embeds: Vec::new(),
            skeletal_anims: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelSpec {
    pub name: String,
    /// Name written into the FMDL record itself, when it differs from the dictionary.
    pub record_name: Option<String>,
    pub path: String,
    pub skeleton: SkeletonSpec,
    /// Write 0 for the skeleton offset.
    pub omit_skeleton: bool,
    pub vertex_buffers: Vec<FvtxSpec>,
    pub shapes: Vec<ShapeSpec>,
    pub materials: Vec<MaterialSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct SkeletonSpec {
    pub bones: Vec<BoneSpec>,
    pub smooth_indices: Vec<i16>,
    /// Row-major 4×3 matrices.
    pub smooth_matrices: Vec<[f32; 12]>,
    pub num_rigid: u16,
}

#[derive(Debug, Clone)]
pub struct BoneSpec {
    pub name: String,
    pub parent: i16,
    pub smooth: i16,
    pub rigid: i16,
    pub flags: u32,
    pub scale: [f32; 3],
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
}

impl BoneSpec {
    pub fn new(name: &str, parent: i16) -> Self {
        Self {
            name: name.into(),
            parent,
            smooth: -1,
            rigid: -1,
            flags: 0x1,
            scale: [1.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            translation: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FvtxSpec {
    pub attributes: Vec<AttrSpec>,
    pub buffers: Vec<BufferSpec>,
    pub num_vertices: u32,
}

#[derive(Debug, Clone)]
pub struct AttrSpec {
    pub name: String,
    pub format: u32,
    pub offset: u16,
    pub buffer: u16,
}

impl AttrSpec {
    pub fn new(name: &str, format: u32, offset: u16, buffer: u16) -> Self {
        Self {
            name: name.into(),
            format,
            offset,
            buffer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BufferSpec {
    pub stride: u32,
    /// Raw bytes, already in the file's byte order.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ShapeSpec {
    pub name: String,
    pub fvtx: u16,
    pub material: u16,
    /// Store this instead of the real FVTX offset.
    pub fvtx_offset_override: Option<u64>,
    pub skin_bones: Vec<u16>,
    pub lods: Vec<LodSpec>,
}

#[derive(Debug, Clone)]
pub struct LodSpec {
    pub topology: u32,
    pub index_format: u32,
    pub indices: Vec<u32>,
    /// `(byte offset, index count)`.
    pub submeshes: Vec<(u32, u32)>,
}

impl LodSpec {
    pub fn new(topology: u32, indices: &[u32]) -> Self {
        Self {
            topology,
            index_format: INDEX_U16,
            indices: indices.to_vec(),
            submeshes: vec![(0, indices.len() as u32)],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialSpec {
    pub name: String,
    pub flags: u32,
    pub textures: Vec<String>,
    pub samplers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EmbedSpec {
    pub name: String,
    pub data: Vec<u8>,
}

/// Where the builder put things.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub str_tab: u64,
    pub rlt: u64,
    pub data_start: u64,
    pub model_array: u64,
    pub models: Vec<ModelLayout>,
    pub embed_array: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ModelLayout {
    pub offset: u64,
    pub skeleton: u64,
    pub fvtx: Vec<u64>,
    pub shapes: Vec<u64>,
    /// Index data position of each shape's first LOD, relative to the data
    /// region.
    pub lod_indices: Vec<u64>,
}

pub struct Built {
    pub bytes: Vec<u8>,
    pub layout: Layout,
}

/// Values encoded in the requested byte order.
pub fn f32_bytes(vals: &[f32], big: bool) -> Vec<u8> {
    vals.iter()
        .flat_map(|v| if big { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

struct Writer {
    buf: Vec<u8>,
    big: bool,
}

impl Writer {
    fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    fn align(&mut self, n: usize) {
        while self.buf.len() % n != 0 {
            self.buf.push(0);
        }
    }

    /// Reserve `size` zeroed bytes on an 8-byte boundary. Empty
    /// reservations return 0.
    fn alloc(&mut self, size: usize) -> u64 {
        if size == 0 {
            return 0;
        }
        self.align(8);
        let at = self.len();
        self.buf.resize(self.buf.len() + size, 0);
        at
    }

    fn append(&mut self, bytes: &[u8]) -> u64 {
        self.align(8);
        let at = self.len();
        self.buf.extend_from_slice(bytes);
        at
    }

    fn raw(&mut self, at: u64, bytes: &[u8]) {
        let at = at as usize;
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn u8(&mut self, at: u64, v: u8) {
        self.buf[at as usize] = v;
    }

    fn u16(&mut self, at: u64, v: u16) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(at, &b);
    }

    fn i16(&mut self, at: u64, v: i16) {
        self.u16(at, v as u16);
    }

    fn u32(&mut self, at: u64, v: u32) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(at, &b);
    }

    fn u64(&mut self, at: u64, v: u64) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(at, &b);
    }

    fn f32s(&mut self, at: u64, vals: &[f32]) {
        for (i, v) in vals.iter().enumerate() {
            self.u32(at + i as u64 * 4, v.to_bits());
        }
    }

    fn index_bytes(&self, format: u32, indices: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for i in indices {
            match format {
                0 => out.push(*i as u8),
                1 => {
                    let v = *i as u16;
                    out.extend_from_slice(&if self.big { v.to_be_bytes() } else { v.to_le_bytes() });
                }
                _ => out.extend_from_slice(&if self.big { i.to_be_bytes() } else { i.to_le_bytes() }),
            }
        }
        out
    }
}

/// A raw blob placed in the data region after everything else.
struct Pending {
    /// Where to store the blob's position.
    patch: u64,
    /// Store the position relative to the data region (u32) instead of as an
    /// absolute u64.
    relative: bool,
    bytes: Vec<u8>,
}

struct Strings {
    at: HashMap<String, u64>,
}

impl Strings {
    fn get(&self, s: &str) -> u64 {
        if s.is_empty() {
            return 0;
        }
        self.at[s]
    }
}

struct Node {
    reference: u32,
    left: u16,
    right: u16,
    key: Vec<u8>,
}

fn bit(key: &[u8], b: u32) -> bool {
    let byte = (b / 8) as usize;
    match key.len().checked_sub(byte + 1) {
        Some(i) => (key[i] >> (b % 8)) & 1 == 1,
        None => false,
    }
}

fn child(node: &Node, key: &[u8]) -> usize {
    if bit(key, node.reference) {
        node.right as usize
    } else {
        node.left as usize
    }
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<u32> {
    let bits = a.len().max(b.len()) as u32 * 8;
    (0..bits).find(|i| bit(a, *i) != bit(b, *i))
}

/// Build the radix tree for `names`, inserted in order. Node `i + 1` is
/// `names[i]`.
fn radix_tree(names: &[String]) -> Vec<Node> {
    let mut nodes = vec![Node {
        reference: u32::MAX,
        left: 0,
        right: 0,
        key: Vec::new(),
    }];
    for name in names {
        let key = name.as_bytes().to_vec();

        let mut prev = 0;
        let mut cur = nodes[0].left as usize;
        while (nodes[prev].reference as i32) < (nodes[cur].reference as i32) {
            prev = cur;
            cur = child(&nodes[cur], &key);
        }
        let b = first_difference(&key, &nodes[cur].key).expect("duplicate dictionary name");

        let mut prev = 0;
        let mut cur = nodes[0].left as usize;
        while (nodes[prev].reference as i32) < (nodes[cur].reference as i32)
            && nodes[cur].reference < b
        {
            prev = cur;
            cur = child(&nodes[cur], &key);
        }

        let idx = nodes.len() as u16;
        let (left, right) = if bit(&key, b) {
            (cur as u16, idx)
        } else {
            (idx, cur as u16)
        };
        nodes.push(Node {
            reference: b,
            left,
            right,
            key: key.clone(),
        });
        if prev == 0 {
            nodes[0].left = idx;
        } else if bit(&key, nodes[prev].reference) {
            nodes[prev].right = idx;
        } else {
            nodes[prev].left = idx;
        }
    }
    nodes
}

fn write_dict(w: &mut Writer, strings: &Strings, names: &[String]) -> u64 {
    if names.is_empty() {
        return 0;
    }
    let nodes = radix_tree(names);
    let at = w.alloc(8 + nodes.len() * 0x10);
    w.raw(at, b"_DIC");
    w.u32(at + 4, names.len() as u32);
    for (i, n) in nodes.iter().enumerate() {
        let p = at + 8 + i as u64 * 0x10;
        w.u32(p, n.reference);
        w.u16(p + 4, n.left);
        w.u16(p + 6, n.right);
        let name = if i == 0 { 0 } else { strings.get(&names[i - 1]) };
        w.u64(p + 8, name);
    }
    at
}

fn collect_strings(spec: &FresSpec) -> Vec<String> {
    let mut out = vec![spec.name.clone()];
    for m in &spec.models {
        out.push(m.name.clone());
        out.extend(m.record_name.clone());
        out.push(m.path.clone());
        out.extend(m.skeleton.bones.iter().map(|b| b.name.clone()));
        for v in &m.vertex_buffers {
            out.extend(v.attributes.iter().map(|a| a.name.clone()));
        }
        out.extend(m.shapes.iter().map(|s| s.name.clone()));
        for mat in &m.materials {
            out.push(mat.name.clone());
            out.extend(mat.textures.iter().cloned());
            out.extend(mat.samplers.iter().cloned());
        }
    }
    out.extend(spec.embeds.iter().map(|e| e.name.clone()));
    out.extend(spec.skeletal_anims.iter().cloned());
    let mut seen = std::collections::HashSet::new();
    out.retain(|s| !s.is_empty() && seen.insert(s.clone()));
    out
}

fn write_strings(w: &mut Writer, spec: &FresSpec) -> (u64, Strings) {
    let list = collect_strings(spec);
    let table = w.alloc(0x14);
    w.raw(table, b"_STR");
    w.u32(table + 0x10, list.len() as u32);
    let mut at = HashMap::new();
    for s in list {
        if w.buf.len() % 2 == 1 {
            w.buf.push(0);
        }
        let pos = w.len();
        let mut bytes = (s.len() as u16).to_le_bytes().to_vec();
        if w.big {
            bytes = (s.len() as u16).to_be_bytes().to_vec();
        }
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        w.buf.extend_from_slice(&bytes);
        at.insert(s, pos);
    }
    let size = (w.len() - table) as u32;
    w.u32(table + 8, size);
    (table, Strings { at })
}

fn write_skeleton(w: &mut Writer, strings: &Strings, s: &SkeletonSpec) -> u64 {
    let at = w.alloc(0x48);
    w.raw(at, b"FSKL");

    let bones = w.alloc(s.bones.len() * 0x50);
    for (i, b) in s.bones.iter().enumerate() {
        let p = bones + i as u64 * 0x50;
        w.u64(p, strings.get(&b.name));
        w.u16(p + 0x18, i as u16);
        w.i16(p + 0x1A, b.parent);
        w.i16(p + 0x1C, b.smooth);
        w.i16(p + 0x1E, b.rigid);
        w.i16(p + 0x20, -1);
        w.u32(p + 0x24, b.flags);
        w.f32s(p + 0x28, &b.scale);
        w.f32s(p + 0x34, &b.rotation);
        w.f32s(p + 0x44, &b.translation);
    }
    let names: Vec<String> = s.bones.iter().map(|b| b.name.clone()).collect();
    let dict = write_dict(w, strings, &names);

    let smooth = w.alloc(s.smooth_indices.len() * 2);
    for (i, v) in s.smooth_indices.iter().enumerate() {
        w.i16(smooth + i as u64 * 2, *v);
    }
    let matrices = w.alloc(s.smooth_matrices.len() * 0x30);
    for (i, m) in s.smooth_matrices.iter().enumerate() {
        w.f32s(matrices + i as u64 * 0x30, m);
    }

    w.u64(at + 0x10, dict);
    w.u64(at + 0x18, bones);
    w.u64(at + 0x20, smooth);
    w.u64(at + 0x28, matrices);
    w.u32(at + 0x38, 0x100);
    w.u16(at + 0x3C, s.bones.len() as u16);
    w.u16(at + 0x3E, s.smooth_indices.len() as u16);
    w.u16(at + 0x40, s.num_rigid);
    at
}

fn write_fvtx(
    w: &mut Writer,
    strings: &Strings,
    at: u64,
    index: u16,
    v: &FvtxSpec,
    pending: &mut Vec<Pending>,
) {
    w.raw(at, b"FVTX");
    let attrs = w.alloc(v.attributes.len() * 0x10);
    for (i, a) in v.attributes.iter().enumerate() {
        let p = attrs + i as u64 * 0x10;
        w.u64(p, strings.get(&a.name));
        // always stored big-endian
        w.raw(p + 8, &a.format.to_be_bytes());
        w.u16(p + 0xC, a.offset);
        w.u16(p + 0xE, a.buffer);
    }
    let names: Vec<String> = v.attributes.iter().map(|a| a.name.clone()).collect();
    let dict = write_dict(w, strings, &names);

    let sizes = w.alloc(v.buffers.len() * 0x10);
    let strides = w.alloc(v.buffers.len() * 0x10);
    let mut blob = Vec::new();
    for (i, b) in v.buffers.iter().enumerate() {
        w.u32(sizes + i as u64 * 0x10, b.data.len() as u32);
        w.u32(strides + i as u64 * 0x10, b.stride);
        blob.extend_from_slice(&b.data);
    }
    pending.push(Pending {
        patch: at + 0x50,
        relative: true,
        bytes: blob,
    });

    w.u64(at + 0x10, attrs);
    w.u64(at + 0x18, dict);
    w.u64(at + 0x38, sizes);
    w.u64(at + 0x40, strides);
    w.u8(at + 0x54, v.attributes.len() as u8);
    w.u8(at + 0x55, v.buffers.len() as u8);
    w.u16(at + 0x56, index);
    w.u32(at + 0x58, v.num_vertices);
}

fn write_lod(w: &mut Writer, at: u64, l: &LodSpec, pending: &mut Vec<Pending>) {
    let subs = w.alloc(l.submeshes.len() * 8);
    for (i, (off, cnt)) in l.submeshes.iter().enumerate() {
        w.u32(subs + i as u64 * 8, *off);
        w.u32(subs + i as u64 * 8 + 4, *cnt);
    }
    let bytes = w.index_bytes(l.index_format, &l.indices);
    pending.push(Pending {
        patch: at + 0x20,
        relative: true,
        bytes,
    });
    w.u64(at, subs);
    w.u32(at + 0x24, l.topology);
    w.u32(at + 0x28, l.index_format);
    w.u32(at + 0x2C, l.indices.len() as u32);
    w.u16(at + 0x34, l.submeshes.len() as u16);
}

fn write_shape(
    w: &mut Writer,
    strings: &Strings,
    at: u64,
    index: u16,
    s: &ShapeSpec,
    fvtx: &[u64],
    pending: &mut Vec<Pending>,
) {
    w.raw(at, b"FSHP");
    let lods = w.alloc(s.lods.len() * 0x38);
    for (i, l) in s.lods.iter().enumerate() {
        write_lod(w, lods + i as u64 * 0x38, l, pending);
    }
    let skin = w.alloc(s.skin_bones.len() * 2);
    for (i, b) in s.skin_bones.iter().enumerate() {
        w.u16(skin + i as u64 * 2, *b);
    }
    let fvtx_offset = s
        .fvtx_offset_override
        .unwrap_or_else(|| fvtx.get(s.fvtx as usize).copied().unwrap_or(0));

    w.u64(at + 0x10, strings.get(&s.name));
    w.u64(at + 0x18, fvtx_offset);
    w.u64(at + 0x20, lods);
    w.u64(at + 0x28, skin);
    w.u32(at + 0x58, 0x2);
    w.u16(at + 0x5C, index);
    w.u16(at + 0x5E, s.material);
    w.u16(at + 0x62, s.fvtx);
    w.u16(at + 0x64, s.skin_bones.len() as u16);
    w.u8(at + 0x67, s.lods.len() as u8);
}

fn write_material(w: &mut Writer, strings: &Strings, at: u64, index: u16, m: &MaterialSpec) {
    w.raw(at, b"FMAT");
    let names = w.alloc(m.textures.len() * 8);
    for (i, t) in m.textures.iter().enumerate() {
        w.u64(names + i as u64 * 8, strings.get(t));
    }
    let samplers = write_dict(w, strings, &m.samplers);
    w.u64(at + 0x10, strings.get(&m.name));
    w.u64(at + 0x38, names);
    w.u64(at + 0x48, samplers);
    w.u32(at + 0x98, m.flags);
    w.u16(at + 0x9C, index);
    w.u8(at + 0xA0, m.textures.len() as u8);
    w.u8(at + 0xA1, m.samplers.len() as u8);
}

fn write_model(
    w: &mut Writer,
    strings: &Strings,
    at: u64,
    m: &ModelSpec,
    pending: &mut Vec<Pending>,
) -> ModelLayout {
    w.raw(at, b"FMDL");
    let skeleton = if m.omit_skeleton {
        0
    } else {
        write_skeleton(w, strings, &m.skeleton)
    };

    let fvtx_array = w.alloc(m.vertex_buffers.len() * 0x60);
    let fvtx: Vec<u64> = (0..m.vertex_buffers.len())
        .map(|i| fvtx_array + i as u64 * 0x60)
        .collect();
    for (i, v) in m.vertex_buffers.iter().enumerate() {
        write_fvtx(w, strings, fvtx[i], i as u16, v, pending);
    }

    let shape_array = w.alloc(m.shapes.len() * 0x70);
    let shapes: Vec<u64> = (0..m.shapes.len())
        .map(|i| shape_array + i as u64 * 0x70)
        .collect();
    let mut lod_pending = Vec::new();
    for (i, s) in m.shapes.iter().enumerate() {
        let before = pending.len();
        write_shape(w, strings, shapes[i], i as u16, s, &fvtx, pending);
        lod_pending.push((before < pending.len()).then_some(before));
    }
    let shape_names: Vec<String> = m.shapes.iter().map(|s| s.name.clone()).collect();
    let shape_dict = write_dict(w, strings, &shape_names);

    let mat_array = w.alloc(m.materials.len() * 0xB0);
    for (i, mat) in m.materials.iter().enumerate() {
        write_material(w, strings, mat_array + i as u64 * 0xB0, i as u16, mat);
    }
    let mat_names: Vec<String> = m.materials.iter().map(|m| m.name.clone()).collect();
    let mat_dict = write_dict(w, strings, &mat_names);

    let total: u32 = m.vertex_buffers.iter().map(|v| v.num_vertices).sum();
    w.u64(at + 0x10, strings.get(m.record_name.as_ref().unwrap_or(&m.name)));
    w.u64(at + 0x18, strings.get(&m.path));
    w.u64(at + 0x20, skeleton);
    w.u64(at + 0x28, fvtx_array);
    w.u64(at + 0x30, shape_array);
    w.u64(at + 0x38, shape_dict);
    w.u64(at + 0x40, mat_array);
    w.u64(at + 0x48, mat_dict);
    w.u16(at + 0x68, m.vertex_buffers.len() as u16);
    w.u16(at + 0x6A, m.shapes.len() as u16);
    w.u16(at + 0x6C, m.materials.len() as u16);
    w.u32(at + 0x70, total);

    ModelLayout {
        offset: at,
        skeleton,
        fvtx,
        shapes,
        // filled in once the data region is laid out
        lod_indices: lod_pending
            .into_iter()
            .map(|p| p.map_or(u64::MAX, |i| i as u64))
            .collect(),
    }
}

/// Lay out `spec` as a complete FRES file.
pub fn build(spec: &FresSpec) -> Built {
    let mut w = Writer {
        buf: vec![0; 0xD0],
        big: spec.big_endian,
    };
    let mut layout = Layout::default();
    let mut pending = Vec::new();

    w.raw(0, b"FRES    ");
    w.u16(0x08, spec.version.0);
    w.u16(0x0A, spec.version.1);
    w.raw(0x0C, if spec.big_endian { &[0xFE, 0xFF] } else { &[0xFF, 0xFE] });
    w.u16(0x0E, 0x0C);
    w.u32(0x14, 0x0C);

    let (str_tab, strings) = write_strings(&mut w, spec);
    layout.str_tab = str_tab;

    let rlt = w.alloc(0x10 + 2 * 0x18);
    w.raw(rlt, b"_RLT");
    w.u32(rlt + 4, rlt as u32);
    w.u32(rlt + 8, 2);
    layout.rlt = rlt;

    layout.model_array = w.alloc(spec.models.len() * 0x78);
    for (i, m) in spec.models.iter().enumerate() {
        let at = layout.model_array + i as u64 * 0x78;
        let ml = write_model(&mut w, &strings, at, m, &mut pending);
        layout.models.push(ml);
    }
    let model_names: Vec<String> = spec.models.iter().map(|m| m.name.clone()).collect();
    let model_dict = write_dict(&mut w, &strings, &model_names);

    layout.embed_array = w.alloc(spec.embeds.len() * 0x10);
    for (i, e) in spec.embeds.iter().enumerate() {
        let p = layout.embed_array + i as u64 * 0x10;
        w.u32(p + 8, e.data.len() as u32);
        pending.push(Pending {
            patch: p,
            relative: false,
            bytes: e.data.clone(),
        });
    }
    let embed_names: Vec<String> = spec.embeds.iter().map(|e| e.name.clone()).collect();
    let embed_dict = write_dict(&mut w, &strings, &embed_names);

    let anim_array = w.alloc(spec.skeletal_anims.len() * 8);
    let anim_dict = write_dict(&mut w, &strings, &spec.skeletal_anims);

    // raw data region
    w.align(0x10);
    let data_start = w.len();
    let mut placed = Vec::with_capacity(pending.len());
    for p in &pending {
        let at = w.append(&p.bytes);
        if p.relative {
            w.u32(p.patch, (at - data_start) as u32);
        } else {
            w.u64(p.patch, at);
        }
        placed.push(at - data_start);
    }
    for ml in &mut layout.models {
        for slot in &mut ml.lod_indices {
            if let Some(rel) = placed.get(*slot as usize) {
                *slot = *rel;
            }
        }
    }
    // keep the file non-empty past the data start
    w.buf.extend_from_slice(&[0; 0x10]);
    layout.data_start = data_start;

    let total = w.len();
    w.u32(rlt + 0x1C, data_start as u32);
    w.u32(rlt + 0x30, data_start as u32);
    w.u32(rlt + 0x34, (total - data_start) as u32);

    w.u32(0x10, strings.get(&spec.name) as u32 + 2);
    w.u32(0x18, rlt as u32);
    w.u32(0x1C, total as u32);
    w.u64(0x20, strings.get(&spec.name));
    w.u64(0x28, layout.model_array);
    w.u64(0x30, model_dict);
    w.u64(0x38, anim_array);
    w.u64(0x40, anim_dict);
    w.u64(0x98, layout.embed_array);
    w.u64(0xA0, embed_dict);
    w.u64(0xB0, str_tab + 0x14);
    w.u32(0xB8, (rlt - str_tab) as u32);
    w.u16(0xBC, spec.models.len() as u16);
    w.u16(0xBE, spec.skeletal_anims.len() as u16);
    w.u16(0xC8, spec.embeds.len() as u16);

    Built {
        bytes: w.buf,
        layout,
    }
}

/// One model with a two-bone skeleton, a triangle of float positions with
/// an RGBA colour stream, and one material.
pub fn triangle_model(name: &str, big: bool) -> ModelSpec {
    let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    ModelSpec {
        name: name.into(),
        record_name: None,
        path: format!("models/{name}"),
        skeleton: SkeletonSpec {
            bones: vec![BoneSpec::new("Root", -1), BoneSpec::new("Head", 0)],
            smooth_indices: vec![0],
            smooth_matrices: vec![[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]],
            num_rigid: 1,
        },
        omit_skeleton: false,
        vertex_buffers: vec![FvtxSpec {
            attributes: vec![
                AttrSpec::new("_p0", FLOAT3, 0, 0),
                AttrSpec::new("_c0", UNORM8X4, 0, 1),
            ],
            buffers: vec![
                BufferSpec {
                    stride: 12,
                    data: f32_bytes(&positions, big),
                },
                BufferSpec {
                    stride: 4,
                    data: vec![0xFF; 12],
                },
            ],
            num_vertices: 3,
        }],
        shapes: vec![ShapeSpec {
            name: format!("{name}_mesh"),
            fvtx: 0,
            material: 0,
            lods: vec![LodSpec::new(TRIANGLES, &[0, 1, 2])],
            ..Default::default()
        }],
        materials: vec![MaterialSpec {
            name: format!("{name}_mat"),
            flags: 0x1,
            textures: vec![format!("{name}_alb")],
            samplers: vec!["_a0".into()],
        }],
    }
}
