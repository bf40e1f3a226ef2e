//! `_DIC` name dictionary.
//!
//! A radix (Patricia) tree mapping names to entry indices.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "_DIC"     (4 bytes)
//! [0x04] Entry count N    (u32, root not included)
//! [0x08] Nodes            ((N + 1) × 0x10)
//! ```
//!
//! Each node:
//! ```text
//! [0x00] Reference bit    (u32, 0xFFFFFFFF for the root)
//! [0x04] Left child       (u16 node index)
//! [0x06] Right child      (u16 node index)
//! [0x08] Name             (u64 -> length-prefixed string)
//! ```
//!
//! Node 0 is the root; nodes 1..=N are the entries in storage order.

use std::collections::HashSet;

use crate::codec::{Field, FieldKind, StructCodec};
use crate::diagnostics::{Diagnostics, IntegrityWarning};
use crate::options::DecodeOptions;
use crate::reader::ByteReader;
use crate::Result;

pub(crate) static DICT_HEADER: StructCodec = StructCodec::new(
    "_DIC",
    &[
        Field::new("magic", FieldKind::Magic(b"_DIC")),
        Field::new("count", FieldKind::U32),
    ],
);

pub(crate) static DICT_NODE: StructCodec = StructCodec::new(
    "_DIC node",
    &[
        Field::new("reference", FieldKind::U32),
        Field::new("left", FieldKind::U16),
        Field::new("right", FieldKind::U16),
        Field::new("name", FieldKind::Str64),
    ],
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictNode {
    pub reference: u32,
    pub left: u16,
    pub right: u16,
    pub name: String,
}

/// A decoded `_DIC` block.
///
/// Unbound, each entry's value is its index. [`NameDict::bind`] turns the
/// values into offsets into the record array the dictionary describes.
#[derive(Debug, Clone, Default)]
pub struct NameDict {
    pub offset: u64,
    nodes: Vec<DictNode>,
    values: Vec<u64>,
}

impl NameDict {
    /// Decode the dictionary at `offset`. `context` names the owner in
    /// duplicate-name warnings.
    pub fn decode(
        r: &ByteReader<'_>,
        offset: u64,
        opts: &DecodeOptions,
        diag: &mut dyn Diagnostics,
        context: &str,
    ) -> Result<Self> {
        let header = DICT_HEADER.decode(r, offset)?;
        let count = opts.check_entries("dictionary entry", header.uint("count")?)?;

        let mut nodes = Vec::with_capacity(count + 1);
        for rec in DICT_NODE.decode_array(r, offset + DICT_HEADER.size as u64, count + 1)? {
            nodes.push(DictNode {
                reference: rec.uint("reference")? as u32,
                left: rec.uint("left")? as u16,
                right: rec.uint("right")? as u16,
                name: rec.text("name")?.to_owned(),
            });
        }

        let mut seen = HashSet::with_capacity(count);
        for node in &nodes[1..] {
            if !seen.insert(node.name.as_str()) {
                diag.warn(IntegrityWarning::DuplicateName {
                    context: context.to_owned(),
                    name: node.name.clone(),
                });
            }
        }

        Ok(Self {
            offset,
            nodes,
            values: (0..count as u64).collect(),
        })
    }

    /// Map entry `i` to `array_offset + i * stride`.
    pub fn bind(mut self, array_offset: u64, stride: u64) -> Self {
        for (i, v) in self.values.iter_mut().enumerate() {
            *v = array_offset + i as u64 * stride;
        }
        self
    }

    /// Number of entries, not counting the root.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All nodes, root first.
    pub fn nodes(&self) -> &[DictNode] {
        &self.nodes
    }

    /// Name of entry `i`.
    pub fn name(&self, i: usize) -> Option<&str> {
        self.nodes.get(i + 1).map(|n| n.name.as_str())
    }

    /// `(name, value)` pairs in storage order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.nodes
            .iter()
            .skip(1)
            .zip(&self.values)
            .map(|(n, v)| (n.name.as_str(), *v))
    }

    /// Walk the tree for `name` and return its entry index.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let key = encoding_rs::SHIFT_JIS.encode(name).0;
        let root = self.nodes.first()?;
        let mut prev = root;
        let mut idx = root.left as usize;
        let mut node = self.nodes.get(idx)?;
        // references strictly increase going down; a back edge ends the walk
        while (prev.reference as i32) < (node.reference as i32) {
            prev = node;
            idx = if bit(&key, node.reference) {
                node.right
            } else {
                node.left
            } as usize;
            node = self.nodes.get(idx)?;
        }
        (idx != 0 && node.name == name).then(|| idx - 1)
    }

    /// Value stored for `name`, or `None` if the name is absent.
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.index_of(name).and_then(|i| self.values.get(i).copied())
    }
}

/// Bit `b` of `key`, counting from the least significant bit of the last
/// byte. Bits past the start of the key read as 0.
pub(crate) fn bit(key: &[u8], b: u32) -> bool {
    let byte = (b / 8) as usize;
    match key.len().checked_sub(byte + 1) {
        Some(i) => (key[i] >> (b % 8)) & 1 == 1,
        None => false,
    }
}
