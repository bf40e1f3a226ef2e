//! Non-fatal integrity warnings and the sinks that receive them.
//!
//! Decoders never log anomalies directly. They hand an [`IntegrityWarning`]
//! to the [`Diagnostics`] sink passed into the decode call, substitute a safe
//! default and carry on. [`TracingSink`] forwards to `tracing`; [`Collector`]
//! keeps the warnings for inspection.

/// An anomaly that was repaired or ignored during decoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityWarning {
    /// The same name appears twice where names should be unique.
    #[error("duplicate name '{name}' in {context}; last entry wins")]
    DuplicateName { context: String, name: String },
    /// A bone's parent index points past the end of the bone array.
    #[error("bone '{bone}' has invalid parent index {parent_idx} (bone count {bone_count})")]
    ParentOutOfRange {
        bone: String,
        parent_idx: i64,
        bone_count: usize,
    },
    /// A vertex references a matrix group the skeleton does not have.
    #[error("bone group {group} does not exist (skeleton has {count} groups)")]
    BoneGroupOutOfRange { group: i64, count: usize },
    /// A smooth-matrix component was NaN or infinite and was zeroed.
    #[error("smooth matrix {matrix} element [{row},{col}] is {value}; replaced with 0")]
    NonFiniteMatrix {
        matrix: usize,
        row: usize,
        col: usize,
        value: f32,
    },
    /// The container declares a version this decoder was not written for.
    #[error("unknown FRES version {}.{}", .version.0, .version.1)]
    UnknownVersion { version: (u16, u16) },
    /// A vertex attribute uses a format code missing from the format table.
    #[error("attribute '{name}' at {offset:#x} has unknown format {code:#06x}")]
    UnknownAttribFormat { name: String, offset: u64, code: u32 },
    /// A dictionary holds fewer names than the record count it describes.
    #[error("{context}: dictionary has {entries} entries for {count} records")]
    DictCountMismatch {
        context: String,
        entries: usize,
        count: usize,
    },
    /// A record's own name differs from its dictionary entry; the dictionary name is kept.
    #[error("{context} record is named '{record}' but its dictionary entry is '{dict}'")]
    NameMismatch {
        context: String,
        dict: String,
        record: String,
    },
    /// A shape's vertex-buffer offset matches none of its model's buffers.
    #[error("shape '{shape}' vertex buffer offset {offset:#x} unknown; using index {index}")]
    VertexBufferMismatch {
        shape: String,
        offset: u64,
        index: usize,
    },
}

/// Receiver for integrity warnings raised while decoding.
pub trait Diagnostics {
    fn warn(&mut self, warning: IntegrityWarning);
}

/// Forwards every warning to `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Diagnostics for TracingSink {
    fn warn(&mut self, warning: IntegrityWarning) {
        tracing::warn!(target: "bfres", "{warning}");
    }
}

/// Keeps warnings in memory.
#[derive(Debug, Default, Clone)]
pub struct Collector {
    pub warnings: Vec<IntegrityWarning>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of collected warnings matching `pred`.
    pub fn count(&self, pred: impl Fn(&IntegrityWarning) -> bool) -> usize {
        self.warnings.iter().filter(|w| pred(w)).count()
    }
}

impl Diagnostics for Collector {
    fn warn(&mut self, warning: IntegrityWarning) {
        tracing::debug!(target: "bfres", "collected: {warning}");
        self.warnings.push(warning);
    }
}

impl Diagnostics for Vec<IntegrityWarning> {
    fn warn(&mut self, warning: IntegrityWarning) {
        self.push(warning);
    }
}
