//! Decode configuration.

/// Limits and switches for one decode call.
///
/// The caps bound the work done on corrupt input: any declared count above
/// its cap fails the enclosing unit with [`crate::Error::LimitExceeded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Cap on dictionary entries, sections, bones, attributes, LODs, etc.
    pub max_entries: u32,
    /// Cap on vertices per vertex buffer and indices per LOD.
    pub max_vertices: u32,
    /// Cap on the unpacked size of compressed input, in bytes.
    pub max_decompressed_size: u64,
    /// Build per-vertex attribute tuples. When off, buffers are still read.
    pub materialize_vertices: bool,
    /// Abort the whole container on the first section failure.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_entries: 0x1_0000,
            max_vertices: 0x100_0000,
            max_decompressed_size: 0x2000_0000,
            materialize_vertices: true,
            strict: false,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_entries(mut self, max: u32) -> Self {
        self.max_entries = max;
        self
    }

    pub fn with_max_vertices(mut self, max: u32) -> Self {
        self.max_vertices = max;
        self
    }

    pub fn with_max_decompressed_size(mut self, max: u64) -> Self {
        self.max_decompressed_size = max;
        self
    }

    pub fn with_materialize_vertices(mut self, on: bool) -> Self {
        self.materialize_vertices = on;
        self
    }

    pub fn with_strict(mut self, on: bool) -> Self {
        self.strict = on;
        self
    }

    /// Check a declared entry count against `max_entries`.
    pub(crate) fn check_entries(&self, what: &'static str, count: u64) -> crate::Result<usize> {
        check(what, count, self.max_entries)
    }

    /// Check a declared vertex or index count against `max_vertices`.
    pub(crate) fn check_vertices(&self, what: &'static str, count: u64) -> crate::Result<usize> {
        check(what, count, self.max_vertices)
    }
}

fn check(what: &'static str, count: u64, limit: u32) -> crate::Result<usize> {
    if count > limit as u64 {
        return Err(crate::Error::LimitExceeded {
            what,
            count,
            limit: limit as u64,
        });
    }
    Ok(count as usize)
}
