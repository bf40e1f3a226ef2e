//! Decompression helpers (requires the `compression` feature).
//!
//! Gated behind the `compression` Cargo feature so the core decoder builds
//! without a C toolchain. Enable it to open `.bfres.zs` files directly:
//!
//! ```toml
//! [dependencies]
//! bfres = { version = "0.1", features = ["compression"] }
//! ```
//!
//! ## Submodules
//!
//! | Module | Algorithm | Typical use |
//! |--------|-----------|-------------|
//! | [`zstd`] | Zstandard | `.bfres.zs` model archives |
//!
//! [`crate::formats::fres::Container::decode`] recognises a Zstandard frame
//! and calls [`zstd::decompress_zstd`] itself, capped by
//! [`crate::DecodeOptions::max_decompressed_size`]. Call it directly only when
//! the decompressed bytes are needed for something else.
//!
//! Yaz0 (`.szs`) is not handled here.

#[cfg(feature = "compression")]
pub mod zstd;
