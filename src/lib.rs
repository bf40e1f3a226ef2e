//! **bfres** - a decoder for Nintendo Switch BFRES model containers.
//!
//! ```no_run
//! use bfres::{Container, Dump};
//!
//! let data = std::fs::read("Player.bfres")?;
//! let fres = Container::decode(data)?;
//! for model in &fres.models {
//!     println!("{}: {} shapes", model.name, model.shapes.len());
//! }
//! print!("{}", fres.dump());
//! # Ok::<(), bfres::Error>(())
//! ```
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`reader`]        | Positioned, typed reads over a byte buffer |
//! | [`codec`]         | Declarative fixed-layout record decoding |
//! | [`formats::fres`] | BFRES container and its sections |
//! | [`formats::bntx`] | BNTX texture container metadata |
//! | [`diagnostics`]   | Non-fatal integrity warnings and sinks |
//! | [`options`]       | Decode limits and switches |
//! | [`compression`]   | Zstandard unpacking (`compression` feature) |

pub mod codec;
pub mod compression;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod options;
pub mod reader;

pub use diagnostics::{Collector, Diagnostics, IntegrityWarning, TracingSink};
pub use error::{Error, Result};
pub use formats::fres::{Container, Dump, SectionFailure, SectionKind};
pub use formats::FileKind;
pub use options::DecodeOptions;
pub use reader::{ByteOrder, ByteReader};
