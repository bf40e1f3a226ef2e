//! bfres-dump - print the decoded contents of a BFRES file
//!
//! Decodes one `.bfres` (or `.bfres.zs` with the `compression` feature),
//! prints a dump of every section, lists integrity warnings and, with
//! `--extract`, writes embedded files out. Embedded BFRES and BNTX files are
//! decoded and summarised too.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bfres::formats::bntx::Bntx;
use bfres::{Collector, Container, DecodeOptions, Dump, FileKind};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bfres-dump")]
#[command(about = "Dump the contents of a BFRES model container")]
#[command(version)]
struct Cli {
    /// Input .bfres file
    input: PathBuf,

    /// Write embedded files into this directory
    #[arg(short, long)]
    extract: Option<PathBuf>,

    /// Fail on the first section that does not decode
    #[arg(long)]
    strict: bool,

    /// Cap on any declared entry count
    #[arg(long, default_value_t = DecodeOptions::default().max_entries)]
    max_entries: u32,

    /// Skip building per-vertex values
    #[arg(long)]
    no_vertices: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let opts = DecodeOptions::default()
        .with_strict(cli.strict)
        .with_max_entries(cli.max_entries)
        .with_materialize_vertices(!cli.no_vertices);

    let data = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    dump_container(&cli.input.display().to_string(), data, &opts, cli.extract.as_deref(), 0)
}

fn dump_container(
    label: &str,
    data: Vec<u8>,
    opts: &DecodeOptions,
    extract: Option<&Path>,
    depth: usize,
) -> Result<()> {
    let mut warnings = Collector::new();
    let fres = Container::decode_with(data, opts, &mut warnings)
        .with_context(|| format!("decoding {label}"))?;

    print!("{}", fres.dump());
    for w in &warnings.warnings {
        println!("warning: {w}");
    }

    for file in &fres.embeds {
        if let Some(dir) = extract {
            match file.file_name() {
                Some(name) => {
                    std::fs::create_dir_all(dir)?;
                    let path = dir.join(name);
                    std::fs::write(&path, &file.data)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), bytes = file.size(), "extracted");
                }
                None => tracing::warn!(
                    name = %file.name,
                    "embedded file name is not a plain file name; skipped"
                ),
            }
        }
        match file.kind() {
            FileKind::Fres if depth < 4 => {
                let inner = file.materialize().into_inner();
                dump_container(&file.name, inner, opts, extract, depth + 1)?;
            }
            FileKind::Bntx => match Bntx::decode(&file.data, opts) {
                Ok(bntx) => {
                    for t in &bntx.textures {
                        println!(
                            "texture \"{}\" {}x{}x{} mips {} format {:#x}",
                            t.name, t.width, t.height, t.depth, t.mipmap_count, t.format
                        );
                    }
                }
                Err(e) => tracing::warn!(name = %file.name, error = %e, "BNTX did not decode"),
            },
            _ => {}
        }
    }
    Ok(())
}
