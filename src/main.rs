//! Compiler driver binary: reads a model source file, runs it through
//! digest, connection planning, and emission, and writes the generated
//! Rust source (plus a `Cargo.toml` for it) to an output directory.
//! On an aborted run, writes a `failure` sentinel file into the output
//! directory instead.

use anyhow::{Context, Result};
use clap::Parser;
use n2a_core::config::NumericBackend;
use n2a_core::digest::cache;
use n2a_core::{digest_model, init_tracing, parser, plan_and_emit, Config};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "n2a", about = "Compile an N2A model into a standalone Rust simulation")]
struct Args {
    /// Path to the model source file (node-tree format).
    #[arg(long)]
    model: PathBuf,

    /// Directory the generated crate is written to.
    #[arg(long, default_value = "generated")]
    out_dir: PathBuf,

    /// Numeric backend: `float` (default) or `int` (fixed-point).
    #[arg(long, default_value = "float")]
    backend: String,

    /// Path to a driver configuration file, merged over `n2a.toml`.
    #[arg(long)]
    config: Option<String>,

    /// Path to a digest checkpoint (see [`n2a_core::digest::cache`]).
    /// When present and still fresh for `--model`'s source text, the
    /// twenty-stage digest pipeline is skipped and the cached,
    /// already-digested model is planned and emitted directly; otherwise
    /// digest runs normally and its result is written here for the next
    /// invocation.
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .unwrap_or_default();
    init_tracing(&config.logging);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let message = error.to_string();
            tracing::error!(%message, "compilation aborted");
            eprintln!("Exception: {message}");
            let _ = fs::create_dir_all(&args.out_dir);
            let _ = fs::write(args.out_dir.join("failure"), &message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let backend = match args.backend.as_str() {
        "int" => NumericBackend::Int,
        "float" => NumericBackend::Float,
        other => anyhow::bail!("unknown backend {other:?}, expected `float` or `int`"),
    };

    let source = fs::read_to_string(&args.model).with_context(|| format!("reading {}", args.model.display()))?;
    let model = parser::parse_hierarchy(&source).context("parsing model source")?;

    let (model, trace) = match &args.checkpoint {
        Some(path) => match cache::load_if_fresh(path, &source).context("reading digest checkpoint")? {
            Some(cached) => {
                tracing::info!(path = %path.display(), "reusing fresh digest checkpoint");
                (cached, Default::default())
            }
            None => {
                let (model, trace) = digest_model(model, backend).map_err(anyhow::Error::msg)?;
                cache::save(path, &source, &model).context("writing digest checkpoint")?;
                (model, trace)
            }
        },
        None => digest_model(model, backend).map_err(anyhow::Error::msg)?,
    };

    let output = plan_and_emit(model, trace).map_err(anyhow::Error::msg)?;

    fs::create_dir_all(&args.out_dir)?;
    fs::create_dir_all(args.out_dir.join("src"))?;
    fs::write(args.out_dir.join("src").join("model.rs"), &output.source)?;
    fs::write(args.out_dir.join("Cargo.toml"), generated_cargo_toml())?;

    tracing::info!(parts = output.model.parts.len(), holders = output.holders.len(), "compiled model");
    Ok(())
}

fn generated_cargo_toml() -> String {
    r#"[package]
name = "n2a-generated-model"
version = "0.1.0"
edition = "2021"

[dependencies]
n2a-core = { path = "../" }
"#
    .to_string()
}
