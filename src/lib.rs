//! # N2A
//!
//! A compiler for hierarchical neural-modeling equations and the runtime
//! library the compiled code links against.
//!
//! ## Pipeline architecture
//!
//! ```text
//! Model source text
//!     ↓
//! [Parser]                    → Model (forest of EquationSets)
//!     ↓
//! [EquationDigest]            → decorated, ordered, type-attributed Model
//!     ↓
//! [ConnectionPlanner]         → ConnectionHolder per connection part
//!     ↓
//! [CodeEmitter]                → Instance/Population Rust source
//!     ↓
//! rustc, linked against `runtime`
//! ```
//!
//! ## Module organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `ast` | The equation-hierarchy data model (`Model`, `EquationSet`, `Variable`) |
//! | `parser` | Indentation-based node-tree source format → `Model` |
//! | `catalog` | Part name → index lookup, used throughout digest |
//! | `digest` | The twenty-stage analysis pipeline that decorates a `Model` |
//! | `connection_planner` | Chooses enumerative/nearest-neighbor/sparse-matrix strategy |
//! | `code_generator` | Emits `Instance`/`Population` Rust source per part |
//! | `runtime` | The library emitted code links against: event queue, integrators, connection formation, population membership, I/O holders |
//! | `storage` | I/O holders: `InputHolder`, `OutputHolder`, `ImageInput`/`ImageOutput`, `MatrixInput`, `Mfile` |
//! | `value` | Digest-time literal representation and fixed-point arithmetic |
//! | `config` | Layered TOML configuration for the compiler driver |
//! | `error` | Per-phase error types (`DigestError`, `PlanError`, `EmitError`, `RuntimeError`, `AbortRun`) |

pub mod ast;
pub mod catalog;
pub mod code_generator;
pub mod config;
pub mod connection_planner;
pub mod digest;
pub mod error;
pub mod parser;
pub mod runtime;
pub mod storage;
pub mod value;

pub use ast::{EquationSet, Model, Variable};
pub use catalog::Catalog;
pub use config::Config;
pub use connection_planner::{ConnectionHolder, Strategy};
pub use error::{AbortRun, DigestError, EmitError, PlanError, RuntimeError};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Leaks the non-blocking appender's worker guard for the process
/// lifetime when file logging is enabled, so buffered log lines are
/// still flushed by the background thread after `init_tracing` returns.
static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> = std::sync::OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the process-wide `tracing` subscriber:
/// structured, level-filtered by `RUST_LOG`/`config.logging.level`,
/// rendered as plain text or JSON per `config.logging.format`, and
/// additionally daily-rolled to `config.logging.log_dir` when set, so a
/// generated binary's simulation-run log survives past its own process.
/// Call once from a binary's `main`; safe to call more than once, later
/// calls are a no-op (`try_init` swallows the "already set" error).
pub fn init_tracing(config: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stderr_layer: BoxedLayer = if config.format == "json" {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file_layer: Option<BoxedLayer> = config.log_dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "n2a-run.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
        if config.format == "json" { layer.json().boxed() } else { layer.boxed() }
    });

    let result = tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).try_init();
    if let Err(e) = result {
        tracing::debug!("tracing subscriber already initialized: {e}");
    }
}

/// Output of a full compile: the digested model, its connection holders,
/// and the emitted Rust source.
/// Returned by [`compile`] for `main` to write to disk.
pub struct CompileOutput {
    pub model: ast::Model,
    pub trace: digest::DigestTrace,
    pub holders: Vec<ConnectionHolder>,
    pub source: String,
}

/// Run just the `EquationDigest` stage, collecting every digest error
/// rather than stopping at the first ("digest errors are
/// collected ... and surfaced as a single abort"). Split out from
/// [`compile`] so a driver can checkpoint the digested model
/// ([`digest::cache`]) between this stage and planning/emission.
pub fn digest_model(model: ast::Model, backend: config::NumericBackend) -> Result<(ast::Model, digest::DigestTrace), AbortRun> {
    digest::run(model, backend).map_err(|errors| {
        let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        AbortRun(joined)
    })
}

/// Connection planning and emission over an already-digested `model`
/// ("ConnectionPlanner → CodeEmitter").
pub fn plan_and_emit(model: ast::Model, trace: digest::DigestTrace) -> Result<CompileOutput, AbortRun> {
    let holders = connection_planner::plan(&model)?;

    let emitter = code_generator::CodeEmitter::new(&model, &holders);
    let source = emitter.emit_all().map_err(AbortRun::from)?;

    Ok(CompileOutput { model, trace, holders, source })
}

/// Run digest, connection planning, and emission over `model` in
/// sequence, the way the compiler driver binary does: EquationDigest →
/// ConnectionPlanner → CodeEmitter.
pub fn compile(model: ast::Model, backend: config::NumericBackend) -> Result<CompileOutput, AbortRun> {
    let (model, trace) = digest_model(model, backend)?;
    plan_and_emit(model, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn compile_runs_digest_planning_and_emission_end_to_end() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("V");
        v.equations.push(Equation::default_arm("-65"));
        set.variables.push(v);
        let model = Model::new(set);

        let output = compile(model, config::NumericBackend::Float).unwrap();
        assert!(output.source.contains("struct LeakyInstance"));
    }
}
