//! `n2a-dump`: runs a model source file through digest only (no connection
//! planning or emission) and pretty-prints the decorated part tree —
//! ordered variables, exponents, event descriptors, and the stage trace.
//! Analogous to a debug dump of an intermediate compiler phase; useful for
//! inspecting what digest decided without generating a whole crate.

use clap::Parser;
use n2a_core::ast::{EquationSet, Model};
use n2a_core::config::NumericBackend;
use n2a_core::{init_tracing, parser, Config};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "n2a-dump", about = "Dump the digested equation tree for a model")]
struct Args {
    /// Path to the model source file (node-tree format).
    #[arg(long)]
    model: PathBuf,

    /// Numeric backend: `float` (default) or `int` (fixed-point).
    #[arg(long, default_value = "float")]
    backend: String,

    /// `text` (default, indented tree) or `json` (the full digested
    /// `Model`, for feeding into another tool).
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&Config::default().logging);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Exception: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let backend = match args.backend.as_str() {
        "int" => NumericBackend::Int,
        "float" => NumericBackend::Float,
        other => return Err(format!("unknown backend {other:?}, expected `float` or `int`")),
    };

    let source = fs::read_to_string(&args.model).map_err(|e| format!("reading {}: {e}", args.model.display()))?;
    let model = parser::parse_hierarchy(&source).map_err(|e| e.to_string())?;

    let (model, trace) = n2a_core::digest::run(model, backend).map_err(|errors| {
        errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    })?;

    if args.format == "json" {
        let rendered = serde_json::to_string_pretty(&model).map_err(|e| e.to_string())?;
        println!("{rendered}");
        return Ok(());
    }

    println!("# stages run");
    for stage in &trace.stages {
        println!("  [{:02}] {}", stage.order, stage.name);
    }

    println!("\n# part tree");
    print_part(&model, model.root, 0);

    Ok(())
}

fn print_part(model: &Model, idx: usize, depth: usize) {
    let part = model.part(idx);
    let indent = "  ".repeat(depth);
    let kind = if part.is_connection() { "connection" } else { "compartment" };
    println!("{indent}{} ({kind}){}", part.name, if part.singleton { " singleton" } else { "" });

    for &var_idx in &part.ordered {
        print_variable(part, var_idx, depth + 1);
    }
    // Variables digest hasn't ordered yet (e.g. partial failure runs) still
    // get shown, appended after the ordered ones.
    for (var_idx, _) in part.variables.iter().enumerate() {
        if !part.ordered.contains(&var_idx) {
            print_variable(part, var_idx, depth + 1);
        }
    }

    let child_order: Vec<usize> = if part.ordered_parts.is_empty() { part.parts.clone() } else { part.ordered_parts.clone() };
    for child_idx in child_order {
        print_part(model, child_idx, depth + 1);
    }
}

fn print_variable(part: &EquationSet, var_idx: usize, depth: usize) {
    let var = &part.variables[var_idx];
    let indent = "  ".repeat(depth);
    let exponent = match var.exponent {
        Some(e) => format!(" exp={e}"),
        None => String::new(),
    };
    let attrs: Vec<&str> = var.attributes.iter().map(String::as_str).collect();
    let attrs = if attrs.is_empty() { String::new() } else { format!(" [{}]", attrs.join(",")) };
    let ticks = "'".repeat(var.order as usize);
    println!("{indent}{}{}{}{}", var.name, ticks, exponent, attrs);

    for eq in &var.equations {
        let cond = eq.condition.as_deref().map(|c| format!(" @ {c}")).unwrap_or_default();
        println!("{indent}  = {}{}", eq.expression, cond);
    }
}
