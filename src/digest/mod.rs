//! # Equation Digest
//!
//! Transforms a raw parsed [`Model`] into a decorated, ordered,
//! type-attributed form the [`crate::code_generator`] can translate
//! mechanically. The twenty stages run in the fixed order
//! below; each assumes every earlier stage has completed.
//!
//! Pin resolution and special injection form a safety/normalization
//! pre-pass, `order` establishes a stratified evaluation order, and
//! `fold`/`unused` form a fixpoint rewrite loop over what's left.

pub mod cache;
mod combiner;
mod connection_matrix;
mod events;
mod exponent;
mod flatten;
mod fold;
mod integration;
mod liveness;
mod live_reach;
mod order;
mod pins;
mod resolve;
mod specials;
mod splits;
mod temporaries;
mod trace;
mod types;
mod unused;
mod units;

pub use combiner::Combiner;
pub use events::{EventSource, EventTarget, TriggerEdge};
pub use trace::{DigestTrace, StageStats};

use crate::ast::Model;
use crate::catalog::Catalog;
use crate::config::NumericBackend;
use crate::error::DigestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-part analysis output, populated during
/// digest and read (never mutated) by [`crate::code_generator`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendData {
    /// Variable index → whether it lives in population (vs. instance) state.
    pub population_scoped: BTreeMap<usize, bool>,
    /// Variable index → whether it needs a `next_` buffer for external
    /// read/write separation.
    pub buffered: BTreeMap<usize, bool>,
    /// Variable index → combiner semantics (identity element, fold point).
    pub combiners: BTreeMap<usize, Combiner>,
    /// Variable indices that are integrated (order > 0 companion exists).
    pub integrated: Vec<usize>,
    /// Bit position assigned to each boolean flag this part's Instance
    /// tracks (`$live`, `newborn`, per-event-target latches).
    pub flag_bits: BTreeMap<String, u32>,
    pub event_sources: Vec<EventSource>,
    pub event_targets: Vec<EventTarget>,
    /// Output column names computed at population scope (`$xyz`-style
    /// generated names), in emission order.
    pub local_columns: Vec<String>,
    pub global_columns: Vec<String>,
    /// Number of pipelined-delay operator instances this part's Instance
    /// must allocate storage for.
    pub delays: usize,
    /// True if this part (or something downstream of it) can cause death
    /// to propagate to its container (stage 11 `lethalP` /
    /// `lethalContainer` / `lethalConnection`).
    pub lethal_p: bool,
    pub lethal_container: bool,
    pub lethal_connection: bool,
    /// `$type` split targets, in declaration order.
    pub splits: Vec<String>,
}

/// Run the full twenty-stage digest pipeline over `model`, mutating it in
/// place and returning it frozen ("Lifecycle": parse → digest-mutate
/// → frozen). On failure, every collected [`DigestError`] from the failing
/// stage is returned; earlier stages are assumed sound since each stage
/// only proceeds once the previous one reports no errors.
pub fn run(mut model: Model, backend: NumericBackend) -> Result<(Model, DigestTrace), Vec<DigestError>> {
    let mut trace = DigestTrace::default();
    let mut catalog = Catalog::build(&model);

    macro_rules! stage {
        ($name:literal, $body:expr) => {{
            let _span = tracing::debug_span!("digest_stage", stage = $name).entered();
            let started = trace.stages.len();
            let result: Result<(), Vec<DigestError>> = $body;
            result?;
            trace.stages.push(StageStats {
                name: $name,
                order: started,
            });
        }};
    }

    stage!("collect_resolve_purge_pins", pins::run(&mut model));
    stage!("resolve_connection_bindings", specials::resolve_connection_bindings(&mut model, &mut catalog));
    stage!("add_globals_and_specials", specials::add_specials(&mut model));
    stage!("attribute_seeding", specials::seed_attributes(&mut model));
    stage!("resolve_references", resolve::run(&mut model, &catalog));
    stage!("create_integrated_variables", integration::run(&mut model));
    stage!("flatten", flatten::run(&mut model));
    stage!("sort_parts", order::order_parts(&mut model));
    stage!("unit_check", units::run(&mut model));
    stage!("fold_and_simplify", fold::run(&mut model));
    stage!("splits_and_death_propagation", splits::run(&mut model));
    stage!("remove_unused_variables", unused::run(&mut model));
    stage!("temporary_promotion", temporaries::run(&mut model));
    stage!("order_variables", order::order_variables(&mut model));
    stage!("derivative_and_liveness", liveness::run(&mut model));
    stage!("live_reach_discovery", live_reach::run(&mut model));
    stage!("type_determination", types::run(&mut model));
    if matches!(backend, NumericBackend::Int) {
        stage!("exponent_determination", exponent::run(&mut model));
    }
    stage!("connection_matrix_detection", connection_matrix::run(&mut model));
    stage!("event_analysis", events::run(&mut model));

    Ok((model, trace))
}
