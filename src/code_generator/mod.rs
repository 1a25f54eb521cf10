//! # Code Generator
//!
//! Lowers a digested [`crate::ast::Model`] plus its [`ConnectionHolder`]
//! plan into Rust source text: one `Instance` struct and one
//! `Population` struct per part, wired together through the access
//! paths [`resolve::render_access`] computes and the multiconditional
//! bodies [`multiconditional::render_assignment`] renders.
//!
//! ## Pipeline Position
//!
//! ```text
//! Model (post-digest) + Vec<ConnectionHolder> -> [CodeEmitter] -> Rust source text
//! ```

mod expr;
mod instance;
mod multiconditional;
mod population;
mod resolve;

pub use resolve::field_name;

use crate::ast::Model;
use crate::connection_planner::ConnectionHolder;
use crate::error::EmitError;

/// Emits one generated `.rs` module per digested part, in `ordered_parts`
/// order so that a part's dependencies are always emitted first (the
/// topological order digest already computed, reused here rather than
/// re-deriving an emission order).
pub struct CodeEmitter<'a> {
    model: &'a Model,
    holders: &'a [ConnectionHolder],
}

impl<'a> CodeEmitter<'a> {
    pub fn new(model: &'a Model, holders: &'a [ConnectionHolder]) -> Self {
        CodeEmitter { model, holders }
    }

    /// Render the full source text for every part in the model.
    pub fn emit_all(&self) -> Result<String, EmitError> {
        let mut out = String::new();
        for idx in 0..self.model.parts.len() {
            out.push_str(&self.emit_part(idx)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Render one part's `Instance` struct, `impl` block, and
    /// `Population` struct.
    pub fn emit_part(&self, idx: usize) -> Result<String, EmitError> {
        let part = self.model.part(idx);
        let backend = part
            .backend_data
            .as_ref()
            .ok_or_else(|| EmitError::MissingBackendData(part.name.clone()))?;
        let container_type = part.container.map(|i| self.model.part(i).name.as_str());

        let mut out = String::new();
        out.push_str(&instance::emit_split_enum(part));

        out.push_str(&format!("#[derive(Debug, Clone, Default)]\npub struct {}Instance {{\n", part.name));
        out.push_str(&instance::emit_fields(part, container_type));
        out.push_str("}\n\n");

        out.push_str(&format!("impl {}Instance {{\n", part.name));
        out.push_str("    pub fn init(&mut self) {\n");
        out.push_str(&instance::emit_init(part)?);
        out.push_str("    }\n\n");
        out.push_str("    pub fn integrate(&mut self, integrator: &dyn crate::runtime::integrator::Integrator, dt: f64) {\n");
        out.push_str(&instance::emit_integrate(part)?);
        out.push_str("    }\n\n");
        out.push_str("    pub fn update(&mut self) {\n");
        out.push_str(&instance::emit_update(part));
        out.push_str("    }\n\n");
        out.push_str("    pub fn finalize(&mut self) -> bool {\n");
        out.push_str(&instance::emit_finalize(part));
        out.push_str("    }\n\n");
        out.push_str(&instance::emit_basic_lifecycle(part));
        out.push('\n');
        out.push_str(&instance::emit_derivative_stack(part));
        out.push('\n');
        out.push_str(&instance::emit_connection_formation_accessors(part));
        out.push('\n');
        out.push_str(&instance::emit_connection_endpoint_accessors(part));
        out.push_str(&instance::emit_map_index(part));
        out.push('\n');
        out.push_str(&instance::emit_event_methods(part));
        out.push('\n');
        out.push_str(&instance::emit_diagnostics(part, container_type));
        out.push('\n');
        out.push_str(&instance::emit_from_2_to(part));
        out.push_str("}\n\n");

        out.push_str(&format!("#[derive(Debug, Clone, Default)]\npub struct {}Population {{\n", part.name));
        out.push_str(&format!("    pub instances: Vec<{}Instance>,\n", part.name));
        out.push_str(&population::emit_population_fields(part, backend));
        out.push_str("}\n\n");

        out.push_str(&format!("impl {}Population {{\n", part.name));
        out.push_str(&population::emit_basic_lifecycle());
        out.push('\n');
        out.push_str(&population::emit_create(&part.name, part.singleton));
        out.push('\n');
        out.push_str(&population::emit_add());
        out.push('\n');
        out.push_str(&population::emit_remove());
        out.push('\n');
        out.push_str(&population::emit_resize(part.singleton));
        out.push('\n');
        out.push_str(&population::emit_get_n());
        out.push('\n');
        out.push_str(&population::emit_population_quartet());
        out.push('\n');
        out.push_str(&population::emit_derivative_stack_fanout());
        out.push('\n');
        out.push_str(&population::emit_clear_new());
        out.push('\n');
        if let Some(strategy) = self.strategy_for(idx) {
            out.push_str(&population::emit_get_iterators(part, strategy));
        }
        out.push_str(&population::emit_path(part));
        out.push_str("}\n");

        Ok(out)
    }

    /// The coalesced connection strategy this part resolves to, if it is
    /// a connection part at all.
    pub fn strategy_for(&self, idx: usize) -> Option<&crate::connection_planner::Strategy> {
        self.holders.iter().find(|h| h.part == idx).map(|h| &h.strategy)
    }
}
