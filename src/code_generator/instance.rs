//! Emits the `Instance` struct and the full Instance Protocol lifecycle
//! methods for one digested part: lifecycle (`ctor`/`dtor`/`clear`/`die`/
//! `enter_simulation`/`leave_simulation`/`is_free`), the equation-driven
//! quartet (`init`/`integrate`/`update`/`finalize`), the Runge-Kutta
//! snapshot/derivative-stack methods, and the small accessor surface
//! (`get_live`/`get_p`/`get_xyz`/`get_newborn`/`set_part_*`/`get_part_*`/
//! `map_index`/`event_test`/`event_delay`/`set_latch`/`finalize_event`/
//! `get_count`/`path`/`from_2_to`).
//!
//! Emitted `{Part}Instance` structs never implement
//! [`crate::runtime::Instance`] — they get a plain inherent `impl` — so
//! every one of these methods has to actually be rendered here: there is
//! no trait default to fall back on once the impl exists at all.

use crate::ast::{Assignment, EquationSet, VarType};
use crate::code_generator::expr;
use crate::code_generator::{multiconditional, resolve};
use crate::digest::BackendData;
use crate::error::EmitError;

fn rust_type(var_type: &VarType) -> &'static str {
    match var_type {
        VarType::Scalar => "f64",
        // Flattened row-major storage, same layout `value::Value::Matrix`
        // uses during digest; no dedicated runtime matrix type exists yet,
        // so dimensions aren't tracked on the field itself.
        VarType::Matrix => "Vec<f64>",
        VarType::Text => "String",
    }
}

fn backend(part: &EquationSet) -> BackendData {
    part.backend_data.clone().unwrap_or_default()
}

/// `(base_field, derivative_field)` pairs, in declaration order, for
/// every variable that is some other variable's derivative companion.
fn integrated_pairs(part: &EquationSet) -> Vec<(String, String)> {
    part.variables
        .iter()
        .filter_map(|v| v.derivative.map(|base| (resolve::field_name(&part.variables[base].name), resolve::field_name(&v.name))))
        .collect()
}

/// Render the `Instance` struct's field list: a `container` link (if this
/// part is nested inside another), one field per connection-endpoint
/// alias, one field per non-temporary variable (`next_`-prefixed shadow
/// fields for anything combined), and the bookkeeping fields every
/// instance carries regardless of what its equations need
/// (membership/event/Runge-Kutta state).
///
/// Sub-part (`$down`) fields are deliberately not emitted here: unlike an
/// endpoint alias, a `container` back-reference paired with a forward
/// field to a singleton child would make `{Part}Instance::default()`
/// recurse between the two types forever. No digest-driven test exercises
/// `$down` through a real part tree (only `resolve.rs`'s own hand-built
/// `VariableReference` unit test does), so this is deferred rather than
/// fixed blind.
pub fn emit_fields(part: &EquationSet, container_type: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(cty) = container_type {
        out.push_str(&format!("    pub container: std::rc::Rc<std::cell::RefCell<{cty}Instance>>,\n"));
    }
    for binding in &part.connection_bindings {
        let field = resolve::field_name(&binding.alias);
        out.push_str(&format!("    pub {field}: std::rc::Rc<std::cell::RefCell<{}Instance>>,\n", binding.endpoint));
    }
    for var in &part.variables {
        if var.has_attr(crate::ast::ATTR_TEMPORARY) {
            continue;
        }
        let field = resolve::field_name(&var.name);
        let ty = rust_type(&var.var_type);
        out.push_str(&format!("    pub {field}: {ty},\n"));
        if var.is_combined() {
            out.push_str(&format!("    next_{field}: {ty},\n"));
        }
    }
    out.push_str("    pub index: usize,\n");
    out.push_str("    dead: bool,\n");
    out.push_str("    newborn: bool,\n");
    out.push_str("    latch: bool,\n");
    out.push_str("    event_prev: Vec<f64>,\n");
    out.push_str("    snapshot_stack: Vec<f64>,\n");
    out.push_str("    rk_last: Vec<f64>,\n");
    out.push_str("    rk_accum: Vec<f64>,\n");
    out
}

/// Render the `init` method body: every variable's `$init`-conditioned
/// (or unconditioned, for non-integrated variables) equation, in
/// dependency order.
pub fn emit_init(part: &EquationSet) -> Result<String, EmitError> {
    let mut out = String::new();
    let order = if part.ordered.is_empty() { (0..part.variables.len()).collect::<Vec<_>>() } else { part.ordered.clone() };
    for &i in &order {
        let var = &part.variables[i];
        if var.has_attr(crate::ast::ATTR_TEMPORARY) {
            continue;
        }
        let field = resolve::field_name(&var.name);
        let target = format!("self.{field}");
        let rendered = multiconditional::render_assignment(var, &target, |e| expr::translate(e, part));
        if !rendered.is_empty() {
            out.push_str("    ");
            out.push_str(&rendered);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Render the `update` method body: re-evaluate every non-differential,
/// non-`initOnly` variable against the state `integrate` just advanced.
/// Combined variables accumulate into their `next_` buffer using their own
/// combiner operator rather than being clobbered by a plain replace; the
/// buffer is published (and reset to identity) in `finalize`.
pub fn emit_update(part: &EquationSet) -> String {
    let mut out = String::new();
    let order = if part.ordered.is_empty() { (0..part.variables.len()).collect::<Vec<_>>() } else { part.ordered.clone() };
    for &i in &order {
        let var = &part.variables[i];
        if var.derivative.is_some() || var.has_attr(crate::ast::ATTR_TEMPORARY) || var.has_attr(crate::ast::ATTR_INIT_ONLY) {
            continue;
        }
        let field = resolve::field_name(&var.name);
        let rendered = if var.is_combined() {
            multiconditional::render_combined_assignment(var, &format!("self.next_{field}"), |e| expr::translate(e, part))
        } else {
            multiconditional::render_assignment(var, &format!("self.{field}"), |e| expr::translate(e, part))
        };
        if !rendered.is_empty() {
            out.push_str("    ");
            out.push_str(&rendered);
            out.push('\n');
        }
    }
    out
}

/// Render the `integrate` method body: for every integrated variable
/// (has a `derivative` companion pointing at it, i.e. it is some other
/// variable's lower-order link), step it forward by the configured
/// integrator.
///
/// The integrator's `derivative` callback re-evaluates the governing
/// equation at a perturbed value of the base variable so RK4's
/// half-step/full-step stages see a freshly computed
/// sample rather than the stale one from the prior tick's `update()`.
/// The callback temporarily overwrites `self.<base>`, evaluates the
/// derivative's own multiconditional, reads the result, then restores
/// `self.<base>` — a self-contained approximation of a full
/// snapshot/restore/push-derivative protocol that covers the common
/// case of a derivative depending only on the variable it integrates; a
/// derivative that reads a *different* integrated variable of the same
/// part sees that variable's value as of the start of the step, not
/// re-perturbed in lockstep (documented in DESIGN.md).
pub fn emit_integrate(part: &EquationSet) -> Result<String, EmitError> {
    let mut out = String::new();
    for var in &part.variables {
        let Some(base_idx) = var.derivative else { continue };
        let base_field = resolve::field_name(&part.variables[base_idx].name);
        let deriv_field = resolve::field_name(&var.name);
        let deriv_body = multiconditional::render_assignment(var, &format!("self.{deriv_field}"), |e| expr::translate(e, part));
        out.push_str(&format!(
            "    {{\n        let saved = self.{base_field};\n        self.{base_field} = integrator.step(saved, dt, &mut |perturbed: f64| {{\n            self.{base_field} = perturbed;\n            {deriv_body}\n            self.{base_field} = saved;\n            self.{deriv_field}\n        }});\n    }}\n"
        ));
    }
    Ok(out)
}

/// Render the `finalize` method body: reset every combined variable's
/// buffer to its [`crate::ast::CombinerIdentity`] after the `next_` value
/// is swapped in, then report whether this instance should survive the
/// tick. A part with a `$p` variable dies (returns `false`) once `$p`
/// evaluates non-positive ("lethal_p" per `splits.rs`); everything else
/// always survives its own finalize (death from a `$type` split or a
/// container's own `$p` is driven by the owning `Population`, not here).
pub fn emit_finalize(part: &EquationSet) -> String {
    let backend = backend(part);
    let mut out = String::new();
    for var in &part.variables {
        if !var.is_combined() || var.has_attr(crate::ast::ATTR_TEMPORARY) {
            continue;
        }
        let field = resolve::field_name(&var.name);
        let identity = match var.assignment.identity() {
            crate::ast::CombinerIdentity::Zero => "0.0",
            crate::ast::CombinerIdentity::One => "1.0",
            crate::ast::CombinerIdentity::PositiveInfinity => "f64::INFINITY",
            crate::ast::CombinerIdentity::NegativeInfinity => "f64::NEG_INFINITY",
            crate::ast::CombinerIdentity::None => "Default::default()",
        };
        out.push_str(&format!("    self.{field} = self.next_{field};\n    self.next_{field} = {identity};\n"));
    }
    if backend.lethal_p && part.find_variable("$p").is_some() {
        out.push_str("    if self.dollar_p <= 0.0 {\n        return false;\n    }\n");
    }
    out.push_str("    true\n");
    out
}

/// `ctor`/`dtor`/`clear`/`die`/`enter_simulation`/`leave_simulation`/
/// `is_free`: the construction-adjacent lifecycle Rust's own `Default`
/// doesn't cover. `ctor` also sizes the per-instance event/Runge-Kutta
/// buffers to this part's actual event-source and integrated-variable
/// counts, both known statically from `BackendData` at emission time.
pub fn emit_basic_lifecycle(part: &EquationSet) -> String {
    let backend = backend(part);
    let events = backend.event_sources.len();
    let integrated = integrated_pairs(part).len();
    format!(
        "    pub fn ctor(&mut self) {{\n        self.event_prev.resize({events}, 0.0);\n        self.rk_last.resize({integrated}, 0.0);\n        self.rk_accum.resize({integrated}, 0.0);\n    }}\n\n    pub fn dtor(&mut self) {{}}\n\n    pub fn clear(&mut self) {{\n        *self = Self::default();\n    }}\n\n    pub fn die(&mut self) {{\n        self.dead = true;\n    }}\n\n    pub fn is_free(&self) -> bool {{\n        self.dead\n    }}\n\n    pub fn enter_simulation(&mut self) {{}}\n\n    pub fn leave_simulation(&mut self) {{}}\n"
    )
}

/// `snapshot`/`restore`/`push_derivative`/`multiply_add_to_stack`/
/// `multiply`/`add_to_members`/`update_derivative`/`finalize_derivative`:
/// the Runge-Kutta weighted-sum protocol a population-level driver could
/// use to perform a fully coupled multi-variable step (see DESIGN.md for
/// why `integrate` itself uses a simpler per-variable approximation
/// instead). `push_derivative` samples every integrated variable's
/// current derivative value; `multiply_add_to_stack`/`multiply` fold a
/// weighted sum of those samples into a per-variable accumulator;
/// `add_to_members` applies the accumulated increment and resets it.
pub fn emit_derivative_stack(part: &EquationSet) -> String {
    let pairs = integrated_pairs(part);
    let mut out = String::new();

    out.push_str("    pub fn update_derivative(&mut self) {\n");
    for var in &part.variables {
        if var.derivative.is_none() {
            continue;
        }
        let field = resolve::field_name(&var.name);
        let rendered = multiconditional::render_assignment(var, &format!("self.{field}"), |e| expr::translate(e, part));
        if !rendered.is_empty() {
            out.push_str("        ");
            out.push_str(&rendered);
            out.push('\n');
        }
    }
    out.push_str("    }\n\n");
    out.push_str("    pub fn finalize_derivative(&mut self) {}\n\n");

    out.push_str("    pub fn snapshot(&mut self) {\n");
    for (base, _) in &pairs {
        out.push_str(&format!("        self.snapshot_stack.push(self.{base});\n"));
    }
    out.push_str("    }\n\n");

    out.push_str("    pub fn restore(&mut self) {\n");
    for (base, _) in pairs.iter().rev() {
        out.push_str(&format!("        self.{base} = self.snapshot_stack.pop().unwrap_or(self.{base});\n"));
    }
    out.push_str("    }\n\n");

    out.push_str("    pub fn push_derivative(&mut self) {\n        self.update_derivative();\n        self.rk_last = vec![");
    for (_, deriv) in &pairs {
        out.push_str(&format!("self.{deriv}, "));
    }
    out.push_str("];\n    }\n\n");

    out.push_str(
        "    pub fn multiply_add_to_stack(&mut self, scale: f64) {\n        for (acc, d) in self.rk_accum.iter_mut().zip(self.rk_last.iter()) {\n            *acc += scale * d;\n        }\n    }\n\n",
    );
    out.push_str("    pub fn multiply(&mut self, scale: f64) {\n        for acc in self.rk_accum.iter_mut() {\n            *acc *= scale;\n        }\n    }\n\n");

    out.push_str("    pub fn add_to_members(&mut self) {\n");
    for (i, (base, _)) in pairs.iter().enumerate() {
        out.push_str(&format!("        self.{base} += self.rk_accum.get({i}).copied().unwrap_or(0.0);\n"));
    }
    out.push_str("        for acc in self.rk_accum.iter_mut() {\n            *acc = 0.0;\n        }\n    }\n");

    out
}

/// `get_live`/`get_p`/`get_xyz`/`get_project`: connection-formation
/// accessors. `$live`/`$p` read the already-digested synthesized
/// variable directly (see `digest::liveness`) rather than a separate bit
/// flag; `$x`/`$y`/`$z` feed `get_xyz` when all three are declared,
/// otherwise it reports the origin (no spatial structure to report).
pub fn emit_connection_formation_accessors(part: &EquationSet) -> String {
    let live_expr = if part.find_variable("$live").is_some() { "self.dollar_live != 0.0" } else { "true" }.to_string();
    let p_expr = if part.find_variable("$p").is_some() { "self.dollar_p" } else { "1.0" }.to_string();
    let has_xyz = ["$x", "$y", "$z"].iter().all(|n| part.find_variable(n).is_some());
    let xyz_body = if has_xyz {
        "crate::connection_planner::Point3 { x: self.dollar_x, y: self.dollar_y, z: self.dollar_z }".to_string()
    } else {
        "crate::connection_planner::Point3 { x: 0.0, y: 0.0, z: 0.0 }".to_string()
    };

    format!(
        "    pub fn get_live(&self) -> bool {{\n        !self.dead && {live_expr}\n    }}\n\n    pub fn get_p(&self) -> f64 {{\n        {p_expr}\n    }}\n\n    pub fn get_xyz(&self) -> crate::connection_planner::Point3 {{\n        {xyz_body}\n    }}\n\n    pub fn get_project(&self, other: crate::connection_planner::Point3) -> crate::connection_planner::Point3 {{\n        other\n    }}\n\n    pub fn get_newborn(&self) -> bool {{\n        self.newborn\n    }}\n"
    )
}

/// One `set_part_{alias}`/`get_part_{alias}` pair per connection-endpoint
/// binding, typed to that endpoint's concrete instance type. The Instance
/// Protocol's `setPart`/`getPart` are written against a single `usize`
/// slot index because every endpoint in the reference protocol shares one
/// erased representation; this crate's endpoint fields are instead
/// concretely typed (`Rc<RefCell<{Endpoint}Instance>>`, required so
/// `expr.rs`'s `self.<alias>.borrow().field` rendering type-checks), so a
/// single generically-indexed method can't exist without type erasure.
/// Per-alias methods are the natural Rust shape for the same contract
/// (documented as a deliberate deviation in DESIGN.md).
pub fn emit_connection_endpoint_accessors(part: &EquationSet) -> String {
    let mut out = String::new();
    for binding in &part.connection_bindings {
        let field = resolve::field_name(&binding.alias);
        let endpoint_ty = format!("{}Instance", binding.endpoint);
        out.push_str(&format!(
            "    pub fn set_part_{field}(&mut self, endpoint: std::rc::Rc<std::cell::RefCell<{endpoint_ty}>>) {{\n        self.{field} = endpoint;\n    }}\n\n    pub fn get_part_{field}(&self) -> std::rc::Rc<std::cell::RefCell<{endpoint_ty}>> {{\n        std::rc::Rc::clone(&self.{field})\n    }}\n\n"
        ));
    }
    out
}

/// `map_index`: only emitted for a connection whose nonzero pattern comes
/// from a driving matrix variable (`connection_matrix::run`'s output);
/// translates a (row, col) nonzero coordinate into the bound endpoint
/// index pair using the model's own row/column mapping expressions.
pub fn emit_map_index(part: &EquationSet) -> String {
    let Some(matrix) = &part.connection_matrix else { return String::new() };
    let row = expr::translate(&matrix.row_mapping, part);
    let col = expr::translate(&matrix.column_mapping, part);
    format!("    pub fn map_index(&self, row: usize, col: usize) -> (usize, usize) {{\n        ({row} as usize, {col} as usize)\n    }}\n")
}

/// `event_test`/`event_delay`/`set_latch`/`finalize_event`: edge
/// detection over every `BackendData::event_sources` entry, comparing
/// this tick's value against the one `event_prev` recorded last tick (the
/// truth table is [`crate::digest::TriggerEdge::fires`]'s, inlined here
/// rather than referenced from emitted code so the generated crate
/// doesn't need to link against the digest pipeline's internal types at
/// run time).
pub fn emit_event_methods(part: &EquationSet) -> String {
    let backend = backend(part);
    let mut out = String::new();

    out.push_str("    pub fn event_test(&mut self) -> Option<usize> {\n        let mut fired = None;\n");
    for (i, source) in backend.event_sources.iter().enumerate() {
        let field = resolve::field_name(&source.variable);
        let condition = match source.edge {
            crate::digest::TriggerEdge::Rising => "before == 0.0 && after != 0.0",
            crate::digest::TriggerEdge::Falling => "before != 0.0 && after == 0.0",
            crate::digest::TriggerEdge::Change => "before != after",
            crate::digest::TriggerEdge::Nonzero => "after != 0.0",
        };
        out.push_str(&format!(
            "        {{\n            let before = self.event_prev[{i}];\n            let after = self.{field};\n            if fired.is_none() && {condition} {{\n                fired = Some({i});\n            }}\n            self.event_prev[{i}] = after;\n        }}\n"
        ));
    }
    out.push_str("        fired\n    }\n\n");

    let delay_body = backend
        .event_targets
        .iter()
        .find_map(|t| t.delay.as_ref())
        .map(|delay| match crate::value::parse_numeric_literal(delay) {
            Some(literal) => format!("Some({literal})"),
            None => format!("Some({})", expr::translate(delay, part)),
        })
        .unwrap_or_else(|| "None".to_string());
    out.push_str(&format!("    pub fn event_delay(&self) -> Option<f64> {{\n        {delay_body}\n    }}\n\n"));

    out.push_str("    pub fn set_latch(&mut self, value: bool) {\n        self.latch = value;\n    }\n\n");
    out.push_str("    pub fn finalize_event(&mut self) {\n        self.latch = false;\n    }\n");
    out
}

/// `get_count`/`path`: diagnostics. `get_count` has no per-tick
/// combined-write counter wired up (nothing in `BackendData` tracks it),
/// so it conservatively reports `1`, matching the trait's own default;
/// `path` walks the `container` chain when one exists.
pub fn emit_diagnostics(part: &EquationSet, container_type: Option<&str>) -> String {
    let path_body = if container_type.is_some() {
        format!("format!(\"{{}}.{}\", self.container.borrow().path())", part.name)
    } else {
        format!("\"{}\".to_string()", part.name)
    };
    format!("    pub fn get_count(&self) -> usize {{\n        1\n    }}\n\n    pub fn path(&self) -> String {{\n        {path_body}\n    }}\n")
}

/// `from_2_to`: one emitted variant per `$type` split target
/// (`BackendData::splits`), wrapped in a generated `{Part}Split` enum
/// since each target is a distinct concrete Rust type. Empty when the
/// part has no `$type` splits.
pub fn emit_split_enum(part: &EquationSet) -> String {
    let backend = backend(part);
    if backend.splits.is_empty() {
        return String::new();
    }
    let mut out = format!("#[derive(Debug, Clone)]\npub enum {}Split {{\n", part.name);
    for target in &backend.splits {
        out.push_str(&format!("    {target}({target}Instance),\n"));
    }
    out.push_str("}\n\n");
    out
}

pub fn emit_from_2_to(part: &EquationSet) -> String {
    let backend = backend(part);
    if backend.splits.is_empty() {
        return String::new();
    }
    let mut out = format!("    pub fn from_2_to(&self, target: usize) -> Option<{}Split> {{\n        match target {{\n", part.name);
    for (i, name) in backend.splits.iter().enumerate() {
        out.push_str(&format!("            {i} => Some({}Split::{name}({name}Instance::default())),\n", part.name));
    }
    out.push_str("            _ => None,\n        }\n    }\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, Variable};

    #[test]
    fn emits_one_field_per_persistent_variable() {
        let mut part = EquationSet::new("Leaky");
        part.variables.push(Variable::new("x"));
        let fields = emit_fields(&part, None);
        assert!(fields.contains("pub x: f64"));
    }

    #[test]
    fn combined_variables_get_a_next_shadow_field() {
        let mut part = EquationSet::new("Pool");
        let mut total = Variable::new("total");
        total.assignment = Assignment::Add;
        part.variables.push(total);
        let fields = emit_fields(&part, None);
        assert!(fields.contains("next_total"));
    }

    #[test]
    fn connection_bindings_get_a_borrowable_endpoint_field() {
        let mut part = EquationSet::new("Synapse");
        part.connection_bindings.push(crate::ast::ConnectionBinding {
            alias: "A".into(),
            endpoint: "Neuron".into(),
            index: 0,
            resolution: crate::ast::VariableReference::unresolved("A"),
        });
        let fields = emit_fields(&part, None);
        assert!(fields.contains("pub A: std::rc::Rc<std::cell::RefCell<NeuronInstance>>"));
    }

    #[test]
    fn container_field_is_emitted_when_a_container_type_is_given() {
        let part = EquationSet::new("Sub");
        let fields = emit_fields(&part, Some("Parent"));
        assert!(fields.contains("pub container: std::rc::Rc<std::cell::RefCell<ParentInstance>>"));
    }

    #[test]
    fn integrate_re_evaluates_the_derivative_inside_the_integrator_closure() {
        let mut part = EquationSet::new("Leaky");
        let mut x = Variable::new("x");
        x.equations.push(Equation::default_arm("0"));
        part.variables.push(x);
        let mut x_tick = Variable::new("x'");
        x_tick.derivative = Some(0);
        x_tick.equations.push(Equation::default_arm("-x"));
        part.variables.push(x_tick);

        let rendered = emit_integrate(&part).unwrap();
        assert!(rendered.contains("integrator.step(saved, dt, &mut |perturbed: f64|"));
        assert!(rendered.contains("self.x = perturbed;"));
        assert!(rendered.contains("self.x_tick = -(self.x);"));
        assert!(rendered.contains("self.x = saved;"));
    }

    #[test]
    fn finalize_resets_add_combined_variable_to_zero() {
        let mut part = EquationSet::new("Pool");
        let mut total = Variable::new("total");
        total.assignment = Assignment::Add;
        total.equations.push(Equation::default_arm("0"));
        part.variables.push(total);
        let rendered = emit_finalize(&part);
        assert!(rendered.contains("next_total = 0.0"));
        assert!(rendered.trim_end().ends_with("true"));
    }

    #[test]
    fn finalize_returns_false_when_dollar_p_is_lethal_and_nonpositive() {
        let mut part = EquationSet::new("Cell");
        let mut p = Variable::new("$p");
        p.equations.push(Equation::default_arm("0"));
        part.variables.push(p);
        part.backend_data = Some(BackendData { lethal_p: true, ..Default::default() });
        let rendered = emit_finalize(&part);
        assert!(rendered.contains("if self.dollar_p <= 0.0"));
    }

    #[test]
    fn update_accumulates_combined_variables_via_their_combiner() {
        let mut part = EquationSet::new("Pool");
        let mut total = Variable::new("total");
        total.assignment = Assignment::Add;
        total.equations.push(Equation::default_arm("1"));
        part.variables.push(total);
        let rendered = emit_update(&part);
        assert!(rendered.contains("self.next_total += 1;"));
    }

    #[test]
    fn update_skips_derivative_and_init_only_variables() {
        let mut part = EquationSet::new("Leaky");
        let mut x = Variable::new("x");
        x.equations.push(Equation::default_arm("0"));
        part.variables.push(x);
        let mut x_tick = Variable::new("x'");
        x_tick.derivative = Some(0);
        x_tick.equations.push(Equation::default_arm("-x"));
        part.variables.push(x_tick);
        let mut once = Variable::new("once");
        once.set_attr(crate::ast::ATTR_INIT_ONLY);
        once.equations.push(Equation::default_arm("1"));
        part.variables.push(once);

        let rendered = emit_update(&part);
        assert!(!rendered.contains("x_tick"));
        assert!(!rendered.contains("self.once"));
    }

    #[test]
    fn get_live_reads_the_synthesized_dollar_live_field_when_present() {
        let mut part = EquationSet::new("Synapse");
        part.variables.push(Variable::new("$live"));
        let rendered = emit_connection_formation_accessors(&part);
        assert!(rendered.contains("self.dollar_live != 0.0"));
    }

    #[test]
    fn get_p_defaults_to_one_without_a_dollar_p_variable() {
        let part = EquationSet::new("Cell");
        let rendered = emit_connection_formation_accessors(&part);
        assert!(rendered.contains("fn get_p(&self) -> f64 {\n        1.0"));
    }

    #[test]
    fn split_enum_and_from_2_to_cover_every_type_target() {
        let mut part = EquationSet::new("Cell");
        part.backend_data = Some(BackendData { splits: vec!["DaughterA".to_string(), "DaughterB".to_string()], ..Default::default() });
        let enum_text = emit_split_enum(&part);
        assert!(enum_text.contains("pub enum CellSplit"));
        assert!(enum_text.contains("DaughterA(DaughterAInstance)"));
        let method = emit_from_2_to(&part);
        assert!(method.contains("0 => Some(CellSplit::DaughterA(DaughterAInstance::default()))"));
    }

    #[test]
    fn event_test_inlines_the_rising_edge_truth_table() {
        let mut part = EquationSet::new("Neuron");
        let mut spike = Variable::new("fire");
        spike.equations.push(Equation::conditional("V > 0", "1"));
        part.variables.push(spike);
        part.backend_data = Some(BackendData {
            event_sources: vec![crate::digest::EventSource { variable: "fire".to_string(), edge: crate::digest::TriggerEdge::Rising }],
            ..Default::default()
        });
        let rendered = emit_event_methods(&part);
        assert!(rendered.contains("before == 0.0 && after != 0.0"));
    }
}
