//! Emits the `Population` struct for a part: the `Vec<Instance>`
//! container, [`crate::runtime::population::Membership`]-backed slot
//! management, and the full Population Protocol surface (`create`/`add`/
//! `remove`/`resize`/`getN`, the population-level equation quartet
//! fanning out to every live instance, the Runge-Kutta stack fan-out,
//! `clearNew`, and — for connection parts — `getIterators`/`getIterator`).

use crate::ast::EquationSet;
use crate::code_generator::resolve;
use crate::digest::BackendData;

/// Render the population's field list: the membership tracker every
/// population carries, one field per variable
/// [`BackendData::population_scoped`] marks `true` (shared across every
/// instance, e.g. connection-matching accumulators), and — for a
/// connection part — one `Rc<RefCell<{Endpoint}Population>>` per bound
/// endpoint alias, so `get_iterators` can read each endpoint's live size.
pub fn emit_population_fields(part: &EquationSet, backend: &BackendData) -> String {
    let mut out = String::new();
    out.push_str("    pub membership: crate::runtime::population::Membership,\n");
    for binding in &part.connection_bindings {
        let field = resolve::field_name(&binding.alias);
        out.push_str(&format!("    pub {field}: std::rc::Rc<std::cell::RefCell<{}Population>>,\n", binding.endpoint));
    }
    for (&idx, &scoped) in &backend.population_scoped {
        if !scoped {
            continue;
        }
        let field = resolve::field_name(&part.variables[idx].name);
        out.push_str(&format!("    pub {field}: f64,\n"));
    }
    out
}

/// `ctor`/`dtor`: construction-adjacent lifecycle `Default` doesn't cover.
pub fn emit_basic_lifecycle() -> String {
    "    pub fn ctor(&mut self) {}\n\n    pub fn dtor(&mut self) {}\n".to_string()
}

/// Render `create`: acquire a `$index` slot from [`Membership`], construct
/// and `ctor` a fresh instance there, mark it newborn, run its `init`, and
/// report the slot.
///
/// A `singleton` part (`$n` fixed at exactly one member — no `N` equation
/// ever grows it) still carries the same `Vec`/`Membership` machinery as
/// every other population, but `create` refuses to mint a second slot: a
/// repeated `create` call is a no-op that hands back the existing
/// instance's index rather than growing past one.
///
/// [`Membership`]: crate::runtime::population::Membership
pub fn emit_create(part_name: &str, singleton: bool) -> String {
    let guard = if singleton { "        if self.membership.n() >= 1 {\n            return 0;\n        }\n" } else { "" };
    format!(
        "    pub fn create(&mut self) -> usize {{\n{guard}        let index = self.membership.acquire();\n        let mut instance = {part_name}Instance::default();\n        instance.index = index;\n        instance.ctor();\n        instance.newborn = true;\n        instance.init();\n        if index == self.instances.len() {{\n            self.instances.push(instance);\n        }} else {{\n            self.instances[index] = instance;\n        }}\n        index\n    }}\n"
    )
}

/// Render `add`: same as `create`, but matches the Instance Protocol's
/// `add` naming for a caller that already has a constructed index in
/// hand (e.g. one driven by `$n` directly rather than `create`'s own
/// bookkeeping). Delegates to `create` — the two only differ in the
/// protocol's naming, not in behavior.
pub fn emit_add() -> String {
    "    pub fn add(&mut self) -> usize {\n        self.create()\n    }\n".to_string()
}

/// Render `remove`: run the instance's own `die`, release its slot back
/// to the free pool, so a later `create` can reuse the index.
pub fn emit_remove() -> String {
    "    pub fn remove(&mut self, index: usize) {\n        if let Some(instance) = self.instances.get_mut(index) {\n            instance.die();\n        }\n        self.membership.release(index);\n    }\n".to_string()
}

/// Render `resize`: drive [`Membership::resize_plan`] — growing calls
/// `create` the needed number of times, shrinking calls `remove` on the
/// plan's oldest-occupied-first victim list, never a bare
/// `Vec::pop`/`swap_remove` that would instead discard the
/// newest-created instances.
///
/// A `singleton` part clamps its target to at most one member before
/// consulting the plan, so it can never be resized away from its fixed
/// population size of one.
///
/// [`Membership::resize_plan`]: crate::runtime::population::Membership::resize_plan
pub fn emit_resize(singleton: bool) -> String {
    let target_expr = if singleton { "target.min(1)" } else { "target" };
    format!(
        "    pub fn resize(&mut self, target: usize) {{\n        let target = {target_expr};\n        match self.membership.resize_plan(target) {{\n            crate::runtime::population::ResizePlan::Noop => {{}}\n            crate::runtime::population::ResizePlan::Grow(n) => {{\n                for _ in 0..n {{\n                    self.create();\n                }}\n            }}\n            crate::runtime::population::ResizePlan::Die(victims) => {{\n                for v in victims {{\n                    self.remove(v);\n                }}\n            }}\n        }}\n    }}\n"
    )
}

/// Render `get_n`/`track_n`: the live instance count `$n`-referencing
/// expressions elsewhere in the model read. `track_n` is kept as an
/// alias of `get_n` for callers written against the older name.
pub fn emit_get_n() -> String {
    "    pub fn get_n(&self) -> usize {\n        self.membership.n()\n    }\n\n    pub fn track_n(&self) -> usize {\n        self.get_n()\n    }\n".to_string()
}

/// Render the population-level equation quartet: fan out over every
/// occupied slot. `finalize` collects the indices whose instance-level
/// `finalize` reports death and removes them — a part's own `$p` (see
/// `Instance::finalize`) is the only per-instance death source this
/// fan-out need drive, since container- and connection-triggered death
/// are decided by the owning population one level up, not by the dying
/// instance itself.
pub fn emit_population_quartet() -> String {
    "    pub fn init(&mut self) {\n        for (i, instance) in self.instances.iter_mut().enumerate() {\n            if self.membership.is_occupied(i) {\n                instance.init();\n            }\n        }\n    }\n\n    pub fn integrate(&mut self, integrator: &dyn crate::runtime::integrator::Integrator, dt: f64) {\n        for (i, instance) in self.instances.iter_mut().enumerate() {\n            if self.membership.is_occupied(i) {\n                instance.integrate(integrator, dt);\n            }\n        }\n    }\n\n    pub fn update(&mut self) {\n        for (i, instance) in self.instances.iter_mut().enumerate() {\n            if self.membership.is_occupied(i) {\n                instance.update();\n            }\n        }\n    }\n\n    pub fn finalize(&mut self) {\n        let mut dead = Vec::new();\n        for (i, instance) in self.instances.iter_mut().enumerate() {\n            if self.membership.is_occupied(i) && !instance.finalize() {\n                dead.push(i);\n            }\n        }\n        for i in dead {\n            self.remove(i);\n        }\n    }\n".to_string()
}

/// Render the Runge-Kutta stack fan-out (`updateDerivative`/
/// `finalizeDerivative`/`snapshot`/`restore`/`pushDerivative`/
/// `multiplyAddToStack`/`multiply`/`addToMembers`): each is a direct
/// per-instance broadcast of the identically-named `Instance` method.
pub fn emit_derivative_stack_fanout() -> String {
    let mut out = String::new();
    out.push_str("    pub fn update_derivative(&mut self) {\n        for instance in &mut self.instances {\n            instance.update_derivative();\n        }\n    }\n\n");
    out.push_str("    pub fn finalize_derivative(&mut self) {\n        for instance in &mut self.instances {\n            instance.finalize_derivative();\n        }\n    }\n\n");
    out.push_str("    pub fn snapshot(&mut self) {\n        for instance in &mut self.instances {\n            instance.snapshot();\n        }\n    }\n\n");
    out.push_str("    pub fn restore(&mut self) {\n        for instance in &mut self.instances {\n            instance.restore();\n        }\n    }\n\n");
    out.push_str("    pub fn push_derivative(&mut self) {\n        for instance in &mut self.instances {\n            instance.push_derivative();\n        }\n    }\n\n");
    out.push_str(
        "    pub fn multiply_add_to_stack(&mut self, scale: f64) {\n        for instance in &mut self.instances {\n            instance.multiply_add_to_stack(scale);\n        }\n    }\n\n",
    );
    out.push_str("    pub fn multiply(&mut self, scale: f64) {\n        for instance in &mut self.instances {\n            instance.multiply(scale);\n        }\n    }\n\n");
    out.push_str("    pub fn add_to_members(&mut self) {\n        for instance in &mut self.instances {\n            instance.add_to_members();\n        }\n    }\n");
    out
}

/// Render `clear_new`: advance [`Membership`]'s newborn boundary and reset
/// every still-live instance's own `newborn` flag to match — `get_newborn`
/// on the `Instance` side and `Membership::is_newborn` on the population
/// side would otherwise drift apart after the boundary moves.
///
/// [`Membership`]: crate::runtime::population::Membership
pub fn emit_clear_new() -> String {
    "    pub fn clear_new(&mut self) {\n        self.membership.clear_new();\n        for instance in &mut self.instances {\n            instance.newborn = false;\n        }\n    }\n".to_string()
}

/// Render `get_iterators`/`get_iterator`, the connection-formation entry
/// points — emitted only for a connection part. `strategy` is baked in as
/// a Rust literal from the strategy [`crate::connection_planner::plan`]
/// already chose for this part at emission time (static per model, so
/// there's no need to re-derive it at run time); `get_iterators` reads
/// each bound endpoint's current `get_n`/`membership` state and hands both
/// to the previously-dead [`crate::runtime::connect::ConnectIterator::from_strategy`].
pub fn emit_get_iterators(part: &EquationSet, strategy: &crate::connection_planner::Strategy) -> String {
    if !part.is_connection() {
        return String::new();
    }
    let strategy_literal = strategy_literal(strategy);
    let mut sizes = String::new();
    for binding in &part.connection_bindings {
        let field = resolve::field_name(&binding.alias);
        sizes.push_str(&format!("self.{field}.borrow().get_n(), "));
    }
    let mut out = format!(
        "    pub fn get_iterators(&self) -> Option<crate::runtime::connect::ConnectIterator<'static>> {{\n        let strategy = {strategy_literal};\n        let sizes = [{sizes}];\n        crate::runtime::connect::ConnectIterator::from_strategy(&strategy, &sizes)\n    }}\n\n"
    );
    for binding in &part.connection_bindings {
        let field = resolve::field_name(&binding.alias);
        out.push_str(&format!(
            "    pub fn get_iterator_{field}(&self) -> std::rc::Rc<std::cell::RefCell<{}Population>> {{\n        std::rc::Rc::clone(&self.{field})\n    }}\n\n",
            binding.endpoint
        ));
    }
    out
}

fn strategy_literal(strategy: &crate::connection_planner::Strategy) -> String {
    match strategy {
        crate::connection_planner::Strategy::Enumerative => "crate::connection_planner::Strategy::Enumerative".to_string(),
        crate::connection_planner::Strategy::NearestNeighbor { k, radius } => {
            let k_lit = match k {
                Some(v) => format!("Some({v})"),
                None => "None".to_string(),
            };
            let radius_lit = match radius {
                Some(v) => format!("Some({v}f64)"),
                None => "None".to_string(),
            };
            format!("crate::connection_planner::Strategy::NearestNeighbor {{ k: {k_lit}, radius: {radius_lit} }}")
        }
        crate::connection_planner::Strategy::SparseMatrix(plan) => format!(
            "crate::connection_planner::Strategy::SparseMatrix(crate::connection_planner::SparseMatrixPlan {{ variable: {:?}.to_string(), row_mapping: {:?}.to_string(), column_mapping: {:?}.to_string() }})",
            plan.variable, plan.row_mapping, plan.column_mapping
        ),
    }
}

/// Render `path`: the population's own diagnostic label, a part name with
/// no instance index (every instance's own `path` carries that).
pub fn emit_path(part: &EquationSet) -> String {
    format!("    pub fn path(&self) -> String {{\n        \"{}\".to_string()\n    }}\n", part.name)
}
