//! Stage 8 ([`order_parts`]) and stage 14 ([`order_variables`]): topological
//! orderings the code generator emits in directly, so `Instance::init` and
//! `Instance::update` never read a value before it is written within the
//! same cycle.
//!
//! Dependencies between variables are discovered the coarse way: a
//! variable `a` depends on `b` if `b`'s name appears as a whole word in
//! any of `a`'s equation expressions or conditions — a textual dependency
//! scan that builds a graph topologically sorted into evaluation order.

use crate::ast::Model;
use crate::error::{DigestError, DigestErrorKind};
use std::collections::{HashSet, VecDeque};

fn mentions(expression: &str, name: &str) -> bool {
    expression
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '$' || c == '.'))
        .any(|tok| tok == name)
}

/// Stage 14: order a single part's `variables` so producers precede
/// consumers, marking any cycle participant [`crate::ast::ATTR_CYCLE`]
/// rather than failing (a cycle through a derivative is legal:
/// integrated variables feed back via the integrator, not same-cycle
/// read-after-write).
fn order_one(part: &mut crate::ast::EquationSet) {
    let n = part.variables.len();
    let mut deps: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let producer_name = part.variables[j].name.clone();
            let depends = part.variables[i]
                .equations
                .iter()
                .any(|eq| mentions(&eq.expression, &producer_name) || eq.condition.as_deref().is_some_and(|c| mentions(c, &producer_name)));
            if depends && part.variables[j].derivative != Some(i) {
                deps[i].insert(j);
            }
        }
    }

    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, set) in deps.iter().enumerate() {
        indegree[i] = set.len();
        for &j in set {
            dependents[j].push(i);
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    while let Some(i) = queue.pop_front() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        order.push(i);
        for &d in &dependents[i] {
            indegree[d] = indegree[d].saturating_sub(1);
            if indegree[d] == 0 {
                queue.push_back(d);
            }
        }
    }
    // Anything left unvisited sits on a dependency cycle; append in
    // original order and flag it rather than deadlock the sort.
    for i in 0..n {
        if !visited[i] {
            part.variables[i].set_attr(crate::ast::ATTR_CYCLE);
            order.push(i);
        }
    }
    part.ordered = order;
}

pub fn order_variables(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        order_one(part);
    }
    Ok(())
}

/// Stage 8: order each part's `parts` children bottom-up — connections
/// last within a level, since connection formation reads populated
/// endpoint state ("connection formation... reads population
/// membership").
pub fn order_parts(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for idx in 0..model.parts.len() {
        let mut children = model.parts[idx].parts.clone();
        children.sort_by_key(|&c| model.parts[c].is_connection());
        model.parts[idx].ordered_parts = children;
    }
    // Defensive: every part index referenced must exist.
    let mut errors = Vec::new();
    for part in &model.parts {
        for &child in &part.ordered_parts {
            if child >= model.parts.len() {
                errors.push(DigestError::new(
                    DigestErrorKind::UnresolvedReference,
                    crate::error::NodePath::root(),
                    "ordered_parts references an out-of-range part index",
                ));
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn orders_producer_before_consumer() {
        let mut set = EquationSet::new("Leaky");
        let mut y = Variable::new("y");
        y.equations.push(Equation::default_arm("x + 1"));
        let mut x = Variable::new("x");
        x.equations.push(Equation::default_arm("1"));
        set.variables.push(y);
        set.variables.push(x);
        let mut model = Model::new(set);

        order_variables(&mut model).unwrap();
        let part = model.part(model.root);
        let x_pos = part.ordered.iter().position(|&i| part.variables[i].name == "x").unwrap();
        let y_pos = part.ordered.iter().position(|&i| part.variables[i].name == "y").unwrap();
        assert!(x_pos < y_pos);
    }

    #[test]
    fn connections_sort_after_compartments_at_the_same_level() {
        let mut model = Model::new(EquationSet::new("Root"));
        let mut synapse = EquationSet::new("Synapse");
        synapse.connection_bindings.push(crate::ast::ConnectionBinding {
            alias: "A".into(),
            endpoint: "Neuron".into(),
            index: 0,
            resolution: crate::ast::VariableReference::unresolved(""),
        });
        let conn = model.add_part(model.root, synapse);
        let compartment = model.add_part(model.root, EquationSet::new("Neuron"));

        order_parts(&mut model).unwrap();
        let ordered = &model.part(model.root).ordered_parts;
        let conn_pos = ordered.iter().position(|&i| i == conn).unwrap();
        let compartment_pos = ordered.iter().position(|&i| i == compartment).unwrap();
        assert!(compartment_pos < conn_pos);
    }
}
