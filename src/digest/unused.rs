//! Stage 12: remove unused variables.
//!
//! Computes a liveness fixed point over the whole model (cross-part,
//! since a reference in one part can keep a variable alive in another)
//! and deletes every variable that is neither referenced nor inherently
//! significant (a special, an accessor, externally read/written, or part
//! of a derivative chain whose base or derivative survives) — ordinary
//! dead-code elimination applied to equation variables instead of
//! instructions.

use crate::ast::Model;
use crate::error::DigestError;

fn is_inherently_live(var: &crate::ast::Variable) -> bool {
    var.name.starts_with('$')
        || var.has_attr(crate::ast::ATTR_ACCESSOR)
        || var.has_attr(crate::ast::ATTR_EXTERNAL_READ)
        || var.has_attr(crate::ast::ATTR_EXTERNAL_WRITE)
        || var.has_attr(crate::ast::ATTR_CLI)
        || var.has_attr(crate::ast::ATTR_REFERENCE)
}

fn mentions(expression: &str, name: &str) -> bool {
    expression
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '$' || c == '.'))
        .any(|tok| tok == name)
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    // live[part_idx] is a per-variable-index bitset into that part's
    // (pre-removal) variable list.
    let mut live: Vec<Vec<bool>> = model.parts.iter().map(|p| vec![false; p.variables.len()]).collect();

    for (pi, part) in model.parts.iter().enumerate() {
        for (vi, var) in part.variables.iter().enumerate() {
            if is_inherently_live(var) {
                live[pi][vi] = true;
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for pi in 0..model.parts.len() {
            let part = &model.parts[pi];
            for vi in 0..part.variables.len() {
                if !live[pi][vi] {
                    continue;
                }
                if let Some(d) = part.variables[vi].derivative {
                    if !live[pi][d] {
                        live[pi][d] = true;
                        changed = true;
                    }
                }
            }
            for consumer in 0..part.variables.len() {
                if live[pi][consumer] {
                    continue;
                }
                let uses_a_live_var = part.variables[consumer].equations.iter().any(|eq| {
                    part.variables
                        .iter()
                        .enumerate()
                        .any(|(producer, v)| live[pi][producer] && (mentions(&eq.expression, &v.name) || eq.condition.as_deref().is_some_and(|c| mentions(c, &v.name))))
                });
                if uses_a_live_var {
                    live[pi][consumer] = true;
                    changed = true;
                }
            }
        }
    }

    for (pi, part) in model.parts.iter_mut().enumerate() {
        let keep = live[pi].clone();
        let mut i = 0;
        part.variables.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn removes_a_variable_nothing_reads() {
        let mut set = EquationSet::new("Leaky");
        let mut used = Variable::new("x");
        used.set_attr(crate::ast::ATTR_ACCESSOR);
        used.equations.push(Equation::default_arm("1"));
        let mut dead = Variable::new("unused");
        dead.equations.push(Equation::default_arm("42"));
        set.variables.push(used);
        set.variables.push(dead);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let part = model.part(model.root);
        assert!(part.find_variable("x").is_some());
        assert!(part.find_variable("unused").is_none());
    }

    #[test]
    fn keeps_a_variable_reached_through_a_live_consumer() {
        let mut set = EquationSet::new("Leaky");
        let mut out = Variable::new("out");
        out.set_attr(crate::ast::ATTR_ACCESSOR);
        out.equations.push(Equation::default_arm("tau + 1"));
        let mut tau = Variable::new("tau");
        tau.equations.push(Equation::default_arm("20"));
        set.variables.push(out);
        set.variables.push(tau);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        assert!(model.part(model.root).find_variable("tau").is_some());
    }
}
