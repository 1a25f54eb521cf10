//! Stage 13: temporary promotion.
//!
//! A variable that is computed fresh every cycle, read only within its own
//! part, never integrated, and never externally visible doesn't need a
//! persistent struct field — the code generator can lower it to a local
//! `let` binding inside the method body instead. This stage marks those
//! candidates [`crate::ast::ATTR_TEMPORARY`] so `CodeEmitter` knows which
//! is which.

use crate::ast::Model;
use crate::error::DigestError;

fn mentions(expression: &str, name: &str) -> bool {
    expression
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '$' || c == '.'))
        .any(|tok| tok == name)
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        let externally_referenced: std::collections::HashSet<usize> = (0..part.variables.len())
            .filter(|&i| {
                let name = part.variables[i].name.clone();
                part.variables
                    .iter()
                    .enumerate()
                    .any(|(j, v)| j != i && v.equations.iter().any(|eq| mentions(&eq.expression, &name)))
            })
            .collect();

        for (i, var) in part.variables.iter_mut().enumerate() {
            let integrated = var.order > 0 || var.derivative.is_some();
            let visible = var.has_attr(crate::ast::ATTR_ACCESSOR)
                || var.has_attr(crate::ast::ATTR_EXTERNAL_READ)
                || var.has_attr(crate::ast::ATTR_EXTERNAL_WRITE)
                || var.name.starts_with('$');
            if !integrated && !visible && !var.is_combined() && !externally_referenced.contains(&i) {
                var.set_attr(crate::ast::ATTR_TEMPORARY);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn a_purely_local_intermediate_is_promoted_to_temporary() {
        let mut set = EquationSet::new("Leaky");
        let mut scratch = Variable::new("scratch");
        scratch.equations.push(Equation::default_arm("2"));
        set.variables.push(scratch);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        assert!(model.part(model.root).variables[0].has_attr(crate::ast::ATTR_TEMPORARY));
    }

    #[test]
    fn an_accessor_variable_is_never_a_temporary() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("V");
        v.set_attr(crate::ast::ATTR_ACCESSOR);
        v.equations.push(Equation::default_arm("0"));
        set.variables.push(v);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        assert!(!model.part(model.root).variables[0].has_attr(crate::ast::ATTR_TEMPORARY));
    }
}
