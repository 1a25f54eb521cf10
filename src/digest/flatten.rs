//! Stage 7: flatten multiconditional equations.
//!
//! Once references resolve, duplicate conditional arms on the same
//! variable (identical `condition` text from, e.g., an overridden
//! sub-part merging its parent's equations back in) are collapsed to one
//! arm, keeping the first declaration.

use crate::ast::Model;
use crate::error::DigestError;

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        for var in &mut part.variables {
            let mut seen = std::collections::HashSet::new();
            var.equations.retain(|eq| seen.insert(eq.condition.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn collapses_duplicate_condition_arms() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("x");
        v.equations.push(Equation::conditional("$init", "0"));
        v.equations.push(Equation::conditional("$init", "1"));
        set.variables.push(v);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        assert_eq!(model.part(model.root).variables[0].equations.len(), 1);
    }
}
