//! Stage 9: unit check.
//!
//! Model text may suffix an equation's expression with `;unit`.
//! The parser keeps that suffix embedded in `Equation.expression` rather
//! than splitting it into a separate field (it plays no role until this
//! stage), so unit checking here extracts the trailing `;`-delimited
//! token from each arm and verifies every arm of a given variable agrees
//! — a unit only needs to be stated on one arm, but stating conflicting
//! ones is a digest error.

use crate::ast::Model;
use crate::error::{DigestError, DigestErrorKind};

fn unit_suffix(expression: &str) -> Option<&str> {
    expression.rsplit_once(';').map(|(_, unit)| unit.trim()).filter(|u| !u.is_empty())
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    let mut errors = Vec::new();
    for (part_idx, part) in model.parts.iter().enumerate() {
        for var in &part.variables {
            let mut declared: Option<&str> = None;
            for eq in &var.equations {
                if let Some(unit) = unit_suffix(&eq.expression) {
                    match declared {
                        None => declared = Some(unit),
                        Some(prev) if prev != unit => {
                            errors.push(DigestError::new(
                                DigestErrorKind::UnitMismatch,
                                model.path_of(part_idx),
                                format!("variable `{}` declares both unit `{prev}` and `{unit}`", var.name),
                            ));
                        }
                        _ => {}
                    }
                }
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
    fn conflicting_units_across_arms_is_an_error() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("tau");
        v.equations.push(Equation::conditional("$init", "20;ms"));
        v.equations.push(Equation::default_arm("tau;s"));
        set.variables.push(v);
        let mut model = Model::new(set);
        assert!(run(&mut model).is_err());
    }

    #[test]
    fn single_declared_unit_is_fine() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("tau");
        v.equations.push(Equation::default_arm("20;ms"));
        set.variables.push(v);
        let mut model = Model::new(set);
        assert!(run(&mut model).is_ok());
    }
}
