//! Stage 18: exponent inference (fixed-point numeric backend only).
//!
//! Assigns every variable a declared MSB exponent, run as a
//! fixed-point iteration over the part's variables in dependency order
//! (stage 14 already computed that order): a variable whose default
//! equation is a bare numeric literal gets the exponent that keeps the
//! literal's magnitude inside `[0.5, 1)` of the `Fixed` representable
//! range; anything else conservatively inherits the exponent of the first
//! operand variable it mentions, defaulting to `0` if none is found.
//! Iterates until no variable's exponent changes, capped to avoid an
//! infinite loop on a reference cycle (those are already flagged
//! [`crate::ast::ATTR_CYCLE`] by stage 14 and just keep their default).

use crate::ast::Model;
use crate::error::{DigestError, DigestErrorKind};
use crate::value::fixed::MSB;

fn literal_exponent(value: f64) -> i32 {
    if value == 0.0 {
        return 0;
    }
    (value.abs().log2().floor() as i32) + 1
}

fn mentions(expression: &str, name: &str) -> bool {
    expression
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\'' || c == '$' || c == '.'))
        .any(|tok| tok == name)
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        let order = if part.ordered.is_empty() {
            (0..part.variables.len()).collect::<Vec<_>>()
        } else {
            part.ordered.clone()
        };

        for _pass in 0..8 {
            let mut changed = false;
            for &i in &order {
                if part.variables[i].exponent.is_some() {
                    continue;
                }
                let Some(eq) = part.variables[i].default_equation() else { continue };
                if let Some(literal) = crate::value::parse_numeric_literal(&eq.expression) {
                    part.variables[i].exponent = Some(literal_exponent(literal));
                    changed = true;
                    continue;
                }
                let expr = eq.expression.clone();
                let inherited = part
                    .variables
                    .iter()
                    .find(|v| v.exponent.is_some() && mentions(&expr, &v.name))
                    .and_then(|v| v.exponent);
                if let Some(exp) = inherited {
                    part.variables[i].exponent = Some(exp);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Data read in from outside the model (CSV columns, CLI overrides)
        // has no equation to infer a magnitude from; default it to 2^0
        // rather than failing the whole model over it.
        for var in &mut part.variables {
            if var.exponent.is_none() && var.has_attr(crate::ast::ATTR_EXTERNAL_READ) {
                var.exponent = Some(MSB - MSB);
            }
        }
    }

    let mut errors = Vec::new();
    for (idx, part) in model.parts.iter().enumerate() {
        for var in &part.variables {
            if var.exponent.is_none() {
                errors.push(DigestError::new(
                    DigestErrorKind::ExponentUnderdetermined,
                    model.path_of(idx),
                    format!("variable `{}` has no determinable exponent", var.name),
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
    fn literal_variable_gets_a_magnitude_appropriate_exponent() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("tau");
        v.equations.push(Equation::default_arm("20"));
        set.variables.push(v);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let exponent = model.part(model.root).variables[0].exponent.unwrap();
        assert!(exponent >= 4 && exponent <= 6);
    }

    #[test]
    fn externally_read_variable_defaults_its_exponent_instead_of_erroring() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("x");
        v.equations.push(Equation::default_arm("y + 1"));
        v.set_attr(crate::ast::ATTR_EXTERNAL_READ);
        set.variables.push(v);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        assert!(model.part(model.root).variables[0].exponent.is_some());
    }

    #[test]
    fn genuinely_unconstrained_variable_reports_exponent_underdetermined() {
        let mut set = EquationSet::new("Leaky");
        let mut v = Variable::new("x");
        v.equations.push(Equation::default_arm("y + 1"));
        set.variables.push(v);
        let mut model = Model::new(set);

        let errors = run(&mut model).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e.kind, DigestErrorKind::ExponentUnderdetermined)));
    }
}
