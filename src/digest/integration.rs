//! Stage 6: create integrated variables.
//!
//! The parser leaves `x'`, `x''`, … as independent [`Variable`]s named
//! with trailing apostrophes (see `parser::tests::parse_rule_collects_*`).
//! This stage splices them into a proper order-0..order-N chain: each
//! `Variable.order` is set from its apostrophe count, `derivative` points
//! at the index of the next-lower order, and any missing intermediate
//! order is synthesized with an implicit `0` initial equation so the
//! generated `Instance::integrate` has a complete chain to walk.

use crate::ast::{Equation, Model, Variable};
use crate::error::DigestError;

fn split_order(name: &str) -> (&str, u32) {
    let trimmed = name.trim_end_matches('\'');
    let order = (name.len() - trimmed.len()) as u32;
    (trimmed, order)
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        let raw: Vec<(String, u32, usize)> = part
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                let (base, order) = split_order(&v.name);
                (order > 0).then(|| (base.to_string(), order, i))
            })
            .collect();

        for (base, order, idx) in raw {
            part.variables[idx].order = order;

            // Ensure every order from 0 to `order` exists.
            for lower in 0..order {
                let lower_name = if lower == 0 { base.clone() } else { format!("{base}{}", "'".repeat(lower as usize)) };
                if part.find_variable(&lower_name).is_none() {
                    let mut synthesized = Variable::new(lower_name);
                    synthesized.order = lower;
                    if lower == 0 {
                        synthesized.equations.push(Equation::default_arm("0"));
                    }
                    part.variables.push(synthesized);
                }
            }

            let next_lower_name = if order == 1 { base.clone() } else { format!("{base}{}", "'".repeat((order - 1) as usize)) };
            if let Some(lower_idx) = part.find_variable(&next_lower_name) {
                part.variables[idx].derivative = Some(lower_idx);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EquationSet;

    #[test]
    fn links_first_order_derivative_to_its_base_variable() {
        let mut set = EquationSet::new("Leaky");
        let mut x = Variable::new("x");
        x.equations.push(Equation::default_arm("1"));
        set.variables.push(x);
        let mut dx = Variable::new("x'");
        dx.equations.push(Equation::default_arm("-x"));
        set.variables.push(dx);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let part = model.part(model.root);
        let dx_idx = part.find_variable("x'").unwrap();
        let x_idx = part.find_variable("x").unwrap();
        assert_eq!(part.variables[dx_idx].derivative, Some(x_idx));
        assert_eq!(part.variables[dx_idx].order, 1);
    }

    #[test]
    fn synthesizes_missing_intermediate_order() {
        let mut set = EquationSet::new("Oscillator");
        let mut ddx = Variable::new("x''");
        ddx.equations.push(Equation::default_arm("-x"));
        set.variables.push(ddx);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let part = model.part(model.root);
        assert!(part.find_variable("x").is_some());
        assert!(part.find_variable("x'").is_some());
    }
}
