//! Stage 15: derivative and `initOnly` liveness.
//!
//! Two responsibilities: (1) mark any variable whose only equation arm
//! fires under the `$init` condition as [`crate::ast::ATTR_INIT_ONLY`],
//! since the emitted `Instance::init` is the only lifecycle method that
//! will ever evaluate it; (2) ensure every connection part carries a
//! `$live` variable reflecting whether its endpoints are currently alive
//! ("$live" is read by connection formation to skip dead
//! endpoints).

use crate::ast::{Equation, Model, Variable};
use crate::error::DigestError;

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        for var in &mut part.variables {
            if var.equations.len() == 1 && var.equations[0].condition.as_deref() == Some("$init") {
                var.set_attr(crate::ast::ATTR_INIT_ONLY);
            }
        }
    }

    for idx in 0..model.parts.len() {
        if !model.parts[idx].is_connection() {
            continue;
        }
        if model.parts[idx].find_variable("$live").is_some() {
            continue;
        }
        let aliases: Vec<String> = model.parts[idx].connection_bindings.iter().map(|b| b.alias.clone()).collect();
        let expr = aliases.iter().map(|a| format!("{a}.$live")).collect::<Vec<_>>().join(" && ");
        let mut live = Variable::new("$live");
        live.set_attr(crate::ast::ATTR_PREEXISTENT);
        live.equations.push(Equation::default_arm(if expr.is_empty() { "1".to_string() } else { expr }));
        model.parts[idx].variables.push(live);
    }
    Ok(())
}
