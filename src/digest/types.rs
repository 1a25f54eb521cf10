//! Stage 17: type determination.
//!
//! Finalizes [`crate::ast::VarType`] for every variable whose type wasn't
//! already pinned by an explicit declaration: a default equation that's a
//! quoted string literal makes it `Text`; one with a `[`-delimited literal
//! makes it `Matrix`; anything else defaults to `Scalar`. Runs after dead
//! variable removal so type inconsistencies in unused equations never
//! surface as spurious errors.

use crate::ast::{Model, VarType};
use crate::error::{DigestError, DigestErrorKind};

fn infer(expression: &str) -> VarType {
    let trimmed = expression.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        VarType::Text
    } else if trimmed.starts_with('[') {
        VarType::Matrix
    } else {
        VarType::Scalar
    }
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    let mut errors = Vec::new();
    for (part_idx, part) in model.parts.iter_mut().enumerate() {
        for var in &mut part.variables {
            let mut inferred: Option<VarType> = None;
            for eq in &var.equations {
                let this_arm = infer(&eq.expression);
                match &inferred {
                    None => inferred = Some(this_arm),
                    Some(prev) if *prev != this_arm => {
                        errors.push(DigestError::new(
                            DigestErrorKind::TypeInconsistency,
                            crate::error::NodePath::root().push(part.name.clone()),
                            format!("variable `{}` has equations of incompatible types", var.name),
                        ));
                    }
                    _ => {}
                }
            }
            if let Some(t) = inferred {
                var.var_type = t;
            }
        }
        let _ = part_idx;
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
