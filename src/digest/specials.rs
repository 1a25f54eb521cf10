//! Stages 2-4: resolve connection bindings, inject language specials, seed
//! initial attributes.

use crate::ast::{Equation, Model, RefStep, VarType, Variable, VariableReference};
use crate::catalog::{Catalog, SPECIALS};
use crate::error::{DigestError, DigestErrorKind};

/// Stage 2: resolve each `ConnectionBinding.endpoint` name to a part index
/// via the catalog, recording the path as a single [`RefStep::Endpoint`]
/// hop on `resolution`.
pub fn resolve_connection_bindings(model: &mut Model, catalog: &mut Catalog) -> Result<(), Vec<DigestError>> {
    let mut errors = Vec::new();
    for idx in 0..model.parts.len() {
        let bindings: Vec<_> = model.parts[idx].connection_bindings.clone();
        for binding in bindings {
            match catalog.find_part(&binding.endpoint) {
                Some(target) => {
                    let alias = binding.alias.clone();
                    let b = model.parts[idx]
                        .connection_bindings
                        .iter_mut()
                        .find(|b| b.alias == alias)
                        .expect("binding present");
                    b.resolution = VariableReference {
                        steps: vec![RefStep::Endpoint(binding.alias.clone())],
                        target_name: model.parts[target].name.clone(),
                        resolved: true,
                    };
                }
                None => {
                    errors.push(DigestError::new(
                        DigestErrorKind::UnresolvedReference,
                        model.path_of(idx),
                        format!("connection endpoint `{}` aliased `{}` has no matching part", binding.endpoint, binding.alias),
                    ));
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

/// Stage 3: materialize a special (`$t`, `$n`, `$index`, …) as a
/// preexistent, accessor-tagged [`Variable`] in every part whose equations
/// reference it textually, so later stages have a concrete `Variable` to
/// attach attributes/exponents to instead of special-casing bare strings.
pub fn add_specials(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        let referenced: Vec<&str> = SPECIALS
            .iter()
            .filter(|special| {
                part.variables
                    .iter()
                    .flat_map(|v| v.equations.iter())
                    .any(|eq| eq.expression.contains(*special) || eq.condition.as_deref().is_some_and(|c| c.contains(*special)))
            })
            .copied()
            .collect();

        for special in referenced {
            if part.find_variable(special).is_some() {
                continue;
            }
            let mut v = Variable::new(special);
            v.set_attr(crate::ast::ATTR_PREEXISTENT);
            v.set_attr(crate::ast::ATTR_ACCESSOR);
            if special == "$n" {
                v.equations.push(Equation::default_arm("1"));
            }
            part.variables.push(v);
        }

        // `$init`/`$connect`/`$type` always exist as implicit triggers even
        // when no equation mentions them by name; the code generator's
        // lifecycle methods (`init`, connection formation, `$type` split)
        // need them resolvable.
        for implicit in ["$init", "$live"] {
            if part.find_variable(implicit).is_none() && part.is_connection() == (implicit == "$live") {
                let mut v = Variable::new(implicit);
                v.set_attr(crate::ast::ATTR_PREEXISTENT);
                v.var_type = VarType::Scalar;
                part.variables.push(v);
            }
        }
    }
    Ok(())
}

/// Stage 4: seed attributes that can be determined from syntax alone,
/// before any cross-part resolution: `$`-prefixed names are preexistent,
/// single-equation unconditioned numeric literals are constant.
pub fn seed_attributes(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        for var in &mut part.variables {
            if var.name.starts_with('$') {
                var.set_attr(crate::ast::ATTR_PREEXISTENT);
            }
            if var.equations.len() == 1 && !var.is_combined() {
                let eq = &var.equations[0];
                if eq.condition.is_none() && crate::value::parse_numeric_literal(&eq.expression).is_some() {
                    var.set_attr(crate::ast::ATTR_CONSTANT);
                }
            }
        }
    }
    Ok(())
}
