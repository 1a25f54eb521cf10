//! Stage 5: resolve LHS/RHS [`VariableReference`]s.
//!
//! Walks each reference's `steps` (Up/Down/Endpoint) from the owning part
//! to a target part, then confirms `target_name` names a real variable
//! there. `Up`/`Down`/`Endpoint` play the role of relative-vs-qualified
//! name resolution over the part hierarchy.

use crate::ast::Model;
use crate::catalog::Catalog;
use crate::error::{DigestError, DigestErrorKind};

fn resolve_steps(model: &Model, start: usize, steps: &[crate::ast::RefStep], catalog: &Catalog) -> Option<usize> {
    let mut current = start;
    for step in steps {
        current = match step {
            crate::ast::RefStep::Up => model.parts[current].container?,
            crate::ast::RefStep::Down(name) => {
                let mut found = None;
                for &child in &model.parts[current].parts {
                    if model.parts[child].name == *name {
                        found = Some(child);
                        break;
                    }
                }
                found?
            }
            crate::ast::RefStep::Endpoint(alias) => {
                let binding = model.parts[current].connection_bindings.iter().find(|b| b.alias == *alias)?;
                catalog.find_part(&binding.endpoint)?
            }
        };
    }
    Some(current)
}

pub fn run(model: &mut Model, catalog: &Catalog) -> Result<(), Vec<DigestError>> {
    let mut errors = Vec::new();

    for part_idx in 0..model.parts.len() {
        let var_count = model.parts[part_idx].variables.len();
        for var_idx in 0..var_count {
            let reference = model.parts[part_idx].variables[var_idx].reference.clone();
            let Some(reference) = reference else { continue };
            if reference.resolved {
                continue;
            }
            let Some(target_part) = resolve_steps(model, part_idx, &reference.steps, catalog) else {
                errors.push(DigestError::new(
                    DigestErrorKind::UnresolvedReference,
                    model.path_of(part_idx),
                    format!(
                        "variable `{}` references an unreachable path",
                        model.parts[part_idx].variables[var_idx].name
                    ),
                ));
                continue;
            };
            if model.parts[target_part].find_variable(&reference.target_name).is_none() {
                errors.push(DigestError::new(
                    DigestErrorKind::UnresolvedReference,
                    model.path_of(part_idx),
                    format!(
                        "no variable named `{}` in resolved target part `{}`",
                        reference.target_name, model.parts[target_part].name
                    ),
                ));
                continue;
            }
            let r = model.parts[part_idx].variables[var_idx].reference.as_mut().unwrap();
            r.resolved = true;
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
    use crate::ast::{EquationSet, RefStep, Variable, VariableReference};

    #[test]
    fn resolves_a_down_reference_to_a_child_part() {
        let mut model = Model::new(EquationSet::new("Root"));
        let child = model.add_part(model.root, EquationSet::new("Sub"));
        model.parts[child].variables.push(Variable::new("x"));
        let mut v = Variable::new("alias");
        v.reference = Some(VariableReference {
            steps: vec![RefStep::Down("Sub".into())],
            target_name: "x".into(),
            resolved: false,
        });
        model.parts[model.root].variables.push(v);

        let catalog = Catalog::build(&model);
        run(&mut model, &catalog).unwrap();
        assert!(model.part(model.root).variables[0].reference.as_ref().unwrap().resolved);
    }
}
