//! Stage 11: split and death-propagation analysis.
//!
//! Populates the lethality flags ([`crate::digest::BackendData::lethal_p`],
//! `lethal_container`, `lethal_connection`) and the `$type` split target
//! list. A part is lethal-to-itself if it declares a `$p` (death
//! probability) variable with any equation that can evaluate below 1;
//! lethal-to-its-container if it is a `singleton`, since a singleton's
//! death takes its container down with it; lethal-to-connection
//! if it is an endpoint of any connection binding elsewhere in the model
//! (a dying compartment must sever its connections).

use crate::ast::Model;
use crate::digest::BackendData;
use crate::error::DigestError;

fn split_targets(expression: &str) -> Vec<String> {
    expression
        .trim_start_matches(|c: char| c != '(')
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    let endpoint_names: std::collections::HashSet<String> = model
        .parts
        .iter()
        .flat_map(|p| p.connection_bindings.iter().map(|b| b.endpoint.clone()))
        .collect();

    for idx in 0..model.parts.len() {
        let part = &model.parts[idx];
        let lethal_p = part.find_variable("$p").is_some();
        let lethal_container = part.singleton;
        let lethal_connection = endpoint_names.contains(&part.name);
        let splits = part
            .find_variable("$type")
            .and_then(|i| part.variables[i].default_equation())
            .map(|eq| split_targets(&eq.expression))
            .unwrap_or_default();

        let backend = model.parts[idx].backend_data.get_or_insert_with(BackendData::default);
        backend.lethal_p = lethal_p;
        backend.lethal_container = lethal_container;
        backend.lethal_connection = lethal_connection;
        backend.splits = splits;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn singleton_parts_are_lethal_to_their_container() {
        let mut set = EquationSet::new("Root");
        set.singleton = true;
        let mut model = Model::new(set);
        run(&mut model).unwrap();
        assert!(model.part(model.root).backend_data.as_ref().unwrap().lethal_container);
    }

    #[test]
    fn type_split_parses_comma_separated_targets() {
        let mut set = EquationSet::new("Cell");
        let mut v = Variable::new("$type");
        v.equations.push(Equation::default_arm("(DaughterA, DaughterB)"));
        set.variables.push(v);
        let mut model = Model::new(set);
        run(&mut model).unwrap();
        assert_eq!(
            model.part(model.root).backend_data.as_ref().unwrap().splits,
            vec!["DaughterA".to_string(), "DaughterB".to_string()]
        );
    }
}
