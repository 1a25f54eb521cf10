//! Stage 19: connection-matrix detection.
//!
//! Recognizes the `matrix(name, rowExpr, colExpr)` equation form on a
//! connection part and records it as a [`crate::ast::ConnectionMatrix`],
//! which [`crate::connection_planner`] uses to pick the sparse-matrix
//! enumeration strategy over nearest-neighbor/enumerative.

use crate::ast::{ConnectionMatrix, Model};
use crate::error::DigestError;

fn parse_matrix_call(expression: &str) -> Option<(String, String, String)> {
    let expression = expression.trim();
    let rest = expression.strip_prefix("matrix(")?;
    let inner = rest.strip_suffix(')')?;
    let mut parts = inner.splitn(3, ',');
    let variable = parts.next()?.trim().to_string();
    let row = parts.next()?.trim().to_string();
    let col = parts.next()?.trim().to_string();
    Some((variable, row, col))
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for part in &mut model.parts {
        if !part.is_connection() || part.connection_matrix.is_some() {
            continue;
        }
        let found = part.variables.iter().find_map(|v| v.default_equation().and_then(|eq| parse_matrix_call(&eq.expression)));
        if let Some((variable, row_mapping, column_mapping)) = found {
            part.connection_matrix = Some(ConnectionMatrix { variable, row_mapping, column_mapping });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn recognizes_the_matrix_call_form() {
        let mut set = EquationSet::new("Synapse");
        set.connection_bindings.push(crate::ast::ConnectionBinding {
            alias: "A".into(),
            endpoint: "Pre".into(),
            index: 0,
            resolution: crate::ast::VariableReference::unresolved(""),
        });
        let mut w = Variable::new("weight");
        w.equations.push(Equation::default_arm("matrix(W, rowOf(A), colOf(B))"));
        set.variables.push(w);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let cm = model.part(model.root).connection_matrix.as_ref().unwrap();
        assert_eq!(cm.variable, "W");
        assert_eq!(cm.row_mapping, "rowOf(A)");
        assert_eq!(cm.column_mapping, "colOf(B)");
    }
}
