//! Connection formation: walks the `ConnectIterator` tree
//! [`crate::connection_planner::plan`] produced, instantiates candidate
//! endpoint tuples, and accepts each candidate probabilistically against
//! `$p`. Planning picks the *shape* of the iteration ahead of time, from
//! static structure; this module walks it at run time, over live
//! population sizes.

use crate::connection_planner::{KdTree, Strategy};
use rand::Rng;
use rayon::prelude::*;

/// Above this many nonzeros, `ConnectMatrix::pairs` maps coordinates
/// across a `rayon` pool instead of sequentially; below it the thread
/// hand-off isn't worth the fixed cost.
const PARALLEL_MATRIX_THRESHOLD: usize = 4096;

/// One endpoint slot's candidate set for plain enumerative iteration:
/// every instance index `0..size` in the endpoint population, newborns
/// first.
#[derive(Debug, Clone)]
pub struct ConnectPopulation {
    pub size: usize,
    pub newborn_from: usize,
}

impl ConnectPopulation {
    pub fn new(size: usize, newborn_from: usize) -> Self {
        ConnectPopulation { size, newborn_from }
    }

    /// Instance indices in priority order: newborns (most recently added)
    /// first, then the rest.
    pub fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (self.newborn_from..self.size).collect();
        order.extend(0..self.newborn_from);
        order
    }
}

/// Nearest-neighbor endpoint slot: candidates are the `$k`/`$radius`
/// neighbors of the *other* endpoint's instance, found via an exact
/// KD-tree over this endpoint's `$xyz`.
pub struct ConnectPopulationNn {
    pub tree: KdTree,
    pub k: Option<usize>,
    pub radius: Option<f64>,
}

impl ConnectPopulationNn {
    pub fn candidates(&self, query: crate::connection_planner::Point3) -> Vec<usize> {
        self.tree
            .query(query, self.k, self.radius)
            .into_iter()
            .map(|(index, _distance)| index)
            .collect()
    }
}

/// Sparse-matrix-driven connection: the nonzero coordinates of the
/// driving matrix, each mapped through `map_index` to an (row-endpoint,
/// col-endpoint) instance pair.
pub struct ConnectMatrix<'a> {
    pub nonzeros: &'a [(usize, usize)],
    pub map_index: &'a (dyn Fn(usize, usize) -> (usize, usize) + Sync),
}

impl<'a> ConnectMatrix<'a> {
    /// Every realized (row-instance, col-instance) pair: visits each
    /// nonzero exactly once, so the resulting instance count equals the
    /// number of nonzeros whose (row,col) maps to a realized endpoint
    /// pair — every nonzero is visited, so this never filters; the
    /// caller is responsible for treating an out-of-range mapped index as
    /// "not realized" and skipping it. Large nonzero counts map across a
    /// `rayon` pool since each coordinate maps independently of every
    /// other.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        if self.nonzeros.len() >= PARALLEL_MATRIX_THRESHOLD {
            self.nonzeros.par_iter().map(|&(r, c)| (self.map_index)(r, c)).collect()
        } else {
            self.nonzeros.iter().map(|&(r, c)| (self.map_index)(r, c)).collect()
        }
    }
}

/// The tree of candidate iterators for a connection part, already
/// specialized to the strategy [`crate::connection_planner`] chose.
pub enum ConnectIterator<'a> {
    Enumerative(Vec<ConnectPopulation>),
    NearestNeighbor(Vec<ConnectPopulationNn>),
    Matrix(ConnectMatrix<'a>),
}

impl<'a> ConnectIterator<'a> {
    pub fn from_strategy(strategy: &Strategy, endpoint_sizes: &[usize]) -> Option<ConnectIterator<'static>> {
        match strategy {
            Strategy::Enumerative => Some(ConnectIterator::Enumerative(
                endpoint_sizes.iter().map(|&size| ConnectPopulation::new(size, size)).collect(),
            )),
            Strategy::NearestNeighbor { .. } | Strategy::SparseMatrix(_) => None,
        }
    }
}

/// Enumerate every candidate endpoint-index tuple for a plain enumerative
/// connection (nested iteration over endpoint instance lists),
/// respecting an optional per-endpoint `$max` cap and an overall
/// `$min`. `$max` bounds how many connections a single instance of the
/// first endpoint may participate in; exceeding it stops iterating for
/// that instance ("optionally filtered by $max (per-endpoint
/// cap)").
pub fn enumerate_candidates(endpoints: &[ConnectPopulation], max_per_first: Option<usize>) -> Vec<Vec<usize>> {
    let Some((first, rest)) = endpoints.split_first() else { return vec![Vec::new()] };
    let mut out = Vec::new();
    for &a in &first.order() {
        let mut count_for_a = 0;
        for tail in cartesian(rest) {
            if let Some(max) = max_per_first {
                if count_for_a >= max {
                    break;
                }
            }
            let mut tuple = vec![a];
            tuple.extend(tail);
            out.push(tuple);
            count_for_a += 1;
        }
    }
    out
}

fn cartesian(endpoints: &[ConnectPopulation]) -> Vec<Vec<usize>> {
    endpoints.iter().fold(vec![Vec::new()], |acc, pop| {
        let mut next = Vec::new();
        for prefix in &acc {
            for &idx in &pop.order() {
                let mut extended = prefix.clone();
                extended.push(idx);
                next.push(extended);
            }
        }
        next
    })
}

/// Accept a candidate tuple iff `uniform() < p`; acceptance is
/// probabilistic. `p == 1.0` always accepts without consuming
/// randomness, so deterministic models (the common case, `$p` omitted)
/// don't need a seeded RNG at all.
pub fn accept(p: f64, rng: &mut impl Rng) -> bool {
    if p >= 1.0 {
        return true;
    }
    if p <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < p
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn newborn_order_lists_newborns_first() {
        let pop = ConnectPopulation::new(5, 3);
        assert_eq!(pop.order(), vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn enumerate_candidates_is_the_full_cross_product_without_a_cap() {
        let a = ConnectPopulation::new(2, 2);
        let b = ConnectPopulation::new(3, 3);
        let candidates = enumerate_candidates(&[a, b], None);
        assert_eq!(candidates.len(), 6);
    }

    #[test]
    fn enumerate_candidates_respects_max_per_first_endpoint() {
        let a = ConnectPopulation::new(10, 10);
        let b = ConnectPopulation::new(10, 10);
        let candidates = enumerate_candidates(&[a, b], Some(3));
        assert_eq!(candidates.len(), 30);
        for first in 0..10 {
            let count = candidates.iter().filter(|c| c[0] == first).count();
            assert_eq!(count, 3);
        }
    }

    #[test]
    fn accept_is_deterministic_at_the_extremes() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert!(accept(1.0, &mut rng));
        assert!(!accept(0.0, &mut rng));
    }

    #[test]
    fn matrix_pairs_visits_every_nonzero_exactly_once() {
        let nonzeros = vec![(0, 0), (0, 1), (1, 2)];
        let map = |r: usize, c: usize| (r, c);
        let cm = ConnectMatrix { nonzeros: &nonzeros, map_index: &map };
        assert_eq!(cm.pairs(), nonzeros);
    }

    #[test]
    fn matrix_pairs_above_the_parallel_threshold_still_visits_every_nonzero_in_order() {
        let nonzeros: Vec<(usize, usize)> = (0..PARALLEL_MATRIX_THRESHOLD + 10).map(|i| (i, i * 2)).collect();
        let map = |r: usize, c: usize| (r, c);
        let cm = ConnectMatrix { nonzeros: &nonzeros, map_index: &map };
        assert_eq!(cm.pairs(), nonzeros);
    }
}
