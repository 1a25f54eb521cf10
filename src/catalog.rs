//! Catalog: global bookkeeping across a [`Model`]'s parts.
//!
//! Tracks part name → index, the model-wide numeric backend choice, and the
//! "specials" injected during digest stage 3 (`$connect, $index, $init, $n,
//! $t, $t', $type`). Digest stages consult the catalog instead of doing
//! linear scans over `model.parts` by name.

use crate::ast::Model;
use std::collections::HashMap;

/// Names of the language specials injected by digest stage 3.
pub const SPECIALS: &[&str] = &["$connect", "$index", "$init", "$n", "$t", "$t'", "$type"];

/// Global registry built once per [`Model`] before digest begins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Part name → index in `model.parts`. Names need not be unique across
    /// the whole model (two sibling compartments nested under different
    /// containers may share a name) so this maps to the *first* match;
    /// digest's resolve stage disambiguates using the reference's container
    /// chain rather than this table alone.
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn build(model: &Model) -> Self {
        let mut by_name = HashMap::new();
        for (idx, part) in model.parts.iter().enumerate() {
            by_name.entry(part.name.clone()).or_insert(idx);
        }
        Catalog { by_name }
    }

    pub fn find_part(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn register(&mut self, name: impl Into<String>, idx: usize) {
        self.by_name.entry(name.into()).or_insert(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EquationSet;

    #[test]
    fn catalog_finds_parts_by_name() {
        let mut model = Model::new(EquationSet::new("Root"));
        let child = model.add_part(model.root, EquationSet::new("Leaf"));
        let catalog = Catalog::build(&model);
        assert_eq!(catalog.find_part("Leaf"), Some(child));
        assert_eq!(catalog.find_part("Nope"), None);
    }
}
