//! # N2A Equation AST
//!
//! Types for an N2A part hierarchy: [`EquationSet`] (a
//! "part"), [`Variable`], [`Equation`], [`VariableReference`] and
//! [`ConnectionBinding`]. This module is the input to [`crate::digest`] and
//! is mutated in place during digest, then frozen.
//!
//! ## Builders
//!
//! For programmatic construction, see [`builders`], which provides fluent
//! APIs mirroring hand-written model text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod builders;

/// Raw parsed node, the direct result of [`crate::parser`] before any
/// digest has run. Mirrors the "tree of named nodes": a key, an
/// optional value, and ordered children. `EquationSet`/`Variable` are built
/// from a forest of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub key: String,
    pub value: Option<String>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(key: impl Into<String>) -> Self {
        RawNode {
            key: key.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        RawNode {
            key: key.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    pub fn child(&self, key: &str) -> Option<&RawNode> {
        self.children.iter().find(|c| c.key == key)
    }

    pub fn is_reserved(&self) -> bool {
        self.key.starts_with('$')
    }
}

/// Assignment/combiner tag for a [`Variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Assignment {
    #[default]
    Replace,
    Add,
    Multiply,
    Divide,
    Min,
    Max,
}

impl Assignment {
    /// Parse the combiner prefix from an equation's raw text (`+=`, `*=`, …).
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "+=" => Assignment::Add,
            "*=" => Assignment::Multiply,
            "/=" => Assignment::Divide,
            "<<=" => Assignment::Min,
            ">>=" => Assignment::Max,
            _ => Assignment::Replace,
        }
    }

    /// Whether this combiner requires buffering across writers: a
    /// non-`REPLACE` assignment means the Variable is combined.
    pub fn is_combined(self) -> bool {
        !matches!(self, Assignment::Replace)
    }

    /// Identity element the buffer resets to in `finalize`.
    pub fn identity(self) -> CombinerIdentity {
        match self {
            Assignment::Replace => CombinerIdentity::None,
            Assignment::Add => CombinerIdentity::Zero,
            Assignment::Multiply | Assignment::Divide => CombinerIdentity::One,
            Assignment::Min => CombinerIdentity::PositiveInfinity,
            Assignment::Max => CombinerIdentity::NegativeInfinity,
        }
    }
}

/// Symbolic identity value a combiner's buffer resets to; the code
/// generator lowers this to a literal of the variable's storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinerIdentity {
    None,
    Zero,
    One,
    PositiveInfinity,
    NegativeInfinity,
}

/// Storage type of a [`Variable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VarType {
    #[default]
    Scalar,
    Matrix,
    Text,
}

/// A single step in a [`VariableReference`] resolution path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefStep {
    /// Ascend to the containing part.
    Up,
    /// Descend into a named sub-part.
    Down(String),
    /// Follow a connection endpoint alias to the bound part.
    Endpoint(String),
}

/// Resolution path describing how to reach a variable from the part where
/// the referencing expression lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VariableReference {
    pub steps: Vec<RefStep>,
    /// Name of the target variable once the path is followed. Empty until
    /// digest stage 5 resolves it.
    pub target_name: String,
    /// True once digest has confirmed the target exists and is reachable.
    pub resolved: bool,
}

impl VariableReference {
    pub fn unresolved(target_name: impl Into<String>) -> Self {
        VariableReference {
            steps: Vec::new(),
            target_name: target_name.into(),
            resolved: false,
        }
    }
}

/// `condition, expression` pair making up one arm of a [`Variable`]'s
/// multiconditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// `None` for the default (unconditioned) equation; at most one equation
    /// per variable may have `condition == None`.
    pub condition: Option<String>,
    pub expression: String,
    /// Exponent the expression is known to evaluate at after exponent
    /// inference (fixed-point mode only). `None` until stage 18.
    pub exponent_next: Option<i32>,
}

impl Equation {
    pub fn default_arm(expression: impl Into<String>) -> Self {
        Equation {
            condition: None,
            expression: expression.into(),
            exponent_next: None,
        }
    }

    pub fn conditional(condition: impl Into<String>, expression: impl Into<String>) -> Self {
        Equation {
            condition: Some(condition.into()),
            expression: expression.into(),
            exponent_next: None,
        }
    }
}

/// String attribute tags carried by a [`Variable`].
pub type Attribute = &'static str;

pub const ATTR_CONSTANT: Attribute = "constant";
pub const ATTR_INIT_ONLY: Attribute = "initOnly";
pub const ATTR_TEMPORARY: Attribute = "temporary";
pub const ATTR_ACCESSOR: Attribute = "accessor";
pub const ATTR_PREEXISTENT: Attribute = "preexistent";
pub const ATTR_GLOBAL: Attribute = "global";
pub const ATTR_EXTERNAL_READ: Attribute = "externalRead";
pub const ATTR_EXTERNAL_WRITE: Attribute = "externalWrite";
pub const ATTR_CYCLE: Attribute = "cycle";
pub const ATTR_MATRIX_POINTER: Attribute = "MatrixPointer";
pub const ATTR_DUMMY: Attribute = "dummy";
pub const ATTR_PARAM: Attribute = "param";
pub const ATTR_CLI: Attribute = "cli";
pub const ATTR_REFERENCE: Attribute = "reference";

/// A named quantity in a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Derivative order: 0 for value, 1 for first derivative, etc.
    pub order: u32,
    pub equations: Vec<Equation>,
    pub assignment: Assignment,
    pub var_type: VarType,
    /// Index of the lower-order companion variable this one is the
    /// derivative of, within the same part's variable list. `None` for
    /// order-0 variables or before stage 6 has synthesized companions.
    pub derivative: Option<usize>,
    /// Resolved target if this variable's name aliases a variable in
    /// another part.
    pub reference: Option<VariableReference>,
    pub attributes: BTreeSet<String>,
    /// MSB power-of-two weight, fixed-point mode only.
    pub exponent: Option<i32>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            order: 0,
            equations: Vec::new(),
            assignment: Assignment::Replace,
            var_type: VarType::Scalar,
            derivative: None,
            reference: None,
            attributes: BTreeSet::new(),
            exponent: None,
        }
    }

    pub fn has_attr(&self, attr: Attribute) -> bool {
        self.attributes.contains(attr)
    }

    pub fn set_attr(&mut self, attr: Attribute) {
        self.attributes.insert(attr.to_string());
    }

    /// The single default (unconditioned) equation, if any.
    pub fn default_equation(&self) -> Option<&Equation> {
        self.equations.iter().find(|e| e.condition.is_none())
    }

    pub fn is_combined(&self) -> bool {
        self.assignment.is_combined()
    }
}

/// For a connection part: one bound endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionBinding {
    pub alias: String,
    /// Name of the endpoint part; resolved to an index into the model's
    /// part table during digest stage 2.
    pub endpoint: String,
    /// Index of this binding among the connection's endpoints (0-based).
    pub index: usize,
    pub resolution: VariableReference,
}

/// A single nonzero-coordinate expression driving a sparse-matrix
/// connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMatrix {
    /// Name of the matrix-valued variable whose nonzero pattern drives
    /// connection formation.
    pub variable: String,
    /// User-supplied expression mapping a matrix row index to a row-endpoint
    /// instance index.
    pub row_mapping: String,
    /// Same, for columns.
    pub column_mapping: String,
}

/// A node in the part hierarchy: either a compartment or, when
/// `connection_bindings` is non-empty, a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationSet {
    pub name: String,
    /// Index of the containing part in the owning [`Model`], if any.
    pub container: Option<usize>,
    /// Indices of child parts in the owning [`Model`]'s arena.
    pub parts: Vec<usize>,
    pub variables: Vec<Variable>,
    pub connection_bindings: Vec<ConnectionBinding>,
    pub connection_matrix: Option<ConnectionMatrix>,
    pub singleton: bool,
    /// Evaluation order over `variables`, populated by digest stage 14.
    pub ordered: Vec<usize>,
    /// Evaluation order over `parts`, populated by digest stage 8.
    pub ordered_parts: Vec<usize>,
    /// Analysis output populated during emission planning
    /// (`BackendData`). `None` until [`crate::digest::run`] completes.
    pub backend_data: Option<crate::digest::BackendData>,
}

impl EquationSet {
    pub fn new(name: impl Into<String>) -> Self {
        EquationSet {
            name: name.into(),
            container: None,
            parts: Vec::new(),
            variables: Vec::new(),
            connection_bindings: Vec::new(),
            connection_matrix: None,
            singleton: false,
            ordered: Vec::new(),
            ordered_parts: Vec::new(),
            backend_data: None,
        }
    }

    pub fn is_connection(&self) -> bool {
        !self.connection_bindings.is_empty()
    }

    pub fn find_variable(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn find_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }
}

/// Arena owning every [`EquationSet`] in a model, indexed by position. Parts
/// reference each other (`container`, `parts`, connection endpoints) by
/// index into this arena rather than by pointer, so the whole tree is
/// trivially `Clone`/`Serialize` and survives digest's in-place mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub parts: Vec<EquationSet>,
    pub root: usize,
}

impl Model {
    pub fn new(root: EquationSet) -> Self {
        Model {
            parts: vec![root],
            root: 0,
        }
    }

    pub fn part(&self, idx: usize) -> &EquationSet {
        &self.parts[idx]
    }

    pub fn part_mut(&mut self, idx: usize) -> &mut EquationSet {
        &mut self.parts[idx]
    }

    /// Add `child` as a sub-part of `container_idx`, returning its index.
    pub fn add_part(&mut self, container_idx: usize, mut child: EquationSet) -> usize {
        child.container = Some(container_idx);
        let idx = self.parts.len();
        self.parts.push(child);
        self.parts[container_idx].parts.push(idx);
        idx
    }

    pub fn path_of(&self, idx: usize) -> crate::error::NodePath {
        let mut segments = Vec::new();
        let mut cur = Some(idx);
        while let Some(i) = cur {
            segments.push(self.parts[i].name.clone());
            cur = self.parts[i].container;
        }
        segments.reverse();
        crate::error::NodePath(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_identity_matches_combiner() {
        assert_eq!(Assignment::Add.identity(), CombinerIdentity::Zero);
        assert_eq!(Assignment::Multiply.identity(), CombinerIdentity::One);
        assert_eq!(Assignment::Min.identity(), CombinerIdentity::PositiveInfinity);
        assert_eq!(Assignment::Max.identity(), CombinerIdentity::NegativeInfinity);
        assert_eq!(Assignment::Replace.identity(), CombinerIdentity::None);
    }

    #[test]
    fn model_add_part_links_container() {
        let mut model = Model::new(EquationSet::new("Root"));
        let child = model.add_part(model.root, EquationSet::new("Child"));
        assert_eq!(model.part(child).container, Some(model.root));
        assert_eq!(model.part(model.root).parts, vec![child]);
    }

    #[test]
    fn path_of_renders_dotted_ancestry() {
        let mut model = Model::new(EquationSet::new("Root"));
        let child = model.add_part(model.root, EquationSet::new("Child"));
        let grandchild = model.add_part(child, EquationSet::new("Leaf"));
        assert_eq!(model.path_of(grandchild).to_string(), "Root.Child.Leaf");
    }

    #[test]
    fn variable_default_equation_is_unconditioned() {
        let mut v = Variable::new("x");
        v.equations.push(Equation::conditional("$init", "0"));
        v.equations.push(Equation::default_arm("x + 1"));
        assert_eq!(v.default_equation().unwrap().expression, "x + 1");
    }
}
