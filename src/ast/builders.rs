//! Fluent builders for AST construction, mainly useful for tests and for
//! programmatically assembling models without going through [`crate::parser`].

use super::{Assignment, ConnectionBinding, Equation, EquationSet, Variable, VariableReference, VarType};

/// Fluent builder for a [`Variable`].
pub struct VariableBuilder {
    var: Variable,
}

impl VariableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        VariableBuilder {
            var: Variable::new(name),
        }
    }

    pub fn order(mut self, order: u32) -> Self {
        self.var.order = order;
        self
    }

    pub fn var_type(mut self, t: VarType) -> Self {
        self.var.var_type = t;
        self
    }

    pub fn assignment(mut self, a: Assignment) -> Self {
        self.var.assignment = a;
        self
    }

    pub fn default_eq(mut self, expr: impl Into<String>) -> Self {
        self.var.equations.push(Equation::default_arm(expr));
        self
    }

    pub fn conditional_eq(mut self, cond: impl Into<String>, expr: impl Into<String>) -> Self {
        self.var.equations.push(Equation::conditional(cond, expr));
        self
    }

    pub fn attr(mut self, attr: super::Attribute) -> Self {
        self.var.set_attr(attr);
        self
    }

    pub fn reference(mut self, target: impl Into<String>) -> Self {
        self.var.reference = Some(VariableReference::unresolved(target));
        self
    }

    pub fn build(self) -> Variable {
        self.var
    }
}

/// Fluent builder for an [`EquationSet`].
pub struct PartBuilder {
    part: EquationSet,
}

impl PartBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        PartBuilder {
            part: EquationSet::new(name),
        }
    }

    pub fn singleton(mut self) -> Self {
        self.part.singleton = true;
        self
    }

    pub fn variable(mut self, var: Variable) -> Self {
        self.part.variables.push(var);
        self
    }

    pub fn endpoint(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        let index = self.part.connection_bindings.len();
        self.part.connection_bindings.push(ConnectionBinding {
            alias: alias.into(),
            endpoint: target.into(),
            index,
            resolution: VariableReference::default(),
        });
        self
    }

    pub fn build(self) -> EquationSet {
        self.part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_builder_produces_expected_shape() {
        let v = VariableBuilder::new("x")
            .order(1)
            .assignment(Assignment::Add)
            .default_eq("-x")
            .build();
        assert_eq!(v.name, "x");
        assert_eq!(v.order, 1);
        assert_eq!(v.assignment, Assignment::Add);
        assert_eq!(v.default_equation().unwrap().expression, "-x");
    }

    #[test]
    fn part_builder_tracks_endpoints_in_order() {
        let part = PartBuilder::new("Synapse")
            .endpoint("A", "Compartment")
            .endpoint("B", "Compartment")
            .build();
        assert_eq!(part.connection_bindings[0].index, 0);
        assert_eq!(part.connection_bindings[1].index, 1);
        assert!(part.is_connection());
    }
}
