//! Lowers a [`VariableReference`]'s resolution path into a Rust access
//! expression: `Up` becomes `self.container.borrow()`, `Down(name)`
//! becomes a field/collection lookup, `Endpoint(alias)` becomes the
//! connection's bound-instance field. Turns a symbolic path into code
//! that actually walks the generated struct graph.

use crate::ast::{RefStep, VariableReference};

/// Render `reference` as a Rust expression rooted at `self`, ending in a
/// read of `reference.target_name`.
pub fn render_access(reference: &VariableReference) -> String {
    let mut expr = "self".to_string();
    for step in &reference.steps {
        expr = match step {
            RefStep::Up => format!("{expr}.container.borrow()"),
            RefStep::Down(name) => format!("{expr}.{}.borrow()", field_name(name)),
            RefStep::Endpoint(alias) => format!("{expr}.{}.borrow()", field_name(alias)),
        };
    }
    format!("{expr}.{}", field_name(&reference.target_name))
}

/// Rust identifiers can't contain `$` or `'`; model names can. Mangle
/// deterministically so every caller produces the same field name for the
/// same source name.
pub fn field_name(name: &str) -> String {
    if name.starts_with('$') {
        format!("dollar_{}", name.trim_start_matches('$').replace('\'', "_tick"))
    } else {
        name.replace('\'', "_tick")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_dollar_and_tick_names() {
        assert_eq!(field_name("$t'"), "dollar_t_tick");
        assert_eq!(field_name("x'"), "x_tick");
        assert_eq!(field_name("plain"), "plain");
    }

    #[test]
    fn renders_a_down_then_endpoint_path() {
        let reference = VariableReference {
            steps: vec![RefStep::Down("Sub".into()), RefStep::Endpoint("A".into())],
            target_name: "V".into(),
            resolved: true,
        };
        let rendered = render_access(&reference);
        assert_eq!(rendered, "self.Sub.borrow().A.borrow().V");
    }
}
