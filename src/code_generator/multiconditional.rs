//! Lowers a [`Variable`]'s multiconditional (its list of
//! condition/expression arms) into a Rust `if`/`else if` chain: per
//! evaluation, exactly one arm's condition is expected to hold, and that
//! arm's expression fires. Arms are emitted in source-declared order —
//! only the first matching condition fires, so reordering them would
//! silently change which equation wins when two conditions overlap.

use crate::ast::{Assignment, Variable};

fn apply(assignment: Assignment, target: &str, rhs: &str) -> String {
    match assignment {
        Assignment::Replace => format!("{target} = {rhs};"),
        Assignment::Add => format!("{target} += {rhs};"),
        Assignment::Multiply => format!("{target} *= {rhs};"),
        Assignment::Divide => format!("{target} /= {rhs};"),
        Assignment::Min => format!("{target} = {target}.min({rhs});"),
        Assignment::Max => format!("{target} = {target}.max({rhs});"),
    }
}

fn render_chain(var: &Variable, target: &str, assignment: Assignment, expr: &impl Fn(&str) -> String) -> String {
    let conditioned: Vec<&crate::ast::Equation> = var.equations.iter().filter(|eq| eq.condition.is_some()).collect();
    let default = var.equations.iter().find(|eq| eq.condition.is_none());

    if conditioned.is_empty() {
        return match default {
            Some(eq) => apply(assignment, target, &expr(&eq.expression)),
            None => String::new(),
        };
    }

    let mut out = String::new();
    for (i, eq) in conditioned.iter().enumerate() {
        let keyword = if i == 0 { "if" } else { "else if" };
        out.push_str(&format!(
            "{keyword} {} {{\n    {}\n}} ",
            expr(eq.condition.as_deref().unwrap()),
            apply(assignment, target, &expr(&eq.expression))
        ));
    }
    match default {
        Some(eq) => out.push_str(&format!("else {{\n    {}\n}}", apply(assignment, target, &expr(&eq.expression)))),
        None => out.push_str("else {}"),
    }
    out
}

/// Render `var`'s equations as a Rust statement assigning `target` (e.g.
/// `self.x`). The unconditioned arm, if present, becomes the trailing
/// `else`; if none exists, the chain falls through to `target`'s previous
/// value (a no-op `else {}` arm): a variable with no matching condition
/// this cycle keeps its prior value.
pub fn render_assignment(var: &Variable, target: &str, expr: impl Fn(&str) -> String) -> String {
    render_chain(var, target, Assignment::Replace, &expr)
}

/// Like [`render_assignment`], but applies `var`'s own combiner operator
/// (`+=`, `*=`, `.min`/`.max`) instead of a plain replace. Used by `update`
/// to accumulate into a combined variable's `next_` buffer rather than
/// clobbering whatever another writer already contributed this tick.
pub fn render_combined_assignment(var: &Variable, target: &str, expr: impl Fn(&str) -> String) -> String {
    render_chain(var, target, var.assignment, &expr)
}
