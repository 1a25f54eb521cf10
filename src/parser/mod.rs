//! # N2A Model Parser
//!
//! Parses the textual node-tree format described in the into a forest of
//! [`RawNode`]s, then lifts that forest into a [`Model`] of [`EquationSet`]s
//! and [`Variable`]s. Indentation (consistent runs of leading spaces or a
//! single tab per level) determines nesting.
//!
//! Equation values have the form `[condition@]expression[;unit][?hint]`
//!; combiners are inferred from an explicit prefix (`+=`, `*=`,
//! `/=`, `<<=`, `>>=`) on the key.

use crate::ast::{Assignment, Equation, EquationSet, Model, RawNode, Variable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
impl std::error::Error for ParseError {}

/// Parse model source text into a forest of [`RawNode`]s (one per top-level
/// key). Each non-blank, non-comment line contributes one node; indentation
/// depth determines parent/child nesting.
pub fn parse_nodes(source: &str) -> Result<Vec<RawNode>, ParseError> {
    struct Frame {
        indent: usize,
        node: RawNode,
    }

    fn attach(stack: &mut Vec<Frame>, roots: &mut Vec<RawNode>, node: RawNode) {
        match stack.last_mut() {
            Some(parent) => parent.node.children.push(node),
            None => roots.push(node),
        }
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut roots: Vec<RawNode> = Vec::new();

    for (line_no, raw_line) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = raw_line.trim_end();
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }

        let indent = leading_width(trimmed);
        let content = trimmed.trim_start();
        let (key, value) = split_key_value(content);

        let node = RawNode {
            key: key.to_string(),
            value: value.map(str::to_string),
            children: Vec::new(),
        };

        while let Some(top) = stack.last() {
            if top.indent >= indent {
                let finished = stack.pop().unwrap();
                attach(&mut stack, &mut roots, finished.node);
            } else {
                break;
            }
        }

        if let Some(top) = stack.last() {
            if indent <= top.indent {
                return Err(ParseError {
                    line: line_no,
                    message: "inconsistent indentation".to_string(),
                });
            }
        }

        stack.push(Frame { indent, node });
    }

    while let Some(finished) = stack.pop() {
        attach(&mut stack, &mut roots, finished.node);
    }

    Ok(roots)
}

fn leading_width(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn split_key_value(content: &str) -> (&str, Option<&str>) {
    match content.split_once(':') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (content.trim(), None),
    }
}

/// Build a single-compartment [`Model`] from one equation body: each line is
/// `name[op]: [condition@]expression`. This is the entry point used by
/// [`crate::digest`] scenario tests and the `n2a-dump` binary for quick
/// single-part models; whole hierarchies go through [`parse_model`].
pub fn parse_rule(name: &str, body: &str) -> Result<EquationSet, ParseError> {
    let mut part = EquationSet::new(name);
    for (line_no, raw_line) in body.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (lhs, rhs) = line.split_once('=').ok_or_else(|| ParseError {
            line: line_no,
            message: format!("expected `name = expression`, got `{line}`"),
        })?;
        let lhs = lhs.trim();
        let (var_name, assignment) = strip_combiner(lhs);
        let rhs = rhs.trim();
        let (condition, expression) = match rhs.split_once('@') {
            Some((cond, expr)) => (Some(cond.trim().to_string()), expr.trim().to_string()),
            None => (None, rhs.to_string()),
        };

        let idx = part.find_variable(var_name);
        let var = match idx {
            Some(i) => &mut part.variables[i],
            None => {
                part.variables.push(Variable::new(var_name));
                part.variables.last_mut().unwrap()
            }
        };
        var.assignment = assignment;
        var.equations.push(Equation {
            condition,
            expression,
            exponent_next: None,
        });
    }
    Ok(part)
}

/// Build a whole [`Model`] from a single top-level part definition. Reuses
/// [`parse_rule`] for the body and wraps it as the model root.
pub fn parse_model(name: &str, body: &str) -> Result<Model, ParseError> {
    Ok(Model::new(parse_rule(name, body)?))
}

/// Build a full [`Model`] from model source text, lifting the entire
/// [`parse_nodes`] forest (not just one flat part) into nested
/// [`EquationSet`]s the way a real model file's hierarchy does: a tree
/// of named nodes where nested children represent part composition. A
/// child node with its own children is a nested part;
/// a childless node is a variable equation line. The first top-level
/// node becomes the model root; any further top-level nodes are
/// attached as siblings under it.
pub fn parse_hierarchy(source: &str) -> Result<Model, ParseError> {
    let mut roots = parse_nodes(source)?.into_iter();
    let first = roots.next().ok_or_else(|| ParseError { line: 1, message: "empty model".to_string() })?;

    let mut model = Model::new(EquationSet::new(&first.key));
    lift_children(&mut model, model.root, &first)?;

    for extra in roots {
        let idx = model.add_part(model.root, EquationSet::new(&extra.key));
        lift_children(&mut model, idx, &extra)?;
    }
    Ok(model)
}

fn lift_children(model: &mut Model, parent_idx: usize, node: &RawNode) -> Result<(), ParseError> {
    for child in &node.children {
        if child.children.is_empty() {
            apply_variable_line(model.part_mut(parent_idx), &child.key, child.value.as_deref().unwrap_or(""))?;
        } else {
            let child_idx = model.add_part(parent_idx, EquationSet::new(&child.key));
            lift_children(model, child_idx, child)?;
        }
    }
    Ok(())
}

/// Apply one `key: value` node as an equation on `set`, splitting the
/// value into `[condition@]expression` (the `;unit`/`?hint`
/// suffixes are left in the expression text for the digest's units
/// stage to split, rather than duplicating that parsing here).
fn apply_variable_line(set: &mut EquationSet, key: &str, value: &str) -> Result<(), ParseError> {
    let (var_name, assignment) = strip_combiner(key);
    let (condition, expression) = match value.split_once('@') {
        Some((cond, expr)) => (Some(cond.trim().to_string()), expr.trim().to_string()),
        None => (None, value.trim().to_string()),
    };

    let idx = set.find_variable(var_name);
    let var = match idx {
        Some(i) => &mut set.variables[i],
        None => {
            set.variables.push(Variable::new(var_name));
            set.variables.last_mut().unwrap()
        }
    };
    var.assignment = assignment;
    var.equations.push(Equation { condition, expression, exponent_next: None });
    Ok(())
}

fn strip_combiner(lhs: &str) -> (&str, Assignment) {
    for (suffix, assignment) in [
        ("+=", Assignment::Add),
        ("*=", Assignment::Multiply),
        ("/=", Assignment::Divide),
        ("<<=", Assignment::Min),
        (">>=", Assignment::Max),
    ] {
        if let Some(name) = lhs.strip_suffix(suffix) {
            return (name.trim(), assignment);
        }
    }
    (lhs, Assignment::Replace)
}
