//! `MatrixInput` and `Mfile`: reading a dense numeric
//! matrix from a delimited text file, and loading/saving the node-tree
//! model format ([`crate::parser`]) as a named disk file.

use crate::ast::RawNode;
use crate::parser::{self, ParseError};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::input::Delimiter;
use std::fs;
use std::path::Path;

/// A dense `rows x cols` matrix read from a delimited text file. Falls
/// back to a 1x1 zero matrix on malformed input rather than aborting
/// ("ill-formed input matrix ... fall back to 1x1 zero with a
/// warning").
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixInput {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl MatrixInput {
    pub fn zero() -> Self {
        MatrixInput { rows: 1, cols: 1, data: vec![0.0] }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn open(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(_) => MatrixInput::zero(),
        }
    }

    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let Some(first) = lines.first() else { return MatrixInput::zero() };
        let sep = Delimiter::detect(first).unwrap_or(Delimiter::Space).as_char();

        let mut data = Vec::new();
        let mut width = None;
        for line in &lines {
            let row: Vec<f64> = line.split(sep).filter(|t| !t.trim().is_empty()).map(|t| t.trim().parse::<f64>().unwrap_or(f64::NAN)).collect();
            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => return MatrixInput::zero(),
                _ => {}
            }
            data.extend(row);
        }
        match width {
            Some(cols) if cols > 0 && !data.iter().any(|v| v.is_nan()) => {
                MatrixInput { rows: lines.len(), cols, data }
            }
            _ => MatrixInput::zero(),
        }
    }

    pub fn try_open(path: &Path) -> StorageResult<Self> {
        let text = fs::read_to_string(path).map_err(|_| StorageError::MissingFile(path.display().to_string()))?;
        Ok(Self::parse(&text))
    }
}

/// A model file bound to disk: the node-tree text format
/// ([`crate::parser`]) round-tripped through `load`/`save` rather than
/// the compiled [`crate::ast::Model`] the digest pipeline works with.
pub struct Mfile {
    pub roots: Vec<RawNode>,
}

impl Mfile {
    pub fn load(path: &Path) -> StorageResult<Self> {
        let text = fs::read_to_string(path).map_err(|_| StorageError::MissingFile(path.display().to_string()))?;
        let roots = parser::parse_nodes(&text).map_err(|e: ParseError| StorageError::Other(e.to_string()))?;
        Ok(Mfile { roots })
    }

    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let mut text = String::new();
        for root in &self.roots {
            render_node(root, 0, &mut text);
        }
        fs::write(path, text)?;
        Ok(())
    }
}

fn render_node(node: &RawNode, depth: usize, out: &mut String) {
    out.push_str(&" ".repeat(depth * 2));
    out.push_str(&node.key);
    if let Some(value) = &node.value {
        out.push(' ');
        out.push_str(value);
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_well_formed_matrix_parses_into_rows_and_columns() {
        let m = MatrixInput::parse("1 2 3\n4 5 6\n");
        assert_eq!(m.rows, 2);
        assert_eq!(m.cols, 3);
        assert_eq!(m.get(1, 2), 6.0);
    }

    #[test]
    fn a_ragged_matrix_falls_back_to_one_by_one_zero() {
        let m = MatrixInput::parse("1 2 3\n4 5\n");
        assert_eq!(m, MatrixInput::zero());
    }

    #[test]
    fn non_numeric_content_falls_back_to_one_by_one_zero() {
        let m = MatrixInput::parse("a b\nc d\n");
        assert_eq!(m, MatrixInput::zero());
    }

    #[test]
    fn mfile_save_then_load_round_trips_the_node_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.n2a");
        let mut root = RawNode::new("Compartment");
        root.children.push(RawNode { key: "x".into(), value: Some("0".into()), children: vec![] });
        let mfile = Mfile { roots: vec![root] };
        mfile.save(&path).unwrap();

        let loaded = Mfile::load(&path).unwrap();
        assert_eq!(loaded.roots.len(), 1);
        assert_eq!(loaded.roots[0].key, "Compartment");
        assert_eq!(loaded.roots[0].children[0].key, "x");
    }
}
