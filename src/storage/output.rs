//! `OutputHolder`: tab-separated output with `$t` pinned to column 0
//! and a sidecar `.columns` metadata file.

use crate::storage::error::StorageResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One output column's header plus its accumulated mode properties
/// (`scale`, `ymin`, `ymax`, ...), rendered into the `.columns` sidecar.
#[derive(Debug, Clone, Default)]
pub struct ColumnMode {
    pub header: String,
    pub properties: Vec<(String, String)>,
}

/// Writes tab-separated rows, `$t` always first ("`OutputHolder`
/// writes tab-separated values with `$t` as column 0").
pub struct OutputHolder<W: Write> {
    writer: W,
    columns: Vec<ColumnMode>,
}

impl OutputHolder<BufWriter<File>> {
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = File::create(path)?;
        Ok(OutputHolder::new(BufWriter::new(file)))
    }
}

impl<W: Write> OutputHolder<W> {
    pub fn new(writer: W) -> Self {
        OutputHolder { writer, columns: Vec::new() }
    }

    pub fn register_column(&mut self, header: impl Into<String>) -> usize {
        self.columns.push(ColumnMode { header: header.into(), properties: Vec::new() });
        self.columns.len() - 1
    }

    pub fn set_property(&mut self, column: usize, key: impl Into<String>, value: impl Into<String>) {
        if let Some(col) = self.columns.get_mut(column) {
            col.properties.push((key.into(), value.into()));
        }
    }

    /// Write one row: `$t` then every registered column value, in
    /// registration order. NaNs are written as blank cells.
    pub fn write_row(&mut self, t: f64, values: &[f64]) -> StorageResult<()> {
        write!(self.writer, "{}", format_cell(t))?;
        for v in values {
            write!(self.writer, "\t{}", format_cell(*v))?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn flush(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Render the `.columns` sidecar: `N2A.schema=3`, then one `i:header`
    /// line per column with its mode properties indented beneath it.
    pub fn columns_sidecar(&self) -> String {
        let mut out = String::from("N2A.schema=3\n");
        for (i, col) in self.columns.iter().enumerate() {
            out.push_str(&format!("{}:{}\n", i, col.header));
            for (key, value) in &col.properties {
                out.push_str(&format!(" {key}:{value}\n"));
            }
        }
        out
    }

    pub fn write_columns_sidecar(&self, path: &Path) -> StorageResult<()> {
        std::fs::write(path, self.columns_sidecar())?;
        Ok(())
    }
}

fn format_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_row_pins_time_as_the_first_tab_separated_cell() {
        let mut holder = OutputHolder::new(Vec::<u8>::new());
        holder.write_row(0.5, &[1.0, 2.0]).unwrap();
        let text = String::from_utf8(holder.writer).unwrap();
        assert_eq!(text, "0.5\t1\t2\n");
    }

    #[test]
    fn nan_values_are_written_as_blank_cells() {
        let mut holder = OutputHolder::new(Vec::<u8>::new());
        holder.write_row(0.0, &[f64::NAN, 3.0]).unwrap();
        let text = String::from_utf8(holder.writer).unwrap();
        assert_eq!(text, "0\t\t3\n");
    }

    #[test]
    fn columns_sidecar_has_the_documented_schema_header_and_mode_lines() {
        let mut holder = OutputHolder::new(Vec::<u8>::new());
        let v = holder.register_column("V");
        holder.set_property(v, "scale", "1.0");
        let sidecar = holder.columns_sidecar();
        assert_eq!(sidecar, "N2A.schema=3\n0:V\n scale:1.0\n");
    }
}
