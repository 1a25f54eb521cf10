//! Sparse-matrix-driven connection plan.

#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrixPlan {
    pub variable: String,
    pub row_mapping: String,
    pub column_mapping: String,
}
