//! I/O holder error types.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed input matrix in {0}, falling back to 1x1 zero")]
    IllFormedMatrix(String),

    #[error("missing input file: {0}")]
    MissingFile(String),

    #[error("image format not found for {0}, falling back to BMP")]
    ImageFormatNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
