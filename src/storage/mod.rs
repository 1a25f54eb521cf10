//! # I/O Holders
//!
//! Process-scoped (or thread-local, under the `tls-simulator` feature)
//! streams the generated simulation reads and writes:
//! `InputHolder`, `OutputHolder`, `ImageInput`/`ImageOutput`,
//! `MatrixInput`, and `Mfile`, all owned by the [`holders::Holders`]
//! registry for the duration of one run.
//!
//! One submodule per format concern, a shared `error` module, and
//! re-exports at the top level for the delimited-text and BMP formats
//! this crate supports.

pub mod error;
pub mod holders;
pub mod image;
pub mod input;
pub mod matrix;
pub mod output;

pub use error::{StorageError, StorageResult};
pub use holders::{with_global, Holders};
pub use image::{new_job_directory, ImageBuffer, ImageInput, ImageOutput};
pub use input::{Delimiter, InputHolder};
pub use matrix::{Mfile, MatrixInput};
pub use output::{ColumnMode, OutputHolder};
