//! Stage 1: collect, resolve and purge pins.
//!
//! A "pin" is a connection binding whose alias is declared more than once
//! in the same part (the model-text equivalent of redeclaring a formal
//! parameter) — the last declaration wins and earlier ones are purged
//! before anything downstream tries to resolve them. This also verifies
//! the arena's container back-pointers are consistent, sanity-checking a
//! freshly parsed tree before anything downstream relies on its shape.

use crate::ast::Model;
use crate::error::{DigestError, DigestErrorKind};

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    let mut errors = Vec::new();

    for idx in 0..model.parts.len() {
        for &child in model.parts[idx].parts.clone().iter() {
            if model.parts[child].container != Some(idx) {
                errors.push(DigestError::new(
                    DigestErrorKind::UnresolvedReference,
                    model.path_of(idx),
                    format!(
                        "child part `{}` does not point back to its container",
                        model.parts[child].name
                    ),
                ));
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    for part in &mut model.parts {
        let mut seen = std::collections::HashSet::new();
        part.connection_bindings.retain(|b| seen.insert(b.alias.clone()));
        for (i, binding) in part.connection_bindings.iter_mut().enumerate() {
            binding.index = i;
        }
    }

    Ok(())
}
