//! Stage 16: `$live` reach-through.
//!
//! A connection's synthesized `$live` expression reads each endpoint's own
//! `$live` variable (stage 15). If an endpoint's `$live` is itself only a
//! local temporary, the endpoint part needs it exposed as an accessor so
//! the connection's generated code can actually reach it across the part
//! boundary. This stage walks every connection binding and promotes the
//! target part's `$live` (or, absent one, its mere existence as
//! preexistent-and-always-true) to accessor visibility.

use crate::ast::Model;
use crate::catalog::Catalog;
use crate::error::DigestError;

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    let catalog = Catalog::build(model);
    let targets: Vec<usize> = model
        .parts
        .iter()
        .filter(|p| p.is_connection())
        .flat_map(|p| p.connection_bindings.iter().filter_map(|b| catalog.find_part(&b.endpoint)))
        .collect();

    for target in targets {
        if let Some(live_idx) = model.parts[target].find_variable("$live") {
            model.parts[target].variables[live_idx].set_attr(crate::ast::ATTR_ACCESSOR);
        }
    }
    Ok(())
}
