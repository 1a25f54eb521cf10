//! Stage 20: event analysis.
//!
//! Classifies each variable whose condition text crosses a threshold
//! (`> 0`, `< 0`, `== 0`) as an [`EventSource`] with the corresponding
//! [`TriggerEdge`], and each connection binding with a delay annotation
//! (`delay(expr)` in its resolution target) as an [`EventTarget`]. These
//! feed the generated `EventStep`/`EventSpike`/`EventSpikeLatch` dispatch
//! in `crate::runtime::event_queue`.

use crate::ast::Model;
use crate::digest::BackendData;
use crate::error::DigestError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerEdge {
    Rising,
    Falling,
    Change,
    Nonzero,
}

impl TriggerEdge {
    /// Whether the edge fires between consecutive samples `before -> after`.
    pub fn fires(self, before: f64, after: f64) -> bool {
        match self {
            TriggerEdge::Rising => before == 0.0 && after != 0.0,
            TriggerEdge::Falling => before != 0.0 && after == 0.0,
            TriggerEdge::Change => before != after,
            TriggerEdge::Nonzero => after != 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    pub variable: String,
    pub edge: TriggerEdge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTarget {
    pub part: String,
    pub delay: Option<String>,
}

fn classify(condition: &str) -> Option<TriggerEdge> {
    let c = condition.replace(' ', "");
    if c.contains("!=") {
        Some(TriggerEdge::Change)
    } else if c.contains(">0") {
        Some(TriggerEdge::Rising)
    } else if c.contains("<0") {
        Some(TriggerEdge::Falling)
    } else if c.contains("==0") {
        Some(TriggerEdge::Nonzero)
    } else {
        None
    }
}

fn parse_delay(endpoint: &str) -> Option<String> {
    let rest = endpoint.strip_prefix("delay(")?;
    Some(rest.strip_suffix(')')?.to_string())
}

pub fn run(model: &mut Model) -> Result<(), Vec<DigestError>> {
    for idx in 0..model.parts.len() {
        let part = &model.parts[idx];
        let sources: Vec<EventSource> = part
            .variables
            .iter()
            .flat_map(|v| v.equations.iter().filter_map(|eq| eq.condition.as_deref().and_then(classify).map(|edge| EventSource { variable: v.name.clone(), edge })))
            .collect();
        let targets: Vec<EventTarget> = part
            .connection_bindings
            .iter()
            .map(|b| EventTarget { part: b.endpoint.clone(), delay: parse_delay(&b.endpoint) })
            .collect();

        let backend = model.parts[idx].backend_data.get_or_insert_with(BackendData::default);
        backend.event_sources = sources;
        backend.event_targets = targets;
        backend.delays = backend.event_targets.iter().filter(|t| t.delay.is_some()).count();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Equation, EquationSet, Variable};

    #[test]
    fn rising_threshold_condition_is_classified_as_an_event_source() {
        let mut set = EquationSet::new("Neuron");
        let mut spike = Variable::new("fire");
        spike.equations.push(Equation::conditional("V > 0", "1"));
        set.variables.push(spike);
        let mut model = Model::new(set);

        run(&mut model).unwrap();
        let backend = model.part(model.root).backend_data.as_ref().unwrap();
        assert_eq!(backend.event_sources.len(), 1);
        assert_eq!(backend.event_sources[0].edge, TriggerEdge::Rising);
    }

    #[test]
    fn edge_fires_matches_spec_eight_truth_table() {
        assert!(TriggerEdge::Rising.fires(0.0, 1.0));
        assert!(!TriggerEdge::Rising.fires(1.0, 2.0));
        assert!(TriggerEdge::Falling.fires(1.0, 0.0));
        assert!(!TriggerEdge::Falling.fires(0.0, 0.0));
        assert!(TriggerEdge::Change.fires(1.0, 2.0));
        assert!(!TriggerEdge::Change.fires(1.0, 1.0));
        assert!(TriggerEdge::Nonzero.fires(0.0, 3.0));
        assert!(!TriggerEdge::Nonzero.fires(3.0, 0.0));
    }
}
