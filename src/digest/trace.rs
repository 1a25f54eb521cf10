//! Ambient diagnostics: a record of which stages ran, for `n2a-dump` and
//! for tests asserting the pipeline reached a particular point before
//! failing.

#[derive(Debug, Clone, Copy)]
pub struct StageStats {
    pub name: &'static str,
    pub order: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DigestTrace {
    pub stages: Vec<StageStats>,
}

impl DigestTrace {
    pub fn ran(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name == name)
    }
}
