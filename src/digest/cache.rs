//! Digest-result cache / checkpoint format ("Lifecycle": digest
//! freezes a [`Model`] once complete, so a digested model is immutable
//! and safe to persist). Stored as `bincode` rather than the driver's
//! human-facing JSON dump (`n2a-dump`'s job) since this format's only
//! reader is this crate itself, re-loading a checkpoint to resume a
//! long-running compile without re-running the twenty-stage pipeline.

use crate::ast::Model;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A digested [`Model`] plus the trace of which stages produced it,
/// keyed by a digest of the model's own source text so a stale
/// checkpoint (source changed since it was written) is detected instead
/// of silently reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub source_hash: u64,
    pub model: Model,
}

/// FNV-1a over the raw model source, used to invalidate a checkpoint
/// whose source has since changed. Not cryptographic; this only guards
/// against accidental reuse, not tampering.
pub fn source_hash(source: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in source.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Write a checkpoint to `path`, overwriting any existing file.
pub fn save(path: &Path, source: &str, model: &Model) -> io::Result<()> {
    let checkpoint = Checkpoint { source_hash: source_hash(source), model: model.clone() };
    let bytes = bincode::serialize(&checkpoint)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, bytes)
}

/// Load a checkpoint from `path` and return its digested [`Model`], but
/// only if `source` still hashes to the value it was written with.
pub fn load_if_fresh(path: &Path, source: &str) -> io::Result<Option<Model>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    let checkpoint: Checkpoint =
        bincode::deserialize(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if checkpoint.source_hash != source_hash(source) {
        return Ok(None);
    }
    Ok(Some(checkpoint.model))
}
