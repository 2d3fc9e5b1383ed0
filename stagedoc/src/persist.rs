//! Snapshot persistence.
//!
//! Durability is one JSON document per workflow instance: the snapshot's
//! ordered stage list with status, content (raw markdown blobs), and
//! lock timestamps. No binary formats, no wire protocol.

use crate::errors::WorkflowError;
use crate::snapshot::WorkflowSnapshot;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes a workflow snapshot as pretty-printed JSON.
///
/// The write goes through a sibling temp file and a rename, so a crash
/// mid-write never leaves a truncated document behind.
///
/// # Errors
///
/// Returns [`WorkflowError::Io`] or [`WorkflowError::Serialization`].
pub fn save_snapshot(path: &Path, snapshot: &WorkflowSnapshot) -> Result<(), WorkflowError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    debug!(workflow_id = %snapshot.workflow_id, path = %path.display(), "snapshot saved");
    Ok(())
}

/// Reads a workflow snapshot from a JSON document.
///
/// # Errors
///
/// Returns [`WorkflowError::Io`] or [`WorkflowError::Serialization`].
pub fn load_snapshot(path: &Path) -> Result<WorkflowSnapshot, WorkflowError> {
    let json = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&json)?;
    Ok(snapshot)
}
