//! Read-only workflow snapshots.
//!
//! A snapshot is the serializable view handed to the presentation layer
//! for progress rendering, and the on-disk shape used by persistence.

use crate::run::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The captured state of a single stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// The stage id.
    pub stage_id: String,
    /// The stage's human title, copied from the catalogue.
    pub title: String,
    /// Whether this stage's output goes into the assembled document.
    pub carried_forward: bool,
    /// The run status at capture time.
    pub status: RunStatus,
    /// The draft content at capture time (raw markdown blob).
    pub content: String,
    /// When the stage was locked, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    /// Content digest stamped at lock time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_digest: Option<String>,
}

/// A read-only view of one workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// The workflow id.
    pub workflow_id: Uuid,
    /// Whether an explicit confirmation step is required before locking.
    pub require_confirmation: bool,
    /// Per-stage state in sequence order.
    pub stages: Vec<StageSnapshot>,
    /// True when the final document has been assembled.
    pub assembled: bool,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
}

impl WorkflowSnapshot {
    /// Looks up a stage snapshot by id.
    #[must_use]
    pub fn stage(&self, stage_id: &str) -> Option<&StageSnapshot> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    /// Counts the carried-forward stages that are locked.
    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.carried_forward && s.status == RunStatus::Locked)
            .count()
    }
}
