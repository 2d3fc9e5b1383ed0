//! Per-stage run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle status of a stage run.
///
/// Carried-forward stages move `NotStarted -> Drafting ->
/// AwaitingConfirmation -> Locked`. Gating stages (setup/context) move
/// `NotStarted -> Drafting -> Confirmed` and are never locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No draft has been submitted yet.
    NotStarted,
    /// The stage has draft content and may still be revised.
    Drafting,
    /// The draft is ready for user review before locking.
    AwaitingConfirmation,
    /// Terminal status for gating stages; lighter than a lock.
    Confirmed,
    /// Terminal status for carried-forward stages; content is frozen.
    Locked,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Drafting => write!(f, "drafting"),
            Self::AwaitingConfirmation => write!(f, "awaiting_confirmation"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

impl RunStatus {
    /// Returns true if the status is terminal for its stage kind.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Locked)
    }

    /// Returns true if the stage content is frozen.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// The mutable per-run state of one stage.
///
/// Content is mutated repeatedly during drafting and frozen permanently
/// once the status reaches [`RunStatus::Locked`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRun {
    /// The id of the stage definition this run belongs to.
    pub stage_id: String,
    /// Current draft text. Immutable once locked.
    pub content: String,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Set only on the transition to `Locked`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
    /// Hex sha256 of the content, stamped at lock time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_digest: Option<String>,
}

impl StageRun {
    /// Creates a fresh run for a stage.
    #[must_use]
    pub fn new(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            content: String::new(),
            status: RunStatus::NotStarted,
            locked_at: None,
            locked_digest: None,
        }
    }

    /// Returns true if this run's content is frozen.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }
}
