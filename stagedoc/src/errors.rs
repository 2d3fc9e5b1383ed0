//! Error types for the stagedoc workflow engine.
//!
//! Every error here represents a rejected operation on a single workflow
//! instance. Nothing is fatal to the process; other instances and the
//! stage catalogue are unaffected.

use crate::validation::RuleViolation;
use thiserror::Error;

/// The main error type for stagedoc operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A referenced stage id is not in the catalogue.
    #[error("{0}")]
    UnknownStage(#[from] UnknownStageError),

    /// A referenced workflow id is not registered with the engine.
    #[error("{0}")]
    UnknownWorkflow(#[from] UnknownWorkflowError),

    /// A mutation was attempted on a locked stage.
    #[error("{0}")]
    StageLocked(#[from] StageLockedError),

    /// An operation was attempted on a stage in the wrong status.
    #[error("{0}")]
    InvalidStatus(#[from] InvalidStatusError),

    /// A lock was attempted while an earlier stage is still unlocked.
    #[error("{0}")]
    OutOfOrderLock(#[from] OutOfOrderLockError),

    /// One or more compliance rules failed during a lock attempt.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// Assembly was attempted before all carried-forward stages were locked.
    #[error("{0}")]
    IncompleteWorkflow(#[from] IncompleteWorkflowError),

    /// A reset was refused because it would invalidate downstream locks.
    #[error("{0}")]
    ResetForbidden(#[from] ResetForbiddenError),

    /// The stage catalogue itself is malformed.
    #[error("{0}")]
    Catalogue(#[from] CatalogueError),

    /// A compliance rule pattern failed to compile.
    #[error("{0}")]
    RulePattern(#[from] RulePatternError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error raised when a stage id is not present in the catalogue.
#[derive(Debug, Clone, Error)]
#[error("Unknown stage: '{stage}'")]
pub struct UnknownStageError {
    /// The unrecognized stage id.
    pub stage: String,
}

impl UnknownStageError {
    /// Creates a new unknown stage error.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

/// Error raised when a workflow id is not registered with the engine.
#[derive(Debug, Clone, Error)]
#[error("Unknown workflow: '{workflow_id}'")]
pub struct UnknownWorkflowError {
    /// The unrecognized workflow id.
    pub workflow_id: String,
}

impl UnknownWorkflowError {
    /// Creates a new unknown workflow error.
    #[must_use]
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
        }
    }
}

/// Error raised when mutating a stage that is already locked.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' is locked and cannot be modified")]
pub struct StageLockedError {
    /// The locked stage id.
    pub stage: String,
}

impl StageLockedError {
    /// Creates a new stage locked error.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }
}

/// Error raised when an operation finds a stage in an unexpected status.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' is '{actual}', expected {expected}")]
pub struct InvalidStatusError {
    /// The stage id.
    pub stage: String,
    /// The status the stage is actually in.
    pub actual: String,
    /// A description of the statuses the operation accepts.
    pub expected: String,
}

impl InvalidStatusError {
    /// Creates a new invalid status error.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            actual: actual.into(),
            expected: expected.into(),
        }
    }
}

/// Error raised when locking a stage before its predecessors are locked.
///
/// Names the first unmet predecessor so the caller knows exactly which
/// stage to finish next.
#[derive(Debug, Clone, Error)]
#[error("Cannot lock stage '{stage}': stage '{blocking_stage}' must be locked first")]
pub struct OutOfOrderLockError {
    /// The stage the caller attempted to lock.
    pub stage: String,
    /// The earliest carried-forward predecessor that is not yet locked.
    pub blocking_stage: String,
}

impl OutOfOrderLockError {
    /// Creates a new out-of-order lock error.
    #[must_use]
    pub fn new(stage: impl Into<String>, blocking_stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            blocking_stage: blocking_stage.into(),
        }
    }
}

/// Error carrying the full list of compliance rule violations for a stage.
///
/// A lock attempt fails atomically: all violated rules are reported at
/// once so the caller can fix everything in one pass.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' failed {} compliance rule(s): {}", violations.len(), summary(violations))]
pub struct ValidationFailure {
    /// The stage that failed validation.
    pub stage: String,
    /// Every violated rule with its human-readable reason.
    pub violations: Vec<RuleViolation>,
}

impl ValidationFailure {
    /// Creates a new validation failure.
    #[must_use]
    pub fn new(stage: impl Into<String>, violations: Vec<RuleViolation>) -> Self {
        Self {
            stage: stage.into(),
            violations,
        }
    }
}

fn summary(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(|v| v.reason.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised when assembling before all carried-forward stages are locked.
#[derive(Debug, Clone, Error)]
#[error("Workflow is incomplete: stages not yet locked: {}", missing.join(", "))]
pub struct IncompleteWorkflowError {
    /// The ids of every carried-forward stage that is not locked.
    pub missing: Vec<String>,
}

impl IncompleteWorkflowError {
    /// Creates a new incomplete workflow error.
    #[must_use]
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

/// Error raised when a reset would silently invalidate downstream locks.
#[derive(Debug, Clone, Error)]
#[error("Cannot reset stage '{stage}': later stage '{locked_successor}' is already locked")]
pub struct ResetForbiddenError {
    /// The stage the caller attempted to reset.
    pub stage: String,
    /// A later carried-forward stage that is already locked.
    pub locked_successor: String,
}

impl ResetForbiddenError {
    /// Creates a new reset forbidden error.
    #[must_use]
    pub fn new(stage: impl Into<String>, locked_successor: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            locked_successor: locked_successor.into(),
        }
    }
}

/// Error raised when building a malformed stage catalogue.
#[derive(Debug, Clone, Error)]
#[error("Invalid catalogue: {reason}")]
pub struct CatalogueError {
    /// Why the catalogue is invalid.
    pub reason: String,
}

impl CatalogueError {
    /// Creates a new catalogue error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Error raised when a compliance rule pattern fails to compile.
#[derive(Debug, Error)]
#[error("Invalid rule pattern '{pattern}': {source}")]
pub struct RulePatternError {
    /// The offending pattern.
    pub pattern: String,
    /// The underlying regex error.
    #[source]
    pub source: regex::Error,
}

impl RulePatternError {
    /// Creates a new rule pattern error.
    #[must_use]
    pub fn new(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self {
            pattern: pattern.into(),
            source,
        }
    }
}
