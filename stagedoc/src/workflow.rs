//! The workflow instance: per-run state and the transition rules over it.
//!
//! A `WorkflowInstance` exclusively owns one [`StageRun`] per catalogue
//! stage. Stages are drafted, optionally confirmed, then locked strictly
//! left-to-right among the carried-forward stages; once every carried
//! stage is locked the instance can assemble the final document.

use crate::assembly::{self, AssembledDocument};
use crate::catalogue::StageCatalogue;
use crate::errors::{
    InvalidStatusError, ResetForbiddenError, StageLockedError, UnknownStageError,
    ValidationFailure, WorkflowError,
};
use crate::run::{RunStatus, StageRun};
use crate::snapshot::{StageSnapshot, WorkflowSnapshot};
use crate::transitions;
use crate::validation::RuleEngine;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Per-instance behavior switches.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowConfig {
    /// When true (the default), a stage must pass through
    /// `AwaitingConfirmation` before it can be locked. When false, a
    /// stage may be locked straight from `Drafting`. Either way, locking
    /// requires a non-empty draft.
    pub require_confirmation: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
        }
    }
}

/// One in-flight workflow: the mutable counterpart of a [`StageCatalogue`].
#[derive(Debug)]
pub struct WorkflowInstance {
    catalogue: Arc<StageCatalogue>,
    config: WorkflowConfig,
    runs: Vec<StageRun>,
    assembled: Option<AssembledDocument>,
}

impl WorkflowInstance {
    /// Creates a fresh instance with every stage `NotStarted`.
    #[must_use]
    pub fn new(catalogue: Arc<StageCatalogue>, config: WorkflowConfig) -> Self {
        let runs = catalogue
            .stages()
            .iter()
            .map(|d| StageRun::new(&d.id))
            .collect();
        Self {
            catalogue,
            config,
            runs,
            assembled: None,
        }
    }

    /// The catalogue this instance runs against.
    #[must_use]
    pub fn catalogue(&self) -> &StageCatalogue {
        &self.catalogue
    }

    /// Returns the run for a stage.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStageError`] for ids not in the catalogue.
    pub fn run(&self, stage_id: &str) -> Result<&StageRun, UnknownStageError> {
        let definition = self.catalogue.get(stage_id)?;
        Ok(&self.runs[definition.sequence_position])
    }

    /// The assembled document, if assembly has run since the last reset.
    #[must_use]
    pub fn assembled(&self) -> Option<&AssembledDocument> {
        self.assembled.as_ref()
    }

    /// Sets or replaces a stage's draft content.
    ///
    /// Carried-forward stages may only be drafted once every gating stage
    /// is confirmed. Redrafting a confirmed gating stage returns it to
    /// `Drafting`, so it must be confirmed again.
    ///
    /// # Errors
    ///
    /// [`StageLockedError`] for locked stages, [`InvalidStatusError`]
    /// when gating is incomplete, [`UnknownStageError`] for bad ids.
    pub fn draft(
        &mut self,
        stage_id: &str,
        content: impl Into<String>,
    ) -> Result<&StageRun, WorkflowError> {
        let definition = self.catalogue.get(stage_id)?;
        let position = definition.sequence_position;

        if self.runs[position].is_locked() {
            return Err(StageLockedError::new(stage_id).into());
        }
        if definition.carried_forward {
            transitions::require_gating_confirmed(&self.catalogue, &self.runs)?;
        }

        let run = &mut self.runs[position];
        run.content = content.into();
        run.status = RunStatus::Drafting;
        debug!(stage = stage_id, "stage drafted");
        Ok(run)
    }

    /// Marks a drafted stage as ready for review.
    ///
    /// Gating stages transition to their terminal `Confirmed` status;
    /// carried-forward stages transition to `AwaitingConfirmation`.
    ///
    /// # Errors
    ///
    /// [`InvalidStatusError`] unless the stage is currently `Drafting`;
    /// [`StageLockedError`] if it is already locked.
    pub fn confirm(&mut self, stage_id: &str) -> Result<&StageRun, WorkflowError> {
        let definition = self.catalogue.get(stage_id)?;
        let position = definition.sequence_position;
        let carried = definition.carried_forward;

        let run = &mut self.runs[position];
        match run.status {
            RunStatus::Locked => Err(StageLockedError::new(stage_id).into()),
            RunStatus::Drafting => {
                run.status = if carried {
                    RunStatus::AwaitingConfirmation
                } else {
                    RunStatus::Confirmed
                };
                debug!(stage = stage_id, status = %run.status, "stage confirmed");
                Ok(&*run)
            }
            other => {
                Err(InvalidStatusError::new(stage_id, other.to_string(), "drafting").into())
            }
        }
    }

    /// Locks a carried-forward stage, freezing its content.
    ///
    /// Follows the gating algorithm: status precondition, strict
    /// left-to-right predecessor ordering, then compliance validation.
    /// Validation failures are atomic: every violated rule is reported
    /// and the stage's status is left unchanged.
    ///
    /// # Errors
    ///
    /// [`InvalidStatusError`], [`OutOfOrderLockError`],
    /// [`ValidationFailure`], [`StageLockedError`], or
    /// [`UnknownStageError`].
    ///
    /// [`OutOfOrderLockError`]: crate::errors::OutOfOrderLockError
    pub fn lock(
        &mut self,
        stage_id: &str,
        rules: &RuleEngine,
    ) -> Result<&StageRun, WorkflowError> {
        let definition = self.catalogue.get(stage_id)?;
        let position = definition.sequence_position;

        if !definition.carried_forward {
            return Err(InvalidStatusError::new(
                stage_id,
                self.runs[position].status.to_string(),
                "a carried-forward stage (gating stages are confirmed, not locked)",
            )
            .into());
        }

        match self.runs[position].status {
            RunStatus::Locked => return Err(StageLockedError::new(stage_id).into()),
            RunStatus::AwaitingConfirmation => {}
            RunStatus::Drafting if !self.config.require_confirmation => {}
            other => {
                let expected = if self.config.require_confirmation {
                    "awaiting_confirmation"
                } else {
                    "drafting or awaiting_confirmation"
                };
                return Err(InvalidStatusError::new(stage_id, other.to_string(), expected).into());
            }
        }

        if let Some(blocking) =
            transitions::first_unlocked_predecessor(&self.catalogue, &self.runs, position)
        {
            return Err(crate::errors::OutOfOrderLockError::new(stage_id, blocking).into());
        }

        let violations = rules.check(definition, &self.runs[position].content);
        if !violations.is_empty() {
            return Err(ValidationFailure::new(stage_id, violations).into());
        }

        let run = &mut self.runs[position];
        run.status = RunStatus::Locked;
        run.locked_at = Some(Utc::now());
        run.locked_digest = Some(assembly::content_digest(run.content.as_bytes()));
        debug!(stage = stage_id, "stage locked");
        Ok(run)
    }

    /// Administratively reopens a stage.
    ///
    /// Refused while any later carried-forward stage is locked, which
    /// would otherwise silently invalidate downstream assembly. On
    /// success the stage returns to `Drafting` with its content intact
    /// and any cached assembled document is discarded.
    ///
    /// # Errors
    ///
    /// [`ResetForbiddenError`] or [`UnknownStageError`].
    pub fn reset(&mut self, stage_id: &str) -> Result<&StageRun, WorkflowError> {
        let definition = self.catalogue.get(stage_id)?;
        let position = definition.sequence_position;

        if let Some(successor) =
            transitions::first_locked_successor(&self.catalogue, &self.runs, position)
        {
            return Err(ResetForbiddenError::new(stage_id, successor).into());
        }

        let run = &mut self.runs[position];
        run.status = if run.content.trim().is_empty() {
            RunStatus::NotStarted
        } else {
            RunStatus::Drafting
        };
        run.locked_at = None;
        run.locked_digest = None;
        self.assembled = None;
        debug!(stage = stage_id, "stage reset");
        Ok(&self.runs[position])
    }

    /// Assembles the final document once all carried stages are locked.
    ///
    /// Idempotent: the result is cached on the instance, so re-invoking
    /// with no intervening state change returns the same bytes.
    ///
    /// # Errors
    ///
    /// [`IncompleteWorkflowError`] listing the unlocked stage ids.
    ///
    /// [`IncompleteWorkflowError`]: crate::errors::IncompleteWorkflowError
    pub fn assemble(&mut self) -> Result<AssembledDocument, WorkflowError> {
        if let Some(document) = &self.assembled {
            return Ok(document.clone());
        }
        let document = assembly::assemble(&self.catalogue, &self.runs)?;
        debug!(digest = %document.digest, "document assembled");
        self.assembled = Some(document.clone());
        Ok(document)
    }

    /// Captures a read-only snapshot of the instance.
    #[must_use]
    pub fn snapshot(&self, workflow_id: Uuid) -> WorkflowSnapshot {
        let stages = self
            .catalogue
            .stages()
            .iter()
            .map(|definition| {
                let run = &self.runs[definition.sequence_position];
                StageSnapshot {
                    stage_id: run.stage_id.clone(),
                    title: definition.title.clone(),
                    carried_forward: definition.carried_forward,
                    status: run.status,
                    content: run.content.clone(),
                    locked_at: run.locked_at,
                    locked_digest: run.locked_digest.clone(),
                }
            })
            .collect();

        WorkflowSnapshot {
            workflow_id,
            require_confirmation: self.config.require_confirmation,
            stages,
            assembled: self.assembled.is_some(),
            taken_at: Utc::now(),
        }
    }

    /// Rebuilds an instance from a persisted snapshot.
    ///
    /// The snapshot's stage list must match the catalogue exactly (same
    /// ids, same order). The assembled document is not restored; it is
    /// recomputed deterministically on the next `assemble` call.
    ///
    /// # Errors
    ///
    /// [`UnknownStageError`] for snapshot stages missing from the
    /// catalogue, [`InvalidStatusError`] when the stage lists disagree.
    pub fn restore(
        catalogue: Arc<StageCatalogue>,
        snapshot: &WorkflowSnapshot,
    ) -> Result<Self, WorkflowError> {
        if snapshot.stages.len() != catalogue.stages().len() {
            return Err(InvalidStatusError::new(
                "<workflow>",
                format!("{} stages in snapshot", snapshot.stages.len()),
                format!("{} stages matching the catalogue", catalogue.stages().len()),
            )
            .into());
        }

        let mut runs = Vec::with_capacity(snapshot.stages.len());
        for (definition, stage) in catalogue.stages().iter().zip(&snapshot.stages) {
            if definition.id != stage.stage_id {
                return Err(UnknownStageError::new(&stage.stage_id).into());
            }
            runs.push(StageRun {
                stage_id: stage.stage_id.clone(),
                content: stage.content.clone(),
                status: stage.status,
                locked_at: stage.locked_at,
                locked_digest: stage.locked_digest.clone(),
            });
        }

        Ok(Self {
            catalogue,
            config: WorkflowConfig {
                require_confirmation: snapshot.require_confirmation,
            },
            runs,
            assembled: None,
        })
    }
}
