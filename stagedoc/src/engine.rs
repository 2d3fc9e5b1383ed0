//! The multi-instance workflow engine.
//!
//! `WorkflowEngine` is the library's service front: it owns a catalogue,
//! a rule engine, and a map of workflow instances keyed by UUID. Each
//! instance is guarded by one coarse mutex; operations are infrequent
//! and human-paced, so contention is not a concern, and concurrent lock
//! attempts on the same stage resolve to exactly one winner (the loser
//! observes `StageLockedError`).

use crate::assembly::AssembledDocument;
use crate::catalogue::StageCatalogue;
use crate::errors::{UnknownWorkflowError, WorkflowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::run::StageRun;
use crate::snapshot::WorkflowSnapshot;
use crate::validation::RuleEngine;
use crate::workflow::{WorkflowConfig, WorkflowInstance};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Identifier for a workflow instance.
pub type WorkflowId = Uuid;

/// The workflow service front.
#[derive(Debug)]
pub struct WorkflowEngine {
    catalogue: Arc<StageCatalogue>,
    config: WorkflowConfig,
    rules: RuleEngine,
    sink: Arc<dyn EventSink>,
    instances: DashMap<WorkflowId, Arc<Mutex<WorkflowInstance>>>,
}

impl WorkflowEngine {
    /// Creates an engine over the given catalogue with default config
    /// and no event sink.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::RulePattern`] if the rule engine's
    /// patterns fail to compile.
    pub fn new(catalogue: StageCatalogue) -> Result<Self, WorkflowError> {
        Ok(Self {
            catalogue: Arc::new(catalogue),
            config: WorkflowConfig::default(),
            rules: RuleEngine::new()?,
            sink: Arc::new(NoOpEventSink),
            instances: DashMap::new(),
        })
    }

    /// Sets the per-instance config used for workflows created after
    /// this call.
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The catalogue this engine runs against.
    #[must_use]
    pub fn catalogue(&self) -> &StageCatalogue {
        &self.catalogue
    }

    /// Creates a new workflow instance and returns its id.
    pub fn create_workflow(&self) -> WorkflowId {
        let id = Uuid::new_v4();
        let instance = WorkflowInstance::new(Arc::clone(&self.catalogue), self.config);
        self.instances.insert(id, Arc::new(Mutex::new(instance)));
        info!(workflow_id = %id, "workflow created");
        self.sink
            .emit("workflow.created", Some(json!({ "workflow_id": id })));
        id
    }

    /// Registers a workflow restored from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Propagates restore failures when the snapshot does not match the
    /// engine's catalogue.
    pub fn adopt_workflow(&self, snapshot: &WorkflowSnapshot) -> Result<WorkflowId, WorkflowError> {
        let instance = WorkflowInstance::restore(Arc::clone(&self.catalogue), snapshot)?;
        let id = snapshot.workflow_id;
        self.instances.insert(id, Arc::new(Mutex::new(instance)));
        info!(workflow_id = %id, "workflow adopted from snapshot");
        Ok(id)
    }

    /// Removes a workflow instance. Returns true if it existed.
    pub fn remove_workflow(&self, workflow_id: WorkflowId) -> bool {
        self.instances.remove(&workflow_id).is_some()
    }

    /// Sets or replaces a stage's draft content.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`], or any error from
    /// [`WorkflowInstance::draft`].
    pub fn draft_stage(
        &self,
        workflow_id: WorkflowId,
        stage_id: &str,
        content: impl Into<String>,
    ) -> Result<StageRun, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let mut guard = instance.lock();
        let run = guard.draft(stage_id, content)?.clone();
        self.sink.emit(
            "stage.drafted",
            Some(json!({ "workflow_id": workflow_id, "stage": stage_id })),
        );
        Ok(run)
    }

    /// Marks a drafted stage as ready for review.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`], or any error from
    /// [`WorkflowInstance::confirm`].
    pub fn confirm_stage(
        &self,
        workflow_id: WorkflowId,
        stage_id: &str,
    ) -> Result<StageRun, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let mut guard = instance.lock();
        let run = guard.confirm(stage_id)?.clone();
        self.sink.emit(
            "stage.confirmed",
            Some(json!({ "workflow_id": workflow_id, "stage": stage_id })),
        );
        Ok(run)
    }

    /// Locks a carried-forward stage.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`], or any error from
    /// [`WorkflowInstance::lock`].
    pub fn lock_stage(
        &self,
        workflow_id: WorkflowId,
        stage_id: &str,
    ) -> Result<StageRun, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let mut guard = instance.lock();
        let run = guard.lock(stage_id, &self.rules)?.clone();
        self.sink.emit(
            "stage.locked",
            Some(json!({
                "workflow_id": workflow_id,
                "stage": stage_id,
                "digest": run.locked_digest,
            })),
        );
        Ok(run)
    }

    /// Administratively reopens a stage.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`], or any error from
    /// [`WorkflowInstance::reset`].
    pub fn reset_stage(
        &self,
        workflow_id: WorkflowId,
        stage_id: &str,
    ) -> Result<StageRun, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let mut guard = instance.lock();
        let run = guard.reset(stage_id)?.clone();
        self.sink.emit(
            "stage.reset",
            Some(json!({ "workflow_id": workflow_id, "stage": stage_id })),
        );
        Ok(run)
    }

    /// Assembles the final document for a workflow.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`], or
    /// [`WorkflowError::IncompleteWorkflow`] listing unlocked stages.
    pub fn assemble(&self, workflow_id: WorkflowId) -> Result<AssembledDocument, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let mut guard = instance.lock();
        let document = guard.assemble()?;
        self.sink.emit(
            "workflow.assembled",
            Some(json!({ "workflow_id": workflow_id, "digest": document.digest })),
        );
        Ok(document)
    }

    /// Captures a read-only snapshot of a workflow for progress
    /// rendering or persistence.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::UnknownWorkflow`].
    pub fn get_state(&self, workflow_id: WorkflowId) -> Result<WorkflowSnapshot, WorkflowError> {
        let instance = self.instance(workflow_id)?;
        let guard = instance.lock();
        Ok(guard.snapshot(workflow_id))
    }

    fn instance(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<Arc<Mutex<WorkflowInstance>>, UnknownWorkflowError> {
        self.instances
            .get(&workflow_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| UnknownWorkflowError::new(workflow_id.to_string()))
    }
}
