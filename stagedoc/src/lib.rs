//! # Stagedoc
//!
//! A staged document-assembly workflow engine.
//!
//! Stagedoc tracks a fixed, ordered catalogue of named stages, each
//! producing a block of markdown content that can be locked, and a final
//! assembly step that concatenates the locked blocks verbatim into one
//! document with a generated table of contents:
//!
//! - **Stage catalogue**: immutable registry of stage descriptors
//! - **Draft/confirm/lock lifecycle**: per-stage status with strict
//!   left-to-right lock ordering among carried-forward stages
//! - **Compliance rules**: declarative checks (bolded metrics, verbatim
//!   quotes, STAR subheadings, no bare links) gating every lock
//! - **Verbatim assembly**: byte-for-byte concatenation, TOC generated
//!   from the sections' own headings, idempotent output
//!
//! ## Quick Start
//!
//! ```rust
//! use stagedoc::prelude::*;
//!
//! # fn main() -> Result<(), stagedoc::errors::WorkflowError> {
//! let engine = WorkflowEngine::new(StageCatalogue::recruiter_prep())?;
//! let id = engine.create_workflow();
//!
//! engine.draft_stage(id, "setup", "candidate profile")?;
//! engine.confirm_stage(id, "setup")?;
//! engine.draft_stage(id, "context", "role context")?;
//! engine.confirm_stage(id, "context")?;
//!
//! engine.draft_stage(id, "stage1", "- **Systems Architect**: cut costs **40%**")?;
//! engine.confirm_stage(id, "stage1")?;
//! engine.lock_stage(id, "stage1")?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod assembly;
pub mod catalogue;
pub mod engine;
pub mod errors;
pub mod events;
pub mod persist;
pub mod run;
pub mod snapshot;
pub mod testing;
pub mod transitions;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assembly::{AssembledDocument, TocEntry};
    pub use crate::catalogue::{StageCatalogue, StageCatalogueBuilder, StageDefinition};
    pub use crate::engine::{WorkflowEngine, WorkflowId};
    pub use crate::errors::{
        IncompleteWorkflowError, InvalidStatusError, OutOfOrderLockError, ResetForbiddenError,
        StageLockedError, UnknownStageError, ValidationFailure, WorkflowError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::run::{RunStatus, StageRun};
    pub use crate::snapshot::{StageSnapshot, WorkflowSnapshot};
    pub use crate::validation::{Rule, RuleEngine, RuleViolation};
    pub use crate::workflow::{WorkflowConfig, WorkflowInstance};
}
