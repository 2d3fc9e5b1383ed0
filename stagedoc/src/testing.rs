//! Test fixtures and helpers.
//!
//! Shared by unit and integration tests; also useful to downstream
//! crates writing tests against the engine.

use crate::catalogue::{StageCatalogue, StageDefinition};
use crate::validation::Rule;
use crate::workflow::{WorkflowConfig, WorkflowInstance};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initializes a tracing subscriber for tests.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Produces draft content satisfying every rule a stage definition carries.
///
/// The content always starts with a first-level heading so assembled
/// tables of contents have a deterministic shape.
#[must_use]
pub fn compliant_content(definition: &StageDefinition) -> String {
    let mut content = format!("# {}\n", definition.title);
    for rule in &definition.rules {
        match rule {
            Rule::BoldedSpan => content.push_str("\n- **Throughput**: up **40%** year over year\n"),
            Rule::VerbatimQuote => {
                content.push_str("\nThe spec asks for \"5+ years of distributed systems\"\n");
            }
            Rule::StarSubheadings => content.push_str(
                "\n## Situation\nLegacy batch job missed its window nightly.\n\
                 ## Task\nGet the pipeline under one hour.\n\
                 ## Action\nRewrote the hot path and parallelized ingestion.\n\
                 ## Result\nRuntime dropped to forty minutes.\n",
            ),
            Rule::NonEmptyDraft | Rule::NoBareLinks => {}
        }
    }
    if definition.rules.is_empty() {
        content.push_str("\nPlain prose section body.\n");
    }
    content
}

/// Draft content that fails the bolded-span rule (and nothing else).
#[must_use]
pub fn content_without_bold() -> String {
    "# Heading\n\nA pitch with no emphasized metric at all.\n".to_string()
}

/// Builds a fresh recruiter-prep instance with both gates confirmed.
///
/// # Panics
///
/// Panics on fixture misuse; intended for tests only.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn gated_instance() -> WorkflowInstance {
    let catalogue = Arc::new(StageCatalogue::recruiter_prep());
    let mut workflow = WorkflowInstance::new(catalogue, WorkflowConfig::default());
    for id in ["setup", "context"] {
        workflow.draft(id, "gating notes").unwrap();
        workflow.confirm(id).unwrap();
    }
    workflow
}

/// Drafts, confirms, and locks every carried-forward stage in order.
///
/// # Panics
///
/// Panics on fixture misuse; intended for tests only.
#[allow(clippy::unwrap_used)]
pub fn lock_all(workflow: &mut WorkflowInstance, rules: &crate::validation::RuleEngine) {
    let stages: Vec<StageDefinition> = workflow
        .catalogue()
        .carried_forward()
        .cloned()
        .collect();
    for definition in stages {
        let content = compliant_content(&definition);
        workflow.draft(&definition.id, content).unwrap();
        workflow.confirm(&definition.id).unwrap();
        workflow.lock(&definition.id, rules).unwrap();
    }
}
