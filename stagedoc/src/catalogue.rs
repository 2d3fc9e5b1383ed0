//! The stage catalogue: a fixed, ordered registry of stage definitions.
//!
//! The catalogue is created once at workflow start and is immutable for
//! the life of the run. Sequence positions are assigned from insertion
//! order at build time.

use crate::errors::{CatalogueError, UnknownStageError};
use crate::validation::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The static descriptor for one stage of the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Unique stage id (e.g. "setup", "stage1").
    pub id: String,
    /// Human label (e.g. "Intro / Elevator Pitch").
    pub title: String,
    /// Position defining the allowed lock order. Assigned at build time.
    pub sequence_position: usize,
    /// Whether this stage's locked output is included in final assembly.
    ///
    /// Gating stages (setup/context) are confirmed but never locked or
    /// carried forward.
    pub carried_forward: bool,
    /// Free-text description of the expected structural elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<String>,
    /// Compliance rules checked before this stage may be locked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl StageDefinition {
    /// Creates a new gating (non-carried) stage definition.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sequence_position: 0,
            carried_forward: false,
            output_schema: None,
            rules: Vec::new(),
        }
    }

    /// Sets whether this stage is carried forward into the assembled document.
    #[must_use]
    pub fn carried_forward(mut self, carried: bool) -> Self {
        self.carried_forward = carried;
        self
    }

    /// Sets the expected output structure description.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.output_schema = Some(schema.into());
        self
    }

    /// Replaces the rule list.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// Adds a single rule.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// The immutable, ordered catalogue of stage definitions.
#[derive(Debug, Clone)]
pub struct StageCatalogue {
    stages: Vec<StageDefinition>,
    index: HashMap<String, usize>,
}

impl StageCatalogue {
    /// Starts building a catalogue.
    #[must_use]
    pub fn builder() -> StageCatalogueBuilder {
        StageCatalogueBuilder::default()
    }

    /// Returns all stages in sequence order.
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Looks up a stage by id.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStageError`] if the id is not in the catalogue.
    pub fn get(&self, id: &str) -> Result<&StageDefinition, UnknownStageError> {
        self.index
            .get(id)
            .map(|&i| &self.stages[i])
            .ok_or_else(|| UnknownStageError::new(id))
    }

    /// Returns true if the catalogue contains the given stage id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates the carried-forward stages in sequence order.
    pub fn carried_forward(&self) -> impl Iterator<Item = &StageDefinition> {
        self.stages.iter().filter(|s| s.carried_forward)
    }

    /// Iterates the gating (setup/context) stages in sequence order.
    pub fn gating(&self) -> impl Iterator<Item = &StageDefinition> {
        self.stages.iter().filter(|s| !s.carried_forward)
    }

    /// The canonical recruiter interview-prep catalogue.
    ///
    /// Two gating stages (session setup and role context) followed by the
    /// seven carried-forward document stages.
    ///
    /// # Panics
    ///
    /// Never panics: the built-in definitions are statically valid.
    #[must_use]
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
    pub fn recruiter_prep() -> Self {
        Self::builder()
            .stage(
                StageDefinition::new("setup", "Session Setup")
                    .with_schema("candidate profile, CV summary, target role"),
            )
            .stage(
                StageDefinition::new("context", "Role Context")
                    .with_schema("company, role description, interviewer names"),
            )
            .stage(
                StageDefinition::new("stage1", "Intro / Elevator Pitch")
                    .carried_forward(true)
                    .with_schema("4-6 bullets + 2 alternates")
                    .with_rule(Rule::BoldedSpan),
            )
            .stage(
                StageDefinition::new("stage2", "Career Walkthrough")
                    .carried_forward(true)
                    .with_schema("chronological narrative with one bolded metric per role")
                    .with_rule(Rule::BoldedSpan),
            )
            .stage(
                StageDefinition::new("stage3", "Role Motivation")
                    .carried_forward(true)
                    .with_schema("why this company, why this role, why now"),
            )
            .stage(
                StageDefinition::new("stage4", "Job Spec Annotation")
                    .carried_forward(true)
                    .with_schema("requirement-by-requirement notes quoting the spec verbatim")
                    .with_rule(Rule::VerbatimQuote),
            )
            .stage(
                StageDefinition::new("stage5", "Requirement STAR Stories")
                    .carried_forward(true)
                    .with_schema("expanded STAR block per requirement")
                    .with_rule(Rule::StarSubheadings),
            )
            .stage(
                StageDefinition::new("stage6", "Strengths & Gaps")
                    .carried_forward(true)
                    .with_schema("strengths with bolded evidence, gaps with mitigations")
                    .with_rule(Rule::BoldedSpan),
            )
            .stage(
                StageDefinition::new("stage7", "Questions & Logistics")
                    .carried_forward(true)
                    .with_schema("questions for the interviewer + availability"),
            )
            .build()
            .unwrap()
    }
}

/// Builder for [`StageCatalogue`].
#[derive(Debug, Default)]
pub struct StageCatalogueBuilder {
    stages: Vec<StageDefinition>,
}

impl StageCatalogueBuilder {
    /// Appends a stage definition. Sequence position is assigned from
    /// insertion order when the catalogue is built.
    #[must_use]
    pub fn stage(mut self, definition: StageDefinition) -> Self {
        self.stages.push(definition);
        self
    }

    /// Validates and builds the catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError`] if the catalogue is empty, a stage id is
    /// empty or whitespace-only, an id is duplicated, or no stage is
    /// carried forward.
    pub fn build(self) -> Result<StageCatalogue, CatalogueError> {
        if self.stages.is_empty() {
            return Err(CatalogueError::new("catalogue has no stages"));
        }

        let mut stages = self.stages;
        let mut index = HashMap::new();
        for (position, stage) in stages.iter_mut().enumerate() {
            if stage.id.trim().is_empty() {
                return Err(CatalogueError::new(
                    "stage id cannot be empty or whitespace-only",
                ));
            }
            stage.sequence_position = position;
            if index.insert(stage.id.clone(), position).is_some() {
                return Err(CatalogueError::new(format!(
                    "duplicate stage id: '{}'",
                    stage.id
                )));
            }
        }

        if !stages.iter().any(|s| s.carried_forward) {
            return Err(CatalogueError::new(
                "catalogue has no carried-forward stages; nothing would be assembled",
            ));
        }

        Ok(StageCatalogue { stages, index })
    }
}
