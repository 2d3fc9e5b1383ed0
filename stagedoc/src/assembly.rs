//! Final document assembly.
//!
//! Assembly concatenates the locked content of every carried-forward
//! stage, in sequence order and byte-for-byte as stored, behind a
//! generated table of contents. No re-formatting, no re-wording, no
//! omission.

use crate::catalogue::StageCatalogue;
use crate::errors::IncompleteWorkflowError;
use crate::run::StageRun;
use crate::transitions::unlocked_carried_stages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// The carried-forward stage this entry points at.
    pub stage_id: String,
    /// The entry text: the section's own first-level heading, verbatim,
    /// or the stage title when the section has no heading.
    pub heading: String,
}

/// The assembled output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledDocument {
    /// The full document: table of contents followed by the locked
    /// section bodies in sequence order.
    pub document: String,
    /// The generated table of contents, one entry per carried stage.
    pub toc: Vec<TocEntry>,
    /// When assembly ran.
    pub assembled_at: DateTime<Utc>,
    /// Hex sha256 of the document bytes.
    pub digest: String,
}

/// Extracts the first first-level markdown heading from a content block.
///
/// Only `# ` headings count; deeper headings belong to the section body.
#[must_use]
pub fn first_heading(content: &str) -> Option<&str> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix("# ")?;
        let trimmed = rest.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

/// Computes the hex sha256 digest of a byte slice.
#[must_use]
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Assembles the final document from the locked carried-forward stages.
///
/// The run list must share the catalogue's ordering. Gating stages are
/// excluded even when they hold content. A locked-but-empty section is
/// still emitted so the table of contents and the body stay in
/// correspondence.
///
/// # Errors
///
/// Returns [`IncompleteWorkflowError`] listing every carried-forward
/// stage that is not yet locked.
pub fn assemble(
    catalogue: &StageCatalogue,
    runs: &[StageRun],
) -> Result<AssembledDocument, IncompleteWorkflowError> {
    let missing = unlocked_carried_stages(catalogue, runs);
    if !missing.is_empty() {
        return Err(IncompleteWorkflowError::new(missing));
    }

    let mut toc = Vec::new();
    let mut sections = Vec::new();
    for definition in catalogue.carried_forward() {
        let run = &runs[definition.sequence_position];
        let heading = first_heading(&run.content).unwrap_or(&definition.title);
        toc.push(TocEntry {
            stage_id: definition.id.clone(),
            heading: heading.to_string(),
        });
        sections.push(run.content.as_str());
    }

    let mut document = String::from("# Table of Contents\n\n");
    for (i, entry) in toc.iter().enumerate() {
        document.push_str(&format!("{}. {}\n", i + 1, entry.heading));
    }
    document.push('\n');
    document.push_str(&sections.join("\n\n"));

    let digest = content_digest(document.as_bytes());
    Ok(AssembledDocument {
        document,
        toc,
        assembled_at: Utc::now(),
        digest,
    })
}
