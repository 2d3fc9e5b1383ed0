//! Ordering and gating checks for stage transitions.
//!
//! These helpers operate over the catalogue and the run list (which share
//! one ordering) and return typed errors naming the exact stage that
//! blocks the requested transition.

use crate::catalogue::StageCatalogue;
use crate::errors::InvalidStatusError;
use crate::run::{RunStatus, StageRun};

/// Verifies every gating stage has been confirmed.
///
/// Gating stages (setup/context) must be `Confirmed` before any
/// carried-forward stage may be drafted at all.
///
/// # Errors
///
/// Returns [`InvalidStatusError`] naming the first unconfirmed gating stage.
pub fn require_gating_confirmed(
    catalogue: &StageCatalogue,
    runs: &[StageRun],
) -> Result<(), InvalidStatusError> {
    for definition in catalogue.gating() {
        let run = &runs[definition.sequence_position];
        if run.status != RunStatus::Confirmed {
            return Err(InvalidStatusError::new(
                &definition.id,
                run.status.to_string(),
                "confirmed (gating stages must be confirmed before drafting begins)",
            ));
        }
    }
    Ok(())
}

/// Finds the first carried-forward stage before `position` that is not
/// yet locked.
///
/// Returns `None` when every carried-forward predecessor is locked, i.e.
/// the stage at `position` is clear to lock.
#[must_use]
pub fn first_unlocked_predecessor<'a>(
    catalogue: &'a StageCatalogue,
    runs: &[StageRun],
    position: usize,
) -> Option<&'a str> {
    catalogue
        .carried_forward()
        .take_while(|d| d.sequence_position < position)
        .find(|d| !runs[d.sequence_position].is_locked())
        .map(|d| d.id.as_str())
}

/// Finds the first carried-forward stage after `position` that is
/// already locked.
///
/// A reset is forbidden while such a stage exists, since reopening an
/// earlier section would silently invalidate downstream assembly.
#[must_use]
pub fn first_locked_successor<'a>(
    catalogue: &'a StageCatalogue,
    runs: &[StageRun],
    position: usize,
) -> Option<&'a str> {
    catalogue
        .carried_forward()
        .filter(|d| d.sequence_position > position)
        .find(|d| runs[d.sequence_position].is_locked())
        .map(|d| d.id.as_str())
}

/// Collects the ids of carried-forward stages that are not locked, in
/// sequence order.
#[must_use]
pub fn unlocked_carried_stages(catalogue: &StageCatalogue, runs: &[StageRun]) -> Vec<String> {
    catalogue
        .carried_forward()
        .filter(|d| !runs[d.sequence_position].is_locked())
        .map(|d| d.id.clone())
        .collect()
}
