//! End-to-end workflow scenarios and invariant tests.

#[cfg(test)]
mod tests {
    use crate::catalogue::StageCatalogue;
    use crate::errors::WorkflowError;
    use crate::run::RunStatus;
    use crate::testing::{compliant_content, content_without_bold, gated_instance, init_tracing, lock_all};
    use crate::validation::{Rule, RuleEngine};
    use crate::workflow::{WorkflowConfig, WorkflowInstance};
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn rules() -> RuleEngine {
        RuleEngine::new().unwrap()
    }

    /// The full drive-through from the spec's example session: gates,
    /// seven locks in order, one out-of-order attempt, final assembly.
    #[test]
    fn full_recruiter_prep_session() {
        init_tracing();
        let engine = rules();
        let mut workflow = gated_instance();

        workflow
            .draft("stage1", "# Pitch\n\n- **Systems Architect**: cut infra spend **40%**")
            .unwrap();
        workflow.confirm("stage1").unwrap();
        workflow.lock("stage1", &engine).unwrap();

        // Jumping ahead is refused, naming the stage to finish first.
        let stage3 = workflow.catalogue().get("stage3").unwrap().clone();
        workflow.draft("stage3", compliant_content(&stage3)).unwrap();
        workflow.confirm("stage3").unwrap();
        match workflow.lock("stage3", &engine).unwrap_err() {
            WorkflowError::OutOfOrderLock(e) => assert_eq!(e.blocking_stage, "stage2"),
            other => panic!("expected OutOfOrderLock, got {other}"),
        }

        for n in 2..=7 {
            let id = format!("stage{n}");
            let definition = workflow.catalogue().get(&id).unwrap().clone();
            workflow.draft(&id, compliant_content(&definition)).unwrap();
            workflow.confirm(&id).unwrap();
            workflow.lock(&id, &engine).unwrap();
        }

        let assembled = workflow.assemble().unwrap();
        assert_eq!(assembled.toc.len(), 7);
        assert_eq!(assembled.toc[0].heading, "Pitch");
        assert!(assembled.document.contains("cut infra spend **40%**"));
        assert!(!assembled.document.contains("gating notes"));
    }

    /// Ordering invariant: across randomized lock-attempt sequences, a
    /// carried stage only ever locks when every predecessor is locked.
    #[test]
    fn randomized_lock_sequences_respect_ordering() {
        let engine = rules();
        let catalogue = StageCatalogue::recruiter_prep();
        let stage_ids: Vec<String> = catalogue.carried_forward().map(|d| d.id.clone()).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5747_4f44);

        for _ in 0..50 {
            let mut workflow = gated_instance();
            for definition in StageCatalogue::recruiter_prep().carried_forward() {
                workflow
                    .draft(&definition.id, compliant_content(definition))
                    .unwrap();
                workflow.confirm(&definition.id).unwrap();
            }

            let mut attempts = stage_ids.clone();
            attempts.shuffle(&mut rng);

            for id in &attempts {
                let position = workflow.catalogue().get(id).unwrap().sequence_position;
                let predecessors_locked = workflow
                    .catalogue()
                    .carried_forward()
                    .filter(|d| d.sequence_position < position)
                    .all(|d| workflow.run(&d.id).unwrap().is_locked());

                let result = workflow.lock(id, &engine);
                assert_eq!(
                    result.is_ok(),
                    predecessors_locked,
                    "lock of '{id}' disagreed with the ordering invariant"
                );
            }
        }
    }

    /// Assembly completeness: exactly seven sections, each byte-identical
    /// to the content at lock time.
    #[test]
    fn assembled_sections_are_byte_identical() {
        let engine = rules();
        let mut workflow = gated_instance();
        lock_all(&mut workflow, &engine);

        let contents: Vec<String> = StageCatalogue::recruiter_prep()
            .carried_forward()
            .map(|d| workflow.run(&d.id).unwrap().content.clone())
            .collect();
        assert_eq!(contents.len(), 7);

        let assembled = workflow.assemble().unwrap();
        let (_, body) = assembled
            .document
            .split_once("\n\n# ")
            .expect("document has a body after the TOC");
        let body = format!("# {body}");
        assert_eq!(body, contents.join("\n\n"));
    }

    #[test]
    fn assembly_is_idempotent_byte_for_byte() {
        let engine = rules();
        let mut workflow = gated_instance();
        lock_all(&mut workflow, &engine);

        let first = workflow.assemble().unwrap();
        let second = workflow.assemble().unwrap();
        assert_eq!(first.document.as_bytes(), second.document.as_bytes());
        assert_eq!(first.digest, second.digest);
    }

    /// Validation gating: a missing bolded metric fails with a violation
    /// naming the rule, and the stage stays AwaitingConfirmation.
    #[test]
    fn missing_bold_metric_blocks_lock() {
        let engine = rules();
        let mut workflow = gated_instance();
        workflow.draft("stage1", content_without_bold()).unwrap();
        workflow.confirm("stage1").unwrap();

        match workflow.lock("stage1", &engine).unwrap_err() {
            WorkflowError::Validation(failure) => {
                assert!(failure.violations.iter().any(|v| v.rule == Rule::BoldedSpan));
            }
            other => panic!("expected Validation, got {other}"),
        }
        assert_eq!(
            workflow.run("stage1").unwrap().status,
            RunStatus::AwaitingConfirmation
        );
    }

    /// Setup/context exclusion: gating content never reaches the output,
    /// even when it is distinctive and non-empty.
    #[test]
    fn gating_content_never_assembled() {
        let engine = rules();
        let catalogue = Arc::new(StageCatalogue::recruiter_prep());
        let mut workflow = WorkflowInstance::new(catalogue, WorkflowConfig::default());
        workflow.draft("setup", "SENTINEL-SETUP-TEXT").unwrap();
        workflow.confirm("setup").unwrap();
        workflow.draft("context", "SENTINEL-CONTEXT-TEXT").unwrap();
        workflow.confirm("context").unwrap();
        lock_all(&mut workflow, &engine);

        let assembled = workflow.assemble().unwrap();
        assert!(!assembled.document.contains("SENTINEL-SETUP-TEXT"));
        assert!(!assembled.document.contains("SENTINEL-CONTEXT-TEXT"));
    }

    /// Locked content is immutable: draft attempts fail and leave the
    /// bytes untouched, repeatedly.
    #[test]
    fn locked_content_immutable_under_repeated_drafts() {
        let engine = rules();
        let mut workflow = gated_instance();
        let definition = workflow.catalogue().get("stage1").unwrap().clone();
        workflow.draft("stage1", compliant_content(&definition)).unwrap();
        workflow.confirm("stage1").unwrap();
        workflow.lock("stage1", &engine).unwrap();

        let frozen = workflow.run("stage1").unwrap().content.clone();
        for attempt in 0..3 {
            let err = workflow.draft("stage1", format!("revision {attempt}")).unwrap_err();
            assert!(matches!(err, WorkflowError::StageLocked(_)));
            assert_eq!(workflow.run("stage1").unwrap().content, frozen);
        }
    }
}
