use dui_common::{ThemeProfile, Zone};
use dui_editor::{Mode, PatchOperation, PlanStatus};
use dui_parser::{serialize, Density};
use dui_workspace::{
    seed_document, shared, DslService, PlanRequest, ProvidedOperations, RevisionStore,
    RuleBasedDocumentProducer, RuleBasedPatchProducer, ServiceError, ServiceOptions, SharedStore,
    UiService, DEFAULT_SURFACE_ID, LESSON_SURFACE_ID,
};

fn services(options: ServiceOptions) -> (SharedStore, DslService, UiService) {
    let store = shared(RevisionStore::in_memory());
    let dsl = DslService::new(store.clone(), options.clone());
    let ui = UiService::new(store.clone(), options);
    (store, dsl, ui)
}

#[test]
fn plan_commit_writes_manifest_and_projected_document() -> anyhow::Result<()> {
    let (store, _, ui) = services(ServiceOptions::default());
    let proposal = ui.propose(
        PlanRequest::new("minimal and hide sidebar", DEFAULT_SURFACE_ID).with_mode(Mode::Safe),
        &RuleBasedPatchProducer,
    )?;
    assert_eq!(proposal.plan.status, PlanStatus::Draft);
    assert_eq!(proposal.preview.revision, 1);
    assert_eq!(proposal.plan.base_revision, Some(1));

    let outcome = ui.commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, Some("reviewer"), Some(1))?;
    assert_eq!(outcome.manifest.revision, 2);
    assert_eq!(outcome.manifest.theme.profile, ThemeProfile::Minimal);
    assert!(outcome.manifest.widget("practice_queue").is_none());
    assert_eq!(outcome.manifest.metadata["write_source"], "patch_plan");
    assert_eq!(outcome.document.meta.revision, 2);
    assert_eq!(outcome.document.meta.created_by, "reviewer");

    let mut store = store.lock().unwrap();
    assert_eq!(store.current_manifest(DEFAULT_SURFACE_ID)?.revision, 2);
    let plan = store
        .get_patch_plan(&proposal.plan.patch_plan_id, None)?
        .expect("plan stored");
    assert_eq!(plan.status, PlanStatus::Committed);
    Ok(())
}

#[test]
fn committed_plan_cannot_be_committed_again() -> anyhow::Result<()> {
    let (_, _, ui) = services(ServiceOptions::default());
    let proposal = ui.propose(PlanRequest::new("compact", DEFAULT_SURFACE_ID), &RuleBasedPatchProducer)?;
    ui.commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)?;

    let err = ui
        .commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)
        .unwrap_err();
    assert_eq!(err.to_string(), "patch_plan is already committed");
    Ok(())
}

#[test]
fn policy_rejection_stores_rejected_plan() {
    let (store, _, ui) = services(ServiceOptions::default());
    let operations = ProvidedOperations(vec![PatchOperation::RemoveWidget {
        widget_id: "course_progress".into(),
    }]);

    let err = ui
        .propose(PlanRequest::new("drop progress", DEFAULT_SURFACE_ID), &operations)
        .unwrap_err();
    let ServiceError::Rejected {
        errors,
        patch_plan_id: Some(plan_id),
        ..
    } = err
    else {
        panic!("expected policy rejection");
    };
    assert_eq!(errors.len(), 1);

    let plan = store
        .lock()
        .unwrap()
        .get_patch_plan(&plan_id, Some(DEFAULT_SURFACE_ID))
        .unwrap()
        .unwrap();
    assert_eq!(plan.status, PlanStatus::Rejected);
    assert_eq!(plan.warnings, errors);
}

#[test]
fn stale_plan_base_is_a_conflict() -> anyhow::Result<()> {
    let (_, _, ui) = services(ServiceOptions::default());
    let first = ui.propose(PlanRequest::new("compact", DEFAULT_SURFACE_ID), &RuleBasedPatchProducer)?;
    let second = ui.propose(PlanRequest::new("minimal", DEFAULT_SURFACE_ID), &RuleBasedPatchProducer)?;
    ui.commit(&first.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)?;

    let err = ui
        .commit(&second.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Conflict {
            current_manifest_revision: 2,
            ..
        }
    ));
    assert!(err.to_string().starts_with("Patch plan base revision is stale"));
    Ok(())
}

#[test]
fn plan_for_another_surface_is_refused() -> anyhow::Result<()> {
    let (_, _, ui) = services(ServiceOptions::default());
    let proposal = ui.propose(PlanRequest::new("compact", LESSON_SURFACE_ID), &RuleBasedPatchProducer)?;
    let err = ui
        .commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)
        .unwrap_err();
    assert!(err.to_string().starts_with("patch_plan belongs to another surface"));

    let err = ui.commit("missing", DEFAULT_SURFACE_ID, None, None).unwrap_err();
    assert_eq!(err.to_string(), "patch_plan_id not found");
    Ok(())
}

#[test]
fn revert_reissues_target_as_next_revision() -> anyhow::Result<()> {
    let (_, _, ui) = services(ServiceOptions::default());
    let proposal = ui.propose(
        PlanRequest::new("practice focus", DEFAULT_SURFACE_ID),
        &RuleBasedPatchProducer,
    )?;
    let committed = ui.commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)?;
    assert_eq!(committed.manifest.widget("practice_queue").map(|w| w.zone), Some(Zone::Content));

    let reverted = ui.revert(1, DEFAULT_SURFACE_ID, Some("admin"))?;
    assert_eq!(reverted.manifest.revision, 3);
    assert_eq!(reverted.manifest.metadata["reverted_from"], "2");
    assert_eq!(reverted.manifest.metadata["reverted_to"], "1");
    assert_eq!(reverted.manifest.metadata["write_source"], "revert");
    assert_eq!(reverted.manifest.widget("practice_queue").map(|w| w.zone), Some(Zone::Sidebar));
    assert_eq!(reverted.document.meta.revision, 3);

    let err = ui.revert(9, DEFAULT_SURFACE_ID, None).unwrap_err();
    assert_eq!(err.to_string(), "target revision not found");
    Ok(())
}

#[test]
fn dsl_commit_stamps_revisions_and_detects_stale_expectations() -> anyhow::Result<()> {
    let (_, dsl, _) = services(ServiceOptions::default());
    let mut document = seed_document(DEFAULT_SURFACE_ID);
    document.theme.density = Density::Compact;

    let outcome = dsl.commit(&document, DEFAULT_SURFACE_ID, Some("editor"), Some(1), Some(1))?;
    assert_eq!(outcome.manifest.revision, 2);
    assert_eq!(outcome.document.meta.revision, 2);
    assert_eq!(outcome.document.meta.created_by, "editor");
    assert_eq!(outcome.manifest.metadata["write_source"], "dui");
    assert_eq!(outcome.manifest.theme.density, Density::Compact);

    let err = dsl
        .commit(&document, DEFAULT_SURFACE_ID, None, Some(1), None)
        .unwrap_err();
    assert!(err.to_string().starts_with("stale manifest revision for DUI commit"));

    let err = dsl
        .commit(&document, DEFAULT_SURFACE_ID, None, None, Some(1))
        .unwrap_err();
    assert!(err.to_string().starts_with("stale DUI revision for commit"));
    Ok(())
}

#[test]
fn dsl_parse_and_validate_preview_current_revision() -> anyhow::Result<()> {
    let (_, dsl, _) = services(ServiceOptions::default());
    let source = serialize(&seed_document("other.surface"));

    let check = dsl.parse(&source, DEFAULT_SURFACE_ID)?;
    assert!(check.result.valid);
    assert_eq!(check.document.surface.id, DEFAULT_SURFACE_ID);
    let preview = check.preview.expect("valid document has a preview");
    assert_eq!((preview.revision, preview.manifest_id.as_str()), (1, "seed-manifest-v1"));

    let mut broken = check.document.clone();
    broken.nodes[0].children.push("ghost".into());
    let check = dsl.validate(&broken, DEFAULT_SURFACE_ID)?;
    assert!(!check.result.valid);
    assert!(check.preview.is_none());

    assert!(matches!(
        dsl.parse("surface s {", DEFAULT_SURFACE_ID),
        Err(ServiceError::Parse(_))
    ));
    Ok(())
}

#[test]
fn dsl_propose_applies_mode_gate() -> anyhow::Result<()> {
    let (_, dsl, _) = services(ServiceOptions::default());

    let proposal = dsl.propose("liquid glass", DEFAULT_SURFACE_ID, Mode::Safe, &RuleBasedDocumentProducer)?;
    assert_eq!(proposal.document.theme.profile, ThemeProfile::LiquidGlass);
    assert_eq!(proposal.preview.revision, 1);

    let proposal = dsl.propose(
        "weak topics",
        DEFAULT_SURFACE_ID,
        Mode::Extended,
        &RuleBasedDocumentProducer,
    )?;
    assert!(proposal.document.node("weak_topics_list_1").is_some());
    assert!(proposal.preview.widget("weak_topics_list_1").is_some());
    Ok(())
}

#[test]
fn cross_surface_theme_is_enforced_when_enabled() -> anyhow::Result<()> {
    let options = ServiceOptions {
        enforce_cross_surface_theme: true,
        ..ServiceOptions::default()
    };
    let (_, dsl, ui) = services(options);

    let proposal = ui.propose(PlanRequest::new("minimal", DEFAULT_SURFACE_ID), &RuleBasedPatchProducer)?;
    let err = ui
        .commit(&proposal.plan.patch_plan_id, DEFAULT_SURFACE_ID, None, None)
        .unwrap_err();
    let ServiceError::Rejected { errors, .. } = err else {
        panic!("expected consistency rejection");
    };
    assert!(errors[0].contains("theme profile 'minimal' on math_lms.dashboard"));

    let outcome = dsl.commit(&seed_document(DEFAULT_SURFACE_ID), DEFAULT_SURFACE_ID, None, None, None)?;
    assert_eq!(outcome.manifest.revision, 2);
    Ok(())
}
