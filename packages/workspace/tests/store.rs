use dui_common::ThemeProfile;
use dui_editor::{apply_patch, Mode, PatchOperation, PatchPlan, PlanStatus};
use dui_workspace::{
    seed_manifest, shared, RevisionStore, StoreError, DEFAULT_SURFACE_ID, LESSON_SURFACE_ID,
};
use std::fs;
use std::thread;

fn next_revision(store: &mut RevisionStore, surface_id: &str) -> (dui_common::Manifest, dui_parser::Document) {
    let manifest = store.current_manifest(surface_id).unwrap();
    let mut document = store.current_document(surface_id).unwrap();
    document.meta.revision += 1;
    let next = apply_patch(
        &manifest,
        &[PatchOperation::SetThemeProfile {
            profile: ThemeProfile::Minimal,
        }],
    );
    (next, document)
}

#[test]
fn new_file_is_seeded_with_both_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");
    let mut store = RevisionStore::open(&path).unwrap();

    assert!(path.exists());
    let surfaces = store.list_surfaces().unwrap();
    let ids: Vec<_> = surfaces.iter().map(|s| s.surface_id.as_str()).collect();
    assert_eq!(ids, vec![DEFAULT_SURFACE_ID, LESSON_SURFACE_ID]);
    assert_eq!(surfaces[0].manifest_revision_count, 1);
    assert_eq!(store.current_manifest(DEFAULT_SURFACE_ID).unwrap().manifest_id, "seed-manifest-v1");

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["surface_store_version"], 1);
}

#[test]
fn empty_and_corrupt_files_self_heal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    fs::write(&path, "   \n").unwrap();
    let mut store = RevisionStore::open(&path).unwrap();
    assert_eq!(store.current_manifest(DEFAULT_SURFACE_ID).unwrap().revision, 1);

    fs::write(&path, "{\"surfaces\": {").unwrap();
    assert_eq!(store.current_document(LESSON_SURFACE_ID).unwrap().meta.revision, 1);
    let healed = fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&healed).is_ok());
}

#[test]
fn legacy_file_is_upgraded_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut legacy_manifest = seed_manifest(DEFAULT_SURFACE_ID);
    legacy_manifest.manifest_id = "legacy-1".to_string();
    let legacy = serde_json::json!({
        "revisions": [legacy_manifest],
        "patch_plans": {}
    });
    fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

    let mut store = RevisionStore::open(&path).unwrap();
    assert_eq!(store.current_manifest(DEFAULT_SURFACE_ID).unwrap().manifest_id, "legacy-1");

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["surfaces"][DEFAULT_SURFACE_ID]["metadata"]["seed"], "migrated");
    assert!(raw.get("revisions").is_none());
}

#[test]
fn upgraded_log_with_gaps_accepts_the_next_revision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut legacy_manifest = seed_manifest(DEFAULT_SURFACE_ID);
    legacy_manifest.revision = 7;
    let legacy = serde_json::json!({ "revisions": [legacy_manifest] });
    fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

    let mut store = RevisionStore::open(&path).unwrap();
    let (manifest, document) = next_revision(&mut store, DEFAULT_SURFACE_ID);
    assert_eq!(manifest.revision, 8);

    let outcome = store
        .append_if_match(DEFAULT_SURFACE_ID, manifest, document, Some(7), None)
        .unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.current_manifest_revision, 8);
    assert_eq!(store.get_revision(8, DEFAULT_SURFACE_ID).unwrap().map(|m| m.revision), Some(8));
}

#[test]
fn append_is_compare_and_swap_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let mut first = RevisionStore::open(&path).unwrap();
    let mut second = RevisionStore::open(&path).unwrap();

    let (manifest, document) = next_revision(&mut first, DEFAULT_SURFACE_ID);
    let stale = (manifest.clone(), document.clone());
    let outcome = first
        .append_if_match(DEFAULT_SURFACE_ID, manifest, document, Some(1), Some(1))
        .unwrap();
    assert!(outcome.ok);
    assert_eq!((outcome.current_manifest_revision, outcome.current_dsl_revision), (2, 2));

    let outcome = second
        .append_if_match(DEFAULT_SURFACE_ID, stale.0, stale.1, Some(1), Some(1))
        .unwrap();
    assert!(!outcome.ok);
    assert_eq!(outcome.current_manifest_revision, 2);
    assert_eq!(second.list_revisions(DEFAULT_SURFACE_ID).unwrap().len(), 2);
    assert_eq!(second.list_dsl_revisions(DEFAULT_SURFACE_ID).unwrap().len(), 2);
}

#[test]
fn append_rejects_revisions_that_do_not_advance() {
    let mut store = RevisionStore::in_memory();
    let (mut manifest, document) = next_revision(&mut store, DEFAULT_SURFACE_ID);
    manifest.revision = 1;
    let err = store
        .append_if_match(DEFAULT_SURFACE_ID, manifest, document, None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NonMonotonicRevision { log: "manifest", current: 1, attempted: 1 }
    ));

    let (manifest, mut document) = next_revision(&mut store, DEFAULT_SURFACE_ID);
    document.meta.revision = 1;
    let err = store
        .append_if_match(DEFAULT_SURFACE_ID, manifest, document, None, None)
        .unwrap_err();
    assert!(matches!(err, StoreError::NonMonotonicRevision { log: "document", .. }));
    assert_eq!(store.list_revisions(DEFAULT_SURFACE_ID).unwrap().len(), 1);
}

#[test]
fn concurrent_commits_with_same_expectation_yield_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = shared(RevisionStore::open(dir.path().join("state.json")).unwrap());

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let mut store = store.lock().unwrap();
                let (manifest, document) = next_revision(&mut store, DEFAULT_SURFACE_ID);
                let manifest = dui_editor::clone_with_revision(&manifest, 2);
                let mut document = document;
                document.meta.revision = 2;
                store
                    .append_if_match(DEFAULT_SURFACE_ID, manifest, document, Some(1), Some(1))
                    .unwrap()
                    .ok
            })
        })
        .collect();

    let wins = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(wins, 1);
    assert_eq!(store.lock().unwrap().current_manifest(DEFAULT_SURFACE_ID).unwrap().revision, 2);
}

#[test]
fn unknown_surfaces_are_created_on_demand() {
    let mut store = RevisionStore::in_memory();
    let manifest = store.current_manifest("math_lms.practice").unwrap();
    assert_eq!(manifest.metadata["surface_id"], "math_lms.practice");
    assert_eq!(store.current_manifest("  ").unwrap().manifest_id, "seed-manifest-v1");
    assert_eq!(store.list_surfaces().unwrap().len(), 3);
    assert_eq!(store.surface_context("math_lms.practice").unwrap().catalog_version, "math-lms-catalog-v1");
}

#[test]
fn patch_plans_round_trip_and_reset_clears_them() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = RevisionStore::open(dir.path().join("state.json")).unwrap();

    let mut plan = PatchPlan::draft("minimal", "", Mode::Safe, Vec::new());
    store.save_patch_plan(&mut plan, Some(LESSON_SURFACE_ID)).unwrap();
    assert_eq!(plan.surface_id, LESSON_SURFACE_ID);

    let found = store.get_patch_plan(&plan.patch_plan_id, None).unwrap().unwrap();
    assert_eq!(found, plan);
    assert!(store
        .get_patch_plan(&plan.patch_plan_id, Some(DEFAULT_SURFACE_ID))
        .unwrap()
        .is_none());

    plan.commit().unwrap();
    assert!(store.update_patch_plan(&plan).unwrap());
    let found = store.get_patch_plan(&plan.patch_plan_id, Some(LESSON_SURFACE_ID)).unwrap().unwrap();
    assert_eq!(found.status, PlanStatus::Committed);

    store.reset_to_seed().unwrap();
    assert!(store.get_patch_plan(&plan.patch_plan_id, None).unwrap().is_none());
    assert!(store.get_revision(1, DEFAULT_SURFACE_ID).unwrap().is_some());
    assert!(store.get_revision(2, DEFAULT_SURFACE_ID).unwrap().is_none());
}
