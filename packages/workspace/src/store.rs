//! Per-surface revision store with compare-and-swap appends.

use crate::errors::{StoreError, StoreResult};
use crate::persist::{normalize_surface_id, read_state, write_state, StoreState, SurfaceState};
use dui_common::Manifest;
use dui_editor::PatchPlan;
use dui_parser::Document;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Result of [`RevisionStore::append_if_match`]. The revisions are the ones
/// current after the call: post-append on success, unchanged on mismatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendOutcome {
    pub ok: bool,
    pub current_manifest_revision: u64,
    pub current_dsl_revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceContext {
    pub surface_id: String,
    pub session_id: String,
    pub catalog_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSummary {
    pub surface_id: String,
    pub session_id: String,
    pub catalog_version: String,
    pub manifest_revision_count: usize,
    pub dsl_revision_count: usize,
}

#[derive(Debug)]
enum Backend {
    File(PathBuf),
    Memory(StoreState),
}

/// Revisioned manifest/document store.
///
/// The file backend re-reads its file on every call, so separate handles on
/// one path observe each other's commits. The read-check-write window of
/// [`append_if_match`](Self::append_if_match) is not atomic across handles;
/// callers sharing a store in-process wrap it in `Arc<Mutex<_>>`.
#[derive(Debug)]
pub struct RevisionStore {
    backend: Backend,
}

impl RevisionStore {
    /// File-backed store. The file is created, healed or upgraded as needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let (state, healed) = read_state(&path)?;
        if healed {
            write_state(&path, &state)?;
        }
        info!(path = %path.display(), surfaces = state.surfaces.len(), "opened revision store");
        Ok(Self {
            backend: Backend::File(path),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(StoreState::seeded()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Run `f` against the current state, persisting when the state was
    /// healed on read or `f` reports a change.
    fn transact<T>(&mut self, f: impl FnOnce(&mut StoreState) -> StoreResult<(T, bool)>) -> StoreResult<T> {
        match &mut self.backend {
            Backend::Memory(state) => f(state).map(|(value, _)| value),
            Backend::File(path) => {
                let (mut state, healed) = read_state(path)?;
                let (value, changed) = f(&mut state)?;
                if healed || changed {
                    write_state(path, &state)?;
                }
                Ok(value)
            }
        }
    }

    /// Read from one surface, creating it from seed when unknown.
    fn read_surface<T>(&mut self, surface_id: &str, f: impl FnOnce(&SurfaceState) -> T) -> StoreResult<T> {
        let surface_id = normalize_surface_id(Some(surface_id));
        self.transact(|state| {
            let created = state.ensure_surface(&surface_id);
            let value = f(&state.surfaces[surface_id.as_str()]);
            Ok((value, created))
        })
    }

    pub fn current_manifest(&mut self, surface_id: &str) -> StoreResult<Manifest> {
        self.read_surface(surface_id, |surface| {
            surface
                .revisions
                .last()
                .cloned()
                .unwrap_or_else(|| crate::seed::seed_manifest(&surface.surface_id))
        })
    }

    pub fn current_document(&mut self, surface_id: &str) -> StoreResult<Document> {
        self.read_surface(surface_id, |surface| {
            surface
                .dsl_revisions
                .last()
                .cloned()
                .unwrap_or_else(|| crate::seed::seed_document(&surface.surface_id))
        })
    }

    /// Current `(manifest revision, dsl revision)` of a surface.
    pub fn current_revisions(&mut self, surface_id: &str) -> StoreResult<(u64, u64)> {
        self.read_surface(surface_id, |surface| {
            (surface.current_manifest_revision(), surface.current_dsl_revision())
        })
    }

    pub fn list_revisions(&mut self, surface_id: &str) -> StoreResult<Vec<Manifest>> {
        self.read_surface(surface_id, |surface| surface.revisions.clone())
    }

    pub fn list_dsl_revisions(&mut self, surface_id: &str) -> StoreResult<Vec<Document>> {
        self.read_surface(surface_id, |surface| surface.dsl_revisions.clone())
    }

    pub fn get_revision(&mut self, revision: u64, surface_id: &str) -> StoreResult<Option<Manifest>> {
        self.read_surface(surface_id, |surface| {
            surface
                .revisions
                .iter()
                .find(|manifest| manifest.revision == revision)
                .cloned()
        })
    }

    pub fn surface_context(&mut self, surface_id: &str) -> StoreResult<SurfaceContext> {
        self.read_surface(surface_id, |surface| SurfaceContext {
            surface_id: surface.surface_id.clone(),
            session_id: surface.session_id.clone(),
            catalog_version: surface.catalog_version.clone(),
        })
    }

    pub fn list_surfaces(&mut self) -> StoreResult<Vec<SurfaceSummary>> {
        self.transact(|state| {
            let summaries = state
                .surfaces
                .iter()
                .map(|(surface_id, surface)| SurfaceSummary {
                    surface_id: surface_id.clone(),
                    session_id: surface.session_id.clone(),
                    catalog_version: surface.catalog_version.clone(),
                    manifest_revision_count: surface.revisions.len(),
                    dsl_revision_count: surface.dsl_revisions.len(),
                })
                .collect();
            Ok((summaries, false))
        })
    }

    /// Current manifest of every surface, keyed by surface id.
    pub fn current_manifests(&mut self) -> StoreResult<Vec<(String, Manifest)>> {
        self.transact(|state| {
            let manifests = state
                .surfaces
                .iter()
                .filter_map(|(surface_id, surface)| {
                    surface
                        .revisions
                        .last()
                        .map(|manifest| (surface_id.clone(), manifest.clone()))
                })
                .collect();
            Ok((manifests, false))
        })
    }

    /// Store `plan` under its surface (or `surface_id` when given), stamping
    /// the resolved surface onto the plan.
    pub fn save_patch_plan(&mut self, plan: &mut PatchPlan, surface_id: Option<&str>) -> StoreResult<()> {
        let surface_id = normalize_surface_id(surface_id.or(Some(plan.surface_id.as_str())));
        plan.surface_id = surface_id.clone();
        let plan = plan.clone();
        self.transact(|state| {
            state.ensure_surface(&surface_id);
            if let Some(surface) = state.surfaces.get_mut(surface_id.as_str()) {
                debug!(patch_plan_id = %plan.patch_plan_id, status = %plan.status, "saving patch plan");
                surface.patch_plans.insert(plan.patch_plan_id.clone(), plan);
            }
            Ok(((), true))
        })
    }

    /// Replace an existing plan. Returns `false` when the plan is unknown.
    pub fn update_patch_plan(&mut self, plan: &PatchPlan) -> StoreResult<bool> {
        let surface_id = normalize_surface_id(Some(plan.surface_id.as_str()));
        self.transact(|state| {
            let slot = state
                .surfaces
                .get_mut(surface_id.as_str())
                .and_then(|surface| surface.patch_plans.get_mut(&plan.patch_plan_id));
            match slot {
                Some(slot) => {
                    *slot = plan.clone();
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
    }

    /// Look a plan up in one surface, or in every surface when none is given.
    pub fn get_patch_plan(&mut self, patch_plan_id: &str, surface_id: Option<&str>) -> StoreResult<Option<PatchPlan>> {
        self.transact(|state| {
            let plan = match surface_id {
                Some(surface_id) => state
                    .surfaces
                    .get(normalize_surface_id(Some(surface_id)).as_str())
                    .and_then(|surface| surface.patch_plans.get(patch_plan_id))
                    .cloned(),
                None => state
                    .surfaces
                    .values()
                    .find_map(|surface| surface.patch_plans.get(patch_plan_id))
                    .cloned(),
            };
            Ok((plan, false))
        })
    }

    /// Discard all history and plans, restoring the seed state.
    pub fn reset_to_seed(&mut self) -> StoreResult<()> {
        info!("resetting revision store to seed");
        self.transact(|state| {
            *state = StoreState::seeded();
            Ok(((), true))
        })
    }

    /// Append `manifest` and `document` as the surface's next revisions if
    /// the supplied expectations match the current revisions.
    ///
    /// A mismatch writes nothing and reports `ok = false`. Revisions that are
    /// not above the current ones are rejected with
    /// [`StoreError::NonMonotonicRevision`].
    #[instrument(skip(self, manifest, document), fields(revision = manifest.revision))]
    pub fn append_if_match(
        &mut self,
        surface_id: &str,
        manifest: Manifest,
        document: Document,
        expected_manifest_revision: Option<u64>,
        expected_dsl_revision: Option<u64>,
    ) -> StoreResult<AppendOutcome> {
        let surface_id = normalize_surface_id(Some(surface_id));
        self.transact(|state| {
            let created = state.ensure_surface(&surface_id);
            let Some(surface) = state.surfaces.get_mut(surface_id.as_str()) else {
                return Ok((AppendOutcome::default(), created));
            };

            let current_manifest = surface.current_manifest_revision();
            let current_dsl = surface.current_dsl_revision();
            let stale = expected_manifest_revision.is_some_and(|rev| rev != current_manifest)
                || expected_dsl_revision.is_some_and(|rev| rev != current_dsl);
            if stale {
                debug!(current_manifest, current_dsl, "append rejected: stale expectation");
                let outcome = AppendOutcome {
                    ok: false,
                    current_manifest_revision: current_manifest,
                    current_dsl_revision: current_dsl,
                };
                return Ok((outcome, created));
            }

            if manifest.revision <= current_manifest {
                return Err(StoreError::NonMonotonicRevision {
                    log: "manifest",
                    current: current_manifest,
                    attempted: manifest.revision,
                });
            }
            if document.meta.revision <= current_dsl {
                return Err(StoreError::NonMonotonicRevision {
                    log: "document",
                    current: current_dsl,
                    attempted: document.meta.revision,
                });
            }

            let outcome = AppendOutcome {
                ok: true,
                current_manifest_revision: manifest.revision,
                current_dsl_revision: document.meta.revision,
            };
            surface.revisions.push(manifest);
            surface.dsl_revisions.push(document);
            info!(
                surface_id = %surface_id,
                manifest_revision = outcome.current_manifest_revision,
                dsl_revision = outcome.current_dsl_revision,
                "appended revision"
            );
            Ok((outcome, true))
        })
    }
}
