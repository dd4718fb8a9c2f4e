//! On-disk state model, normalization and atomic persistence.
//!
//! ```text
//! state file ──read──▶ serde_json::Value ──normalize──▶ StoreState
//!                                              │ healed?
//!                                              ▼
//!                    tmp file ──sync_all──▶ rename over state file
//! ```

use crate::errors::StoreResult;
use crate::seed::{
    seed_document, seed_manifest, DEFAULT_CATALOG_VERSION, DEFAULT_SURFACE_ID, LESSON_SURFACE_ID,
    SEED_DOMAIN,
};
use dui_common::Manifest;
use dui_editor::{PatchPlan, DEFAULT_SESSION_ID};
use dui_parser::Document;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

pub const SURFACE_STORE_VERSION: u32 = 1;

/// Revision history and plans of one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    pub surface_id: String,
    pub session_id: String,
    pub catalog_version: String,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
    /// `revisions[i].revision == i + 1`
    pub revisions: Vec<Manifest>,
    pub dsl_revisions: Vec<Document>,
    #[serde(default)]
    pub patch_plans: IndexMap<String, PatchPlan>,
}

impl SurfaceState {
    /// Fresh surface holding only its seed revision.
    pub fn seeded(surface_id: &str) -> Self {
        let manifest = seed_manifest(surface_id);
        let mut metadata = IndexMap::new();
        metadata.insert("domain".to_string(), SEED_DOMAIN.to_string());
        metadata.insert("seed".to_string(), "true".to_string());
        Self {
            surface_id: surface_id.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            catalog_version: DEFAULT_CATALOG_VERSION.to_string(),
            metadata,
            revisions: vec![manifest],
            dsl_revisions: vec![seed_document(surface_id)],
            patch_plans: IndexMap::new(),
        }
    }

    pub fn current_manifest_revision(&self) -> u64 {
        self.revisions.last().map_or(0, |manifest| manifest.revision)
    }

    pub fn current_dsl_revision(&self) -> u64 {
        self.dsl_revisions.last().map_or(0, |document| document.meta.revision)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub surface_store_version: u32,
    pub surfaces: IndexMap<String, SurfaceState>,
}

impl StoreState {
    /// Both built-in surfaces at their seed revision.
    pub fn seeded() -> Self {
        let mut surfaces = IndexMap::new();
        for surface_id in [DEFAULT_SURFACE_ID, LESSON_SURFACE_ID] {
            surfaces.insert(surface_id.to_string(), SurfaceState::seeded(surface_id));
        }
        Self {
            surface_store_version: SURFACE_STORE_VERSION,
            surfaces,
        }
    }

    /// Create `surface_id` from its seed if missing; returns whether it was created.
    pub fn ensure_surface(&mut self, surface_id: &str) -> bool {
        if self.surfaces.contains_key(surface_id) {
            return false;
        }
        debug!(surface_id, "creating surface from seed");
        self.surfaces
            .insert(surface_id.to_string(), SurfaceState::seeded(surface_id));
        true
    }
}

/// Blank or missing surface ids resolve to the default surface.
pub fn normalize_surface_id(surface_id: Option<&str>) -> String {
    match surface_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => DEFAULT_SURFACE_ID.to_string(),
    }
}

/// Normalizes raw JSON into a well-formed state, recording every repair.
#[derive(Default)]
struct Normalizer {
    repairs: Vec<String>,
}

impl Normalizer {
    fn repaired(&mut self, note: String) {
        self.repairs.push(note);
    }

    fn state(&mut self, raw: Json) -> StoreState {
        let Json::Object(mut raw) = raw else {
            self.repaired("state is not an object".to_string());
            return StoreState::seeded();
        };

        let surfaces = match raw.remove("surfaces") {
            Some(Json::Object(surfaces)) => surfaces,
            Some(_) | None => return self.legacy(raw),
        };

        if raw.get("surface_store_version") != Some(&Json::from(SURFACE_STORE_VERSION)) {
            self.repaired("surface_store_version reset".to_string());
        }

        let mut state = StoreState {
            surface_store_version: SURFACE_STORE_VERSION,
            surfaces: IndexMap::new(),
        };
        for (surface_id, raw_surface) in surfaces {
            let surface = self.surface(&surface_id, raw_surface);
            state.surfaces.insert(surface_id, surface);
        }
        for surface_id in [DEFAULT_SURFACE_ID, LESSON_SURFACE_ID] {
            if state.ensure_surface(surface_id) {
                self.repaired(format!("{surface_id}: missing built-in surface"));
            }
        }
        state
    }

    /// Single-surface format: `{revisions: [...], patch_plans: {...}}`.
    fn legacy(&mut self, mut raw: Map<String, Json>) -> StoreState {
        self.repaired("upgraded legacy single-surface state".to_string());

        let revisions = raw
            .remove("revisions")
            .and_then(|value| self.decode_list::<Manifest>(DEFAULT_SURFACE_ID, "revisions", value))
            .unwrap_or_else(|| vec![seed_manifest(DEFAULT_SURFACE_ID)]);
        let patch_plans = raw
            .remove("patch_plans")
            .map(|value| self.plans(DEFAULT_SURFACE_ID, value))
            .unwrap_or_default();

        let mut metadata = IndexMap::new();
        metadata.insert("domain".to_string(), SEED_DOMAIN.to_string());
        metadata.insert("seed".to_string(), "migrated".to_string());

        let mut state = StoreState {
            surface_store_version: SURFACE_STORE_VERSION,
            surfaces: IndexMap::new(),
        };
        state.surfaces.insert(
            DEFAULT_SURFACE_ID.to_string(),
            SurfaceState {
                surface_id: DEFAULT_SURFACE_ID.to_string(),
                session_id: DEFAULT_SESSION_ID.to_string(),
                catalog_version: DEFAULT_CATALOG_VERSION.to_string(),
                metadata,
                revisions,
                dsl_revisions: vec![seed_document(DEFAULT_SURFACE_ID)],
                patch_plans,
            },
        );
        state.ensure_surface(LESSON_SURFACE_ID);
        state
    }

    fn surface(&mut self, surface_id: &str, raw: Json) -> SurfaceState {
        let Json::Object(mut raw) = raw else {
            self.repaired(format!("{surface_id}: surface is not an object"));
            return SurfaceState::seeded(surface_id);
        };

        let revisions = raw
            .remove("revisions")
            .and_then(|value| self.decode_list::<Manifest>(surface_id, "revisions", value))
            .unwrap_or_else(|| {
                self.repaired(format!("{surface_id}: revisions reseeded"));
                vec![seed_manifest(surface_id)]
            });
        let dsl_revisions = raw
            .remove("dsl_revisions")
            .and_then(|value| self.decode_list::<Document>(surface_id, "dsl_revisions", value))
            .unwrap_or_else(|| {
                self.repaired(format!("{surface_id}: dsl_revisions reseeded"));
                vec![seed_document(surface_id)]
            });
        let patch_plans = match raw.remove("patch_plans") {
            Some(value) => self.plans(surface_id, value),
            None => {
                self.repaired(format!("{surface_id}: patch_plans missing"));
                IndexMap::new()
            }
        };
        let metadata = match raw.remove("metadata") {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|_| {
                self.repaired(format!("{surface_id}: metadata dropped"));
                IndexMap::new()
            }),
            None => IndexMap::new(),
        };

        SurfaceState {
            surface_id: surface_id.to_string(),
            session_id: self.text(surface_id, &raw, "session_id", DEFAULT_SESSION_ID),
            catalog_version: self.text(surface_id, &raw, "catalog_version", DEFAULT_CATALOG_VERSION),
            metadata,
            revisions,
            dsl_revisions,
            patch_plans,
        }
    }

    /// Non-empty list of `T`, or `None` when the part must be reseeded.
    fn decode_list<T: DeserializeOwned>(&mut self, surface_id: &str, part: &str, value: Json) -> Option<Vec<T>> {
        match serde_json::from_value::<Vec<T>>(value) {
            Ok(items) if !items.is_empty() => Some(items),
            Ok(_) => None,
            Err(err) => {
                self.repaired(format!("{surface_id}: {part} unreadable ({err})"));
                None
            }
        }
    }

    /// Plans that fail to decode are dropped one by one.
    fn plans(&mut self, surface_id: &str, value: Json) -> IndexMap<String, PatchPlan> {
        let Json::Object(raw_plans) = value else {
            self.repaired(format!("{surface_id}: patch_plans is not an object"));
            return IndexMap::new();
        };
        let mut plans = IndexMap::new();
        for (plan_id, raw_plan) in raw_plans {
            match serde_json::from_value::<PatchPlan>(raw_plan) {
                Ok(plan) => {
                    plans.insert(plan_id, plan);
                }
                Err(err) => self.repaired(format!("{surface_id}: dropped patch plan {plan_id} ({err})")),
            }
        }
        plans
    }

    fn text(&mut self, surface_id: &str, raw: &Map<String, Json>, key: &str, default: &str) -> String {
        match raw.get(key).and_then(Json::as_str).filter(|s| !s.is_empty()) {
            Some(text) => text.to_string(),
            None => {
                self.repaired(format!("{surface_id}: {key} defaulted"));
                default.to_string()
            }
        }
    }
}

/// Normalize raw state JSON. The flag reports whether anything was repaired.
pub fn normalize_state(raw: Json) -> (StoreState, bool) {
    let mut normalizer = Normalizer::default();
    let state = normalizer.state(raw);
    for repair in &normalizer.repairs {
        warn!(repair = %repair, "self-healed store state");
    }
    let healed = !normalizer.repairs.is_empty();
    (state, healed)
}

/// Read and normalize the state file. Missing, empty and unparseable files
/// yield the seed state, flagged for rewrite.
pub fn read_state(path: &Path) -> StoreResult<(StoreState, bool)> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "state file missing, seeding");
            return Ok((StoreState::seeded(), true));
        }
        Err(err) => return Err(err.into()),
    };

    if text.trim().is_empty() {
        warn!(path = %path.display(), "state file empty, reseeding");
        return Ok((StoreState::seeded(), true));
    }

    match serde_json::from_str::<Json>(&text) {
        Ok(raw) => Ok(normalize_state(raw)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "state file corrupt, reseeding");
            Ok((StoreState::seeded(), true))
        }
    }
}

/// Replace the state file atomically: write a sibling temp file, fsync, rename.
pub fn write_state(path: &Path, state: &StoreState) -> StoreResult<()> {
    let payload = serde_json::to_vec_pretty(state)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(&payload)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;

    debug!(path = %path.display(), bytes = payload.len(), "wrote store state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seeded_state_round_trips_without_repairs() {
        let raw = serde_json::to_value(StoreState::seeded()).unwrap();
        let (state, healed) = normalize_state(raw);
        assert!(!healed);
        assert_eq!(state.surfaces.len(), 2);
    }

    #[test]
    fn test_broken_surface_parts_are_reseeded() {
        let raw = json!({
            "surface_store_version": 1,
            "surfaces": {
                "math_lms.dashboard": {
                    "session_id": "s1",
                    "catalog_version": "v9",
                    "revisions": "nope",
                    "dsl_revisions": [],
                    "patch_plans": {"bad": {"no": "fields"}}
                },
                "math_lms.lesson": 42
            }
        });
        let (state, healed) = normalize_state(raw);
        assert!(healed);

        let dashboard = &state.surfaces[DEFAULT_SURFACE_ID];
        assert_eq!(dashboard.session_id, "s1");
        assert_eq!(dashboard.catalog_version, "v9");
        assert_eq!(dashboard.current_manifest_revision(), 1);
        assert_eq!(dashboard.dsl_revisions.len(), 1);
        assert!(dashboard.patch_plans.is_empty());

        let lesson = &state.surfaces[LESSON_SURFACE_ID];
        assert_eq!(lesson.revisions[0].manifest_id, "seed-lesson-manifest-v1");
    }

    #[test]
    fn test_legacy_state_is_upgraded() {
        let legacy = json!({
            "revisions": [serde_json::to_value(seed_manifest(DEFAULT_SURFACE_ID)).unwrap()],
            "patch_plans": {}
        });
        let (state, healed) = normalize_state(legacy);
        assert!(healed);
        assert_eq!(state.surface_store_version, SURFACE_STORE_VERSION);
        assert_eq!(state.surfaces[DEFAULT_SURFACE_ID].metadata["seed"], "migrated");
        assert!(state.surfaces.contains_key(LESSON_SURFACE_ID));
    }

    #[test]
    fn test_surface_id_normalization() {
        assert_eq!(normalize_surface_id(None), DEFAULT_SURFACE_ID);
        assert_eq!(normalize_surface_id(Some("   ")), DEFAULT_SURFACE_ID);
        assert_eq!(normalize_surface_id(Some(" math_lms.lesson ")), LESSON_SURFACE_ID);
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_state(&path, &StoreState::seeded()).unwrap();
        write_state(&path, &StoreState::seeded()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let (_, healed) = read_state(&path).unwrap();
        assert!(!healed);
    }
}
