//! Service objects over a shared revision store.
//!
//! Every operation that writes holds the store lock from its first read to
//! its append, so commits through one [`SharedStore`] are serialized.

use crate::consistency::check_theme_consistency;
use crate::errors::{ServiceError, ServiceResult};
use crate::persist::normalize_surface_id;
use crate::producer::{DocumentProducer, PatchProducer, ProducerContext};
use crate::store::RevisionStore;
use chrono::Utc;
use dui_common::Manifest;
use dui_compiler::{compile, project};
use dui_editor::{
    apply_patch, check_document_change, check_patch, clone_with_revision, Mode, PatchPlan,
    DEFAULT_SESSION_ID,
};
use dui_parser::{parse, Document};
use dui_validator::{validate_document, ValidationLimits, ValidationResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, instrument, warn};

pub type SharedStore = Arc<Mutex<RevisionStore>>;

pub fn shared(store: RevisionStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

fn lock(store: &SharedStore) -> MutexGuard<'_, RevisionStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOptions {
    pub limits: ValidationLimits,
    /// Reject commits whose theme differs from another surface's
    pub enforce_cross_surface_theme: bool,
}

/// Validation verdict for a document, with a preview when it is valid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentCheck {
    pub document: Document,
    pub result: ValidationResult,
    pub preview: Option<Manifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentProposal {
    pub document: Document,
    pub result: ValidationResult,
    pub preview: Manifest,
    pub warnings: Vec<String>,
}

/// Revisions written by a commit or revert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitOutcome {
    pub manifest: Manifest,
    pub document: Document,
}

fn consistency_errors(
    store: &mut RevisionStore,
    options: &ServiceOptions,
    surface_id: &str,
    candidate: &Manifest,
) -> ServiceResult<()> {
    if !options.enforce_cross_surface_theme {
        return Ok(());
    }
    let manifests = store.current_manifests()?;
    let errors = check_theme_consistency(
        surface_id,
        candidate,
        manifests.iter().map(|(id, manifest)| (id.as_str(), manifest)),
    );
    if errors.is_empty() {
        return Ok(());
    }
    Err(ServiceError::Rejected {
        message: "Cross-surface consistency check failed".to_string(),
        errors,
        patch_plan_id: None,
    })
}

/// Append or report the race as a conflict.
fn append(
    store: &mut RevisionStore,
    surface_id: &str,
    manifest: &Manifest,
    document: &Document,
    expected: (u64, u64),
    conflict_message: &str,
) -> ServiceResult<()> {
    let outcome = store.append_if_match(
        surface_id,
        manifest.clone(),
        document.clone(),
        Some(expected.0),
        Some(expected.1),
    )?;
    if outcome.ok {
        return Ok(());
    }
    Err(ServiceError::Conflict {
        message: conflict_message.to_string(),
        current_manifest_revision: outcome.current_manifest_revision,
        current_dsl_revision: outcome.current_dsl_revision,
    })
}

/// Document-level operations: validate, parse, propose and commit dui-lang
/// documents.
#[derive(Debug, Clone)]
pub struct DslService {
    store: SharedStore,
    options: ServiceOptions,
}

impl DslService {
    pub fn new(store: SharedStore, options: ServiceOptions) -> Self {
        Self { store, options }
    }

    fn check(&self, mut document: Document, surface_id: &str) -> ServiceResult<DocumentCheck> {
        document.surface.id = surface_id.to_string();
        let result = validate_document(&document, &self.options.limits);
        let preview = if result.valid {
            let current = lock(&self.store).current_manifest(surface_id)?;
            Some(compile(&document, current.revision, Some(current.manifest_id.as_str())))
        } else {
            None
        };
        Ok(DocumentCheck {
            document,
            result,
            preview,
        })
    }

    /// Validate `document` as a candidate for `surface_id`. The preview keeps
    /// the current manifest's revision and id.
    #[instrument(skip(self, document))]
    pub fn validate(&self, document: &Document, surface_id: &str) -> ServiceResult<DocumentCheck> {
        self.check(document.clone(), &normalize_surface_id(Some(surface_id)))
    }

    #[instrument(skip(self, source))]
    pub fn parse(&self, source: &str, surface_id: &str) -> ServiceResult<DocumentCheck> {
        let document = parse(source)?;
        self.check(document, &normalize_surface_id(Some(surface_id)))
    }

    /// Ask `producer` for a next document and vet it: mode gate first, then
    /// validation.
    #[instrument(skip(self, prompt, producer))]
    pub fn propose(
        &self,
        prompt: &str,
        surface_id: &str,
        mode: Mode,
        producer: &dyn DocumentProducer,
    ) -> ServiceResult<DocumentProposal> {
        let surface_id = normalize_surface_id(Some(surface_id));
        let (current_document, current_manifest) = {
            let mut store = lock(&self.store);
            (store.current_document(&surface_id)?, store.current_manifest(&surface_id)?)
        };

        let context = ProducerContext {
            surface_id: &surface_id,
            mode,
            manifest: &current_manifest,
            document: &current_document,
        };
        let proposal = producer.propose_document(prompt, &context)?;
        let mut document = proposal.output;
        document.surface.id = surface_id.clone();

        let mode_errors = check_document_change(&current_document, &document, mode);
        if !mode_errors.is_empty() {
            return Err(ServiceError::Rejected {
                message: "Document change rejected by mode policy".to_string(),
                errors: mode_errors,
                patch_plan_id: None,
            });
        }

        let result = validate_document(&document, &self.options.limits);
        if !result.valid {
            return Err(ServiceError::Invalid {
                message: "Producer returned an invalid document".to_string(),
                issues: result.errors,
            });
        }

        let preview = compile(
            &document,
            current_manifest.revision,
            Some(current_manifest.manifest_id.as_str()),
        );
        Ok(DocumentProposal {
            document,
            result,
            preview,
            warnings: proposal.warnings,
        })
    }

    /// Commit `document` as the surface's next revision.
    ///
    /// Expectations, when given, must match the current revisions. The
    /// stored document gets `meta.revision = current + 1`; the manifest is
    /// compiled at the next manifest revision.
    #[instrument(skip(self, document))]
    pub fn commit(
        &self,
        document: &Document,
        surface_id: &str,
        approved_by: Option<&str>,
        expected_manifest_revision: Option<u64>,
        expected_dsl_revision: Option<u64>,
    ) -> ServiceResult<CommitOutcome> {
        let surface_id = normalize_surface_id(Some(surface_id));
        let mut next_document = document.clone();
        next_document.surface.id = surface_id.clone();

        let result = validate_document(&next_document, &self.options.limits);
        if !result.valid {
            return Err(ServiceError::Invalid {
                message: "Document failed validation".to_string(),
                issues: result.errors,
            });
        }

        let mut store = lock(&self.store);
        let current_manifest = store.current_manifest(&surface_id)?;
        let current_document = store.current_document(&surface_id)?;
        let current = (current_manifest.revision, current_document.meta.revision);

        if expected_manifest_revision.is_some_and(|rev| rev != current.0) {
            return Err(conflict("stale manifest revision for DUI commit", current));
        }
        if expected_dsl_revision.is_some_and(|rev| rev != current.1) {
            return Err(conflict("stale DUI revision for commit", current));
        }

        next_document.meta.revision = current.1 + 1;
        next_document.meta.created_at = Utc::now();
        if let Some(approved_by) = approved_by {
            next_document.meta.created_by = approved_by.to_string();
        }

        let mut next_manifest = compile(&next_document, current.0 + 1, None);
        next_manifest
            .metadata
            .insert("surface_id".to_string(), surface_id.clone());
        next_manifest
            .metadata
            .insert("write_source".to_string(), "dui".to_string());

        consistency_errors(&mut store, &self.options, &surface_id, &next_manifest)?;
        append(
            &mut store,
            &surface_id,
            &next_manifest,
            &next_document,
            current,
            "state changed during DUI commit; retry",
        )?;

        info!(
            surface_id = %surface_id,
            revision = next_manifest.revision,
            "committed document"
        );
        Ok(CommitOutcome {
            manifest: next_manifest,
            document: next_document,
        })
    }
}

fn conflict(message: &str, current: (u64, u64)) -> ServiceError {
    ServiceError::Conflict {
        message: message.to_string(),
        current_manifest_revision: current.0,
        current_dsl_revision: current.1,
    }
}

/// Input to [`UiService::propose`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub user_prompt: String,
    pub surface_id: String,
    pub mode: Mode,
    pub session_id: String,
    pub turn_id: Option<String>,
    /// Manifest the caller was looking at; a stale id is a conflict
    pub current_manifest_id: Option<String>,
}

impl PlanRequest {
    pub fn new(user_prompt: impl Into<String>, surface_id: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            surface_id: surface_id.into(),
            mode: Mode::default(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            turn_id: None,
            current_manifest_id: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanProposal {
    pub plan: PatchPlan,
    /// Patched manifest under the current revision and id
    pub preview: Manifest,
    pub warnings: Vec<String>,
}

/// Manifest-level operations: patch plans, their commits and reverts.
#[derive(Debug, Clone)]
pub struct UiService {
    store: SharedStore,
    options: ServiceOptions,
}

impl UiService {
    pub fn new(store: SharedStore, options: ServiceOptions) -> Self {
        Self { store, options }
    }

    /// Produce and gate a patch plan. Rejected plans are stored as
    /// `rejected` and reported as an error; accepted ones are stored as
    /// drafts.
    #[instrument(skip(self, request, producer), fields(surface_id = %request.surface_id, mode = %request.mode))]
    pub fn propose(&self, request: PlanRequest, producer: &dyn PatchProducer) -> ServiceResult<PlanProposal> {
        let surface_id = normalize_surface_id(Some(request.surface_id.as_str()));
        let mut store = lock(&self.store);
        let current_manifest = store.current_manifest(&surface_id)?;
        let current_document = store.current_document(&surface_id)?;

        if let Some(expected_id) = &request.current_manifest_id {
            if *expected_id != current_manifest.manifest_id {
                return Err(conflict(
                    "current_manifest_id is stale",
                    (current_manifest.revision, current_document.meta.revision),
                ));
            }
        }

        let context = ProducerContext {
            surface_id: &surface_id,
            mode: request.mode,
            manifest: &current_manifest,
            document: &current_document,
        };
        let proposal = producer.propose_operations(&request.user_prompt, &context)?;

        let mut plan = PatchPlan::draft(
            request.user_prompt,
            surface_id.clone(),
            request.mode,
            proposal.output,
        );
        plan.session_id = request.session_id;
        plan.turn_id = request.turn_id;
        plan.warnings = proposal.warnings;
        plan.base_manifest_id = Some(current_manifest.manifest_id.clone());
        plan.base_revision = Some(current_manifest.revision);

        let verdict = check_patch(&current_manifest, &plan.operations, plan.mode);
        if !verdict.is_accepted() {
            warn!(patch_plan_id = %plan.patch_plan_id, errors = verdict.errors.len(), "patch plan rejected by policy");
            plan.reject(verdict.errors.iter().cloned())?;
            store.save_patch_plan(&mut plan, Some(surface_id.as_str()))?;
            return Err(ServiceError::Rejected {
                message: "Patch plan rejected by policy".to_string(),
                errors: verdict.errors,
                patch_plan_id: Some(plan.patch_plan_id),
            });
        }

        plan.warnings.extend(verdict.warnings);
        let mut preview = apply_patch(&current_manifest, &plan.operations);
        preview.revision = current_manifest.revision;
        preview.manifest_id = current_manifest.manifest_id.clone();

        store.save_patch_plan(&mut plan, Some(surface_id.as_str()))?;
        info!(patch_plan_id = %plan.patch_plan_id, operations = plan.operations.len(), "drafted patch plan");
        Ok(PlanProposal {
            warnings: plan.warnings.clone(),
            plan,
            preview,
        })
    }

    /// Commit a draft plan as the surface's next revision.
    #[instrument(skip(self))]
    pub fn commit(
        &self,
        patch_plan_id: &str,
        surface_id: &str,
        session_id: Option<&str>,
        expected_base_revision: Option<u64>,
    ) -> ServiceResult<CommitOutcome> {
        let surface_id = normalize_surface_id(Some(surface_id));
        let mut store = lock(&self.store);

        let found = match store.get_patch_plan(patch_plan_id, Some(surface_id.as_str()))? {
            Some(plan) => Some(plan),
            None => store.get_patch_plan(patch_plan_id, None)?,
        };
        let Some(mut plan) = found else {
            return Err(ServiceError::NotFound("patch_plan_id".to_string()));
        };
        if !plan.surface_id.is_empty() && plan.surface_id != surface_id {
            return Err(ServiceError::Rejected {
                message: "patch_plan belongs to another surface".to_string(),
                errors: vec![format!("plan surface is {}", plan.surface_id)],
                patch_plan_id: Some(plan.patch_plan_id),
            });
        }
        plan.commit()?;

        let current_manifest = store.current_manifest(&surface_id)?;
        let current_document = store.current_document(&surface_id)?;
        let current = (current_manifest.revision, current_document.meta.revision);

        if plan.base_revision.is_some_and(|rev| rev != current.0) {
            return Err(conflict("Patch plan base revision is stale", current));
        }
        if expected_base_revision.is_some_and(|rev| rev != current.0) {
            return Err(conflict("Commit request uses stale base revision", current));
        }

        let verdict = check_patch(&current_manifest, &plan.operations, plan.mode);
        if !verdict.is_accepted() {
            return Err(ServiceError::Rejected {
                message: "Patch plan failed policy on commit".to_string(),
                errors: verdict.errors,
                patch_plan_id: Some(plan.patch_plan_id),
            });
        }

        let mut next_manifest = apply_patch(&current_manifest, &plan.operations);
        next_manifest
            .metadata
            .insert("surface_id".to_string(), surface_id.clone());
        next_manifest
            .metadata
            .insert("write_source".to_string(), "patch_plan".to_string());
        next_manifest
            .metadata
            .insert("patch_plan_id".to_string(), plan.patch_plan_id.clone());

        consistency_errors(&mut store, &self.options, &surface_id, &next_manifest)?;

        let session_id = session_id.unwrap_or(DEFAULT_SESSION_ID);
        let next_document = project(&next_manifest, &current_document, session_id);
        append(
            &mut store,
            &surface_id,
            &next_manifest,
            &next_document,
            current,
            "state changed during commit; retry intent",
        )?;

        plan.surface_id = surface_id.clone();
        plan.session_id = session_id.to_string();
        store.update_patch_plan(&plan)?;

        info!(
            patch_plan_id = %plan.patch_plan_id,
            revision = next_manifest.revision,
            "committed patch plan"
        );
        Ok(CommitOutcome {
            manifest: next_manifest,
            document: next_document,
        })
    }

    /// Re-issue revision `target_revision` as the surface's next revision.
    #[instrument(skip(self))]
    pub fn revert(
        &self,
        target_revision: u64,
        surface_id: &str,
        approved_by: Option<&str>,
    ) -> ServiceResult<CommitOutcome> {
        let surface_id = normalize_surface_id(Some(surface_id));
        let mut store = lock(&self.store);

        let current_manifest = store.current_manifest(&surface_id)?;
        let current_document = store.current_document(&surface_id)?;
        let current = (current_manifest.revision, current_document.meta.revision);

        let Some(target) = store.get_revision(target_revision, &surface_id)? else {
            return Err(ServiceError::NotFound("target revision".to_string()));
        };

        let mut reverted = clone_with_revision(&target, current.0 + 1);
        reverted
            .metadata
            .insert("reverted_from".to_string(), current.0.to_string());
        reverted
            .metadata
            .insert("reverted_to".to_string(), target_revision.to_string());
        reverted
            .metadata
            .insert("surface_id".to_string(), surface_id.clone());
        reverted
            .metadata
            .insert("write_source".to_string(), "revert".to_string());

        let next_document = project(
            &reverted,
            &current_document,
            approved_by.unwrap_or(DEFAULT_SESSION_ID),
        );
        append(
            &mut store,
            &surface_id,
            &reverted,
            &next_document,
            current,
            "state changed during revert; retry",
        )?;

        info!(
            surface_id = %surface_id,
            from = current.0,
            to = target_revision,
            "reverted surface"
        );
        Ok(CommitOutcome {
            manifest: reverted,
            document: next_document,
        })
    }
}
