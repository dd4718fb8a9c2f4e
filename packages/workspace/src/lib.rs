//! # DUI Workspace
//!
//! Revisioned storage for surfaces and the services that write to it.
//!
//! ```text
//!  DocumentProducer ─┐                 ┌─ PatchProducer
//!                    ▼                 ▼
//!               DslService         UiService
//!        validate → compile    check_patch → apply → project
//!                    └───────┬─────────┘
//!                            ▼
//!          RevisionStore::append_if_match (CAS)
//!                            │
//!                            ▼
//!               state file (atomic replace)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dui_workspace::{shared, RevisionStore, ServiceOptions, UiService, PlanRequest};
//! use dui_workspace::RuleBasedPatchProducer;
//!
//! let store = shared(RevisionStore::open("state/dui.json")?);
//! let ui = UiService::new(store, ServiceOptions::default());
//! let proposal = ui.propose(PlanRequest::new("minimal, compact", "math_lms.dashboard"), &RuleBasedPatchProducer)?;
//! ui.commit(&proposal.plan.patch_plan_id, "math_lms.dashboard", None, None)?;
//! ```

mod consistency;
mod errors;
mod persist;
mod producer;
mod seed;
mod service;
mod store;

pub use consistency::check_theme_consistency;
pub use errors::{ProducerError, ServiceError, ServiceResult, StoreError, StoreResult};
pub use persist::{normalize_state, normalize_surface_id, StoreState, SurfaceState, SURFACE_STORE_VERSION};
pub use producer::{
    DocumentProducer, PatchProducer, ProducerContext, Proposal, ProvidedOperations,
    RuleBasedDocumentProducer, RuleBasedPatchProducer,
};
pub use seed::{
    seed_document, seed_manifest, DEFAULT_CATALOG_VERSION, DEFAULT_SURFACE_ID, LESSON_SURFACE_ID,
};
pub use service::{
    shared, CommitOutcome, DocumentCheck, DocumentProposal, DslService, PlanProposal, PlanRequest,
    ServiceOptions, SharedStore, UiService,
};
pub use store::{AppendOutcome, RevisionStore, SurfaceContext, SurfaceSummary};
