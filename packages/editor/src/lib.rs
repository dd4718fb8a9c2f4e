//! # DUI Editor
//!
//! Manifest editing: typed patch operations, the mode policy gate that
//! vets them, and the patch plans that carry them through review.
//!
//! ```text
//! operations ──check_patch──▶ PolicyResult
//!      │                          │ accepted
//!      └────────apply_patch◀──────┘
//!                   │
//!                   ▼
//!            Manifest (revision + 1)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dui_editor::{apply_patch, check_patch, Mode, PatchOperation};
//!
//! let ops = vec![PatchOperation::SetThemeProfile { profile: ThemeProfile::Minimal }];
//! let verdict = check_patch(&manifest, &ops, Mode::Safe);
//! if verdict.is_accepted() {
//!     let next = apply_patch(&manifest, &ops);
//! }
//! ```

mod errors;
mod patch;
mod plan;
mod policy;

pub use errors::PlanError;
pub use patch::{apply_patch, clone_with_revision, OperationKind, PatchOperation};
pub use plan::{PatchPlan, PlanStatus, DEFAULT_SESSION_ID};
pub use policy::{
    check_document_change, check_patch, Mode, PolicyProfile, PolicyResult, EXPERIMENTAL_PROFILE,
    EXTENDED_PROFILE, SAFE_PROFILE,
};
