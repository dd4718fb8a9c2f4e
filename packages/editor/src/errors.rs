//! Error types for the editor

use crate::plan::PlanStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("patch_plan is already {status}")]
    InvalidTransition { status: PlanStatus },
}
