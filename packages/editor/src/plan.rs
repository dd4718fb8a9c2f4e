//! Patch plans: a proposed batch of operations plus its review state.
//!
//! A plan starts as `draft` and moves once, to `committed` or `rejected`.

use crate::errors::PlanError;
use crate::patch::PatchOperation;
use crate::policy::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SESSION_ID: &str = "demo-session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Draft,
    Committed,
    Rejected,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Committed => "committed",
            PlanStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchPlan {
    pub patch_plan_id: String,
    pub user_prompt: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default)]
    pub surface_id: String,
    #[serde(default)]
    pub turn_id: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub operations: Vec<PatchOperation>,
    /// Policy warnings, plus the policy errors of a rejected plan
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: PlanStatus,
    /// Manifest the operations were proposed against
    #[serde(default)]
    pub base_manifest_id: Option<String>,
    #[serde(default)]
    pub base_revision: Option<u64>,
}

impl PatchPlan {
    /// New draft plan with a fresh id
    pub fn draft(
        user_prompt: impl Into<String>,
        surface_id: impl Into<String>,
        mode: Mode,
        operations: Vec<PatchOperation>,
    ) -> Self {
        Self {
            patch_plan_id: uuid::Uuid::new_v4().to_string(),
            user_prompt: user_prompt.into(),
            session_id: default_session_id(),
            surface_id: surface_id.into(),
            turn_id: None,
            mode,
            operations,
            warnings: Vec::new(),
            created_at: Utc::now(),
            status: PlanStatus::Draft,
            base_manifest_id: None,
            base_revision: None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == PlanStatus::Draft
    }

    pub fn commit(&mut self) -> Result<(), PlanError> {
        self.transition(PlanStatus::Committed)
    }

    /// Reject the plan, recording why among its warnings
    pub fn reject<I, S>(&mut self, reasons: I) -> Result<(), PlanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transition(PlanStatus::Rejected)?;
        self.warnings.extend(reasons.into_iter().map(Into::into));
        Ok(())
    }

    fn transition(&mut self, to: PlanStatus) -> Result<(), PlanError> {
        if !self.is_draft() {
            return Err(PlanError::InvalidTransition {
                status: self.status,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_commits_once() {
        let mut plan = PatchPlan::draft("make it minimal", "math_lms.dashboard", Mode::Safe, vec![]);
        assert!(plan.is_draft());
        plan.commit().unwrap();
        assert_eq!(plan.status, PlanStatus::Committed);

        let err = plan.commit().unwrap_err();
        assert_eq!(err.to_string(), "patch_plan is already committed");
        assert_eq!(plan.reject(["late"]).unwrap_err(), err);
    }

    #[test]
    fn test_reject_records_reasons() {
        let mut plan = PatchPlan::draft("add widget", "s", Mode::Extended, vec![]);
        plan.reject(["Unknown template_id 'nope'"]).unwrap();
        assert_eq!(plan.status, PlanStatus::Rejected);
        assert_eq!(plan.warnings, vec!["Unknown template_id 'nope'"]);
        assert!(plan.commit().is_err());
    }

    #[test]
    fn test_plan_json_defaults() {
        let plan: PatchPlan = serde_json::from_str(
            r#"{"patch_plan_id": "p1", "user_prompt": "x", "operations": [{"op": "set_density", "density": "compact"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.session_id, "demo-session");
        assert_eq!(plan.mode, Mode::Extended);
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.operations.len(), 1);
    }
}
