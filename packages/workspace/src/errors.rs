use dui_editor::PlanError;
use dui_parser::ParseError;
use dui_validator::Issue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode store state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{log} revision {attempted} does not follow current revision {current}")]
    NonMonotonicRevision {
        log: &'static str,
        current: u64,
        attempted: u64,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the service layer. Validation and policy outcomes that reject
/// a request carry their messages; conflicts carry the current revisions.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{message}")]
    Invalid { message: String, issues: Vec<Issue> },

    #[error("{message}: {}", .errors.join("; "))]
    Rejected {
        message: String,
        errors: Vec<String>,
        patch_plan_id: Option<String>,
    },

    #[error("{message} (current manifest revision {current_manifest_revision}, current dsl revision {current_dsl_revision})")]
    Conflict {
        message: String,
        current_manifest_revision: u64,
        current_dsl_revision: u64,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Producer failed: {0}")]
    Producer(#[from] ProducerError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure reported by an untrusted producer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProducerError(pub String);
