use thiserror::Error;

use super::expression::EvalError;
use super::store::StoreError;

/// Failures raised while running a form.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{entity} with ID {id} not found.")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Expression(#[from] EvalError),
    #[error(
        "Page {page_id} was reached twice while walking the form; the page graph contains a cycle."
    )]
    GraphCycleDetected { page_id: String },
    #[error("Walking the form exceeded the limit of {budget} pages.")]
    StepBudgetExceeded { budget: usize },
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RunnerError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RunnerError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Error surfaced by a use case, tagged with what was being attempted and for whom.
#[derive(Debug, Error)]
#[error("Error {action} for applicant {applicant_id}: {source}")]
pub struct UseCaseError {
    pub action: &'static str,
    pub applicant_id: String,
    pub source: RunnerError,
}

impl UseCaseError {
    pub fn new(action: &'static str, applicant_id: impl Into<String>, source: RunnerError) -> Self {
        Self {
            action,
            applicant_id: applicant_id.into(),
            source,
        }
    }
}
