use thiserror::Error;

use super::domain::{Application, Form};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
    #[error("Unknown error occurred.")]
    Unknown,
}

/// Persistence for in-progress applications, keyed by applicant.
pub trait ApplicationStore: Send + Sync {
    fn get_application(&self, applicant_id: &str) -> Result<Option<Application>, StoreError>;
    fn update_application(&self, application: Application) -> Result<(), StoreError>;
    fn delete_application(&self, applicant_id: &str) -> Result<(), StoreError>;
}

/// Read access to published form definitions.
pub trait FormStore: Send + Sync {
    fn get_form(&self, form_id: &str) -> Result<Option<Form>, StoreError>;
}
