//! Application processing engine: answers, validation and page navigation.

pub mod answers;
pub mod api;
pub mod components;
pub mod conditions;
pub mod domain;
pub mod error;
pub mod expression;
pub mod navigation;
pub mod pages;
pub mod service;
pub mod store;

pub use answers::{AnswerSet, ComponentAnswer};
pub use api::{
    GetApplicationRequest, GetApplicationResponse, MoJAddAnotherRequest, MoJRemoveRequest,
    ProcessApplicationRequest, ProcessApplicationResponse, StartApplicationRequest,
    StartApplicationResponse,
};
pub use domain::{
    AddAnotherSection, Application, ApplicationStatus, ChoiceOption, Component, Condition,
    DateComparison, DateError, DateParts, DateValidationRule, Form, FormData, Page, PageType,
    UkAddress, ValidationRule,
};
pub use error::{RunnerError, UseCaseError};
pub use expression::{EvalError, ExpressionEvaluator, SandboxedEvaluator};
pub use service::FormsRunnerService;
pub use store::{ApplicationStore, FormStore, StoreError};

#[cfg(test)]
mod tests;
