use serde_json::Value;

use super::{component_name, validate_answer, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const REQUIRED_MESSAGE: &str = "An answer is required";

/// Free-text style components: the answer is stored exactly as submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComponentHandler;

impl ComponentHandler for DefaultComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[
            ComponentType::Text,
            ComponentType::MultilineText,
            ComponentType::FileUpload,
        ]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        validate_answer(component, context, evaluator, REQUIRED_MESSAGE, |_| None)
    }

    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        Ok(data.get(name).cloned().unwrap_or(Value::Null))
    }
}
