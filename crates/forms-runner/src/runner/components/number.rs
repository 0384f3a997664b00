use serde_json::Value;

use super::{component_name, validate_answer, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const NUMBER_MESSAGE: &str = "Enter a number";

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberComponentHandler;

fn is_number(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false),
        _ => false,
    }
}

impl ComponentHandler for NumberComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::Number]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        validate_answer(component, context, evaluator, NUMBER_MESSAGE, |value| {
            (!is_number(value)).then(|| NUMBER_MESSAGE.to_string())
        })
    }

    /// Numbers keep the submitted text; parsing only happens during validation.
    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        Ok(data.get(name).cloned().unwrap_or(Value::Null))
    }
}
