use serde_json::{json, Value};

use super::options::no_matching_option;
use super::{component_name, scalar_text, validate_answer, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const REQUIRED_MESSAGE: &str = "An answer is required";

#[derive(Debug, Clone, Copy, Default)]
pub struct YesNoComponentHandler;

fn fixed_option(value: &str) -> Option<Value> {
    let label = match value {
        "yes" => "Yes",
        "no" => "No",
        _ => return None,
    };
    Some(json!({ "id": value, "value": value, "label": label }))
}

impl ComponentHandler for YesNoComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::YesNo]
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
        let submitted = data.get(name).and_then(scalar_text).unwrap_or_default();
        if submitted.is_empty() {
            return Ok(Value::String(String::new()));
        }
        match fixed_option(&submitted) {
            Some(option) => Ok(option),
            None if component.optional => Ok(Value::String(String::new())),
            None => Err(no_matching_option(&submitted, name)),
        }
    }
}
