use serde_json::Value;

use super::{
    component_name, is_blank, scalar_text, validate_answer, ComponentHandler, ComponentType,
};
use crate::runner::domain::{ChoiceOption, Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const REQUIRED_MESSAGE: &str = "An answer is required";

/// Select, radio and checkbox: submitted values are swapped for the matching option.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionsComponentHandler;

pub(crate) fn no_matching_option(value: &str, name: &str) -> RunnerError {
    RunnerError::DataIntegrity(format!(
        "No matching option found or invalid option type for value: {value} in component: {name}"
    ))
}

fn matching_option<'c>(component: &'c Component, value: &Value) -> Option<&'c ChoiceOption> {
    let text = scalar_text(value)?;
    component.options.iter().find(|option| option.value == text)
}

fn option_value(option: &ChoiceOption) -> Value {
    serde_json::json!({
        "id": option.id,
        "label": option.label,
        "value": option.value,
    })
}

impl ComponentHandler for OptionsComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[
            ComponentType::Select,
            ComponentType::Radio,
            ComponentType::Checkbox,
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
        let Some(submitted) = data.get(name).filter(|value| !is_blank(Some(*value))) else {
            return Ok(Value::String(String::new()));
        };

        if let Value::Array(values) = submitted {
            let mut selected = Vec::with_capacity(values.len());
            for value in values {
                match matching_option(component, value) {
                    Some(option) => selected.push(option_value(option)),
                    None if component.optional => {}
                    None => {
                        let shown = scalar_text(value).unwrap_or_else(|| value.to_string());
                        return Err(no_matching_option(&shown, name));
                    }
                }
            }
            return Ok(Value::Array(selected));
        }

        match matching_option(component, submitted) {
            Some(option) => Ok(option_value(option)),
            None if component.optional => Ok(Value::String(String::new())),
            None => {
                let shown = scalar_text(submitted).unwrap_or_else(|| submitted.to_string());
                Err(no_matching_option(&shown, name))
            }
        }
    }
}
