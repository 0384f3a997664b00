//! Per-type conversion and validation of component answers.

mod date_parts;
mod default;
mod email;
mod number;
mod options;
mod phone_number;
mod uk_address;
mod yes_no;

use std::str::FromStr;

use serde_json::Value;

use super::domain::{Component, FormData};
use super::error::RunnerError;
use super::expression::ExpressionEvaluator;

pub use date_parts::DatePartsComponentHandler;
pub use default::DefaultComponentHandler;
pub use email::EmailComponentHandler;
pub use number::NumberComponentHandler;
pub use options::OptionsComponentHandler;
pub use phone_number::PhoneNumberComponentHandler;
pub use uk_address::UkAddressComponentHandler;
pub use yes_no::YesNoComponentHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Text,
    MultilineText,
    FileUpload,
    Select,
    Radio,
    Checkbox,
    YesNo,
    Number,
    Email,
    PhoneNumber,
    UkAddress,
    DateParts,
    Html,
}

impl ComponentType {
    pub const fn label(self) -> &'static str {
        match self {
            ComponentType::Text => "text",
            ComponentType::MultilineText => "multilineText",
            ComponentType::FileUpload => "fileupload",
            ComponentType::Select => "select",
            ComponentType::Radio => "radio",
            ComponentType::Checkbox => "checkbox",
            ComponentType::YesNo => "yesno",
            ComponentType::Number => "number",
            ComponentType::Email => "email",
            ComponentType::PhoneNumber => "phonenumber",
            ComponentType::UkAddress => "ukaddress",
            ComponentType::DateParts => "dateParts",
            ComponentType::Html => "html",
        }
    }

    /// Display-only components carry no answer.
    pub const fn is_display_only(self) -> bool {
        matches!(self, ComponentType::Html)
    }
}

impl FromStr for ComponentType {
    type Err = RunnerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value {
            "text" => ComponentType::Text,
            "multilineText" => ComponentType::MultilineText,
            "fileupload" => ComponentType::FileUpload,
            "select" => ComponentType::Select,
            "radio" => ComponentType::Radio,
            "checkbox" => ComponentType::Checkbox,
            "yesno" => ComponentType::YesNo,
            "number" => ComponentType::Number,
            "email" => ComponentType::Email,
            "phonenumber" => ComponentType::PhoneNumber,
            "ukaddress" => ComponentType::UkAddress,
            "dateParts" => ComponentType::DateParts,
            "html" => ComponentType::Html,
            other => {
                return Err(RunnerError::Configuration(format!(
                    "No handler found for component type {other}."
                )))
            }
        };
        Ok(kind)
    }
}

/// Converts raw submitted data into a component answer and validates answers in context.
pub trait ComponentHandler: Send + Sync {
    /// Component types this handler serves.
    fn kinds(&self) -> &'static [ComponentType];

    fn is_for(&self, kind: ComponentType) -> bool {
        self.kinds().contains(&kind)
    }

    /// Validation messages for the component's answer as found in the flattened `context`.
    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError>;

    /// Typed answer built from the raw submission.
    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError>;
}

/// Handler for an answerable component type; `None` for display-only types.
pub fn handler_for(kind: ComponentType) -> Option<&'static dyn ComponentHandler> {
    match kind {
        ComponentType::Text | ComponentType::MultilineText | ComponentType::FileUpload => {
            Some(&DefaultComponentHandler)
        }
        ComponentType::Select | ComponentType::Radio | ComponentType::Checkbox => {
            Some(&OptionsComponentHandler)
        }
        ComponentType::YesNo => Some(&YesNoComponentHandler),
        ComponentType::Number => Some(&NumberComponentHandler),
        ComponentType::Email => Some(&EmailComponentHandler),
        ComponentType::PhoneNumber => Some(&PhoneNumberComponentHandler),
        ComponentType::UkAddress => Some(&UkAddressComponentHandler),
        ComponentType::DateParts => Some(&DatePartsComponentHandler),
        ComponentType::Html => None,
    }
}

pub(crate) fn component_name(component: &Component) -> Result<&str, RunnerError> {
    component
        .name
        .as_deref()
        .ok_or_else(|| RunnerError::Configuration("Component name is required".to_string()))
}

/// Absent, null, empty string and empty list all count as "no answer".
pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

pub(crate) fn answer_in<'c>(
    context: &'c Value,
    component: &Component,
) -> Result<Option<&'c Value>, RunnerError> {
    let name = component_name(component)?;
    Ok(context.get(name))
}

pub(crate) fn required_message(component: &Component, fallback: &str) -> String {
    component
        .optional_error_message
        .clone()
        .unwrap_or_else(|| fallback.to_string())
}

/// Appends the message of every authored rule whose expression is falsy.
pub(crate) fn apply_validation_rules(
    component: &Component,
    context: &Value,
    evaluator: &dyn ExpressionEvaluator,
    errors: &mut Vec<String>,
) -> Result<(), RunnerError> {
    for rule in &component.validation_rules {
        if !evaluator.is_satisfied(&rule.expression, context)? {
            errors.push(rule.error_message.clone());
        }
    }
    Ok(())
}

/// String view of a scalar answer, as typed by the user.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Shared validation flow: required check, an optional format check, then authored rules.
/// A blank answer never reaches the format check or the rules.
pub(crate) fn validate_answer(
    component: &Component,
    context: &Value,
    evaluator: &dyn ExpressionEvaluator,
    required_fallback: &str,
    format_check: impl Fn(&Value) -> Option<String>,
) -> Result<Vec<String>, RunnerError> {
    let value = answer_in(context, component)?;
    let mut errors = Vec::new();
    let Some(value) = value.filter(|value| !is_blank(Some(*value))) else {
        if !component.optional {
            errors.push(required_message(component, required_fallback));
        }
        return Ok(errors);
    };
    if let Some(message) = format_check(value) {
        errors.push(message);
    }
    apply_validation_rules(component, context, evaluator, &mut errors)?;
    Ok(errors)
}
