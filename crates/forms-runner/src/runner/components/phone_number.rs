use serde_json::Value;

use super::{component_name, validate_answer, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const PHONE_MESSAGE: &str =
    "Enter a phone number, like 02010 960 001, 07729 900 982 or +44 808 157 0192";

#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberComponentHandler;

/// UK numbers in national (`0…`) or international (`+44…`, optional trunk `0`) form.
/// Spaces, dashes and brackets are ignored. National numbers start with 1, 2, 3, 5, 7, 8 or 9.
pub(crate) fn is_uk_phone_number(candidate: &str) -> bool {
    let compact: String = candidate
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
        .collect();
    let national = if let Some(rest) = compact.strip_prefix("+44") {
        rest.strip_prefix('0').unwrap_or(rest)
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        return false;
    };
    let leading_digit_valid = national
        .chars()
        .next()
        .is_some_and(|ch| matches!(ch, '1' | '2' | '3' | '5' | '7' | '8' | '9'));
    leading_digit_valid
        && (9..=10).contains(&national.len())
        && national.chars().all(|ch| ch.is_ascii_digit())
}

impl ComponentHandler for PhoneNumberComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::PhoneNumber]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        validate_answer(component, context, evaluator, PHONE_MESSAGE, |value| {
            let valid = value.as_str().is_some_and(is_uk_phone_number);
            (!valid).then(|| PHONE_MESSAGE.to_string())
        })
    }

    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        Ok(data.get(name).cloned().unwrap_or(Value::Null))
    }
}
