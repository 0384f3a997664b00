use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{component_name, validate_answer, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const EMAIL_MESSAGE: &str = "Enter an email address in the correct format, like name@example.com";

#[derive(Debug, Clone, Copy, Default)]
pub struct EmailComponentHandler;

fn local_part_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+$").ok())
        .as_ref()
}

fn domain_label_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$").ok())
        .as_ref()
}

pub(crate) fn is_valid_email(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if domain.contains('@') || local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local_part_pattern().is_some_and(|pattern| pattern.is_match(local)) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_valid = labels
        .iter()
        .all(|label| domain_label_pattern().is_some_and(|pattern| pattern.is_match(label)));
    let tld_valid = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|ch| ch.is_ascii_alphabetic()));
    labels_valid && tld_valid
}

impl ComponentHandler for EmailComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::Email]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        validate_answer(component, context, evaluator, EMAIL_MESSAGE, |value| {
            let valid = value.as_str().is_some_and(is_valid_email);
            (!valid).then(|| EMAIL_MESSAGE.to_string())
        })
    }

    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        Ok(data.get(name).cloned().unwrap_or(Value::Null))
    }
}
