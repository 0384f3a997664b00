use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{answer_in, apply_validation_rules, component_name, ComponentHandler, ComponentType};
use crate::runner::domain::{Component, FormData, UkAddress};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const LINE1_REQUIRED: &str =
    "[addressLine1]-Enter address line 1, typically the building and street";
const TOWN_REQUIRED: &str = "[addressTown]-Enter town or city";
const POSTCODE_REQUIRED: &str = "[addressPostcode]-Enter postcode";
const POSTCODE_INVALID: &str = "[addressPostcode]-Enter a full UK postcode";

#[derive(Debug, Clone, Copy, Default)]
pub struct UkAddressComponentHandler;

fn postcode_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)^(GIR ?0AA|[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2})$").ok()
        })
        .as_ref()
}

pub(crate) fn is_full_uk_postcode(candidate: &str) -> bool {
    postcode_pattern().is_some_and(|pattern| pattern.is_match(candidate.trim()))
}

fn field<'v>(address: Option<&'v Value>, key: &str) -> Option<&'v str> {
    address
        .and_then(|value| value.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

impl ComponentHandler for UkAddressComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::UkAddress]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        let address = answer_in(context, component)?;
        let line1 = field(address, "addressLine1");
        let town = field(address, "town");
        let postcode = field(address, "postcode");
        let untouched = line1.is_none()
            && town.is_none()
            && postcode.is_none()
            && field(address, "addressLine2").is_none()
            && field(address, "county").is_none();

        let mut errors = Vec::new();
        if untouched && component.optional {
            return Ok(errors);
        }
        if !component.optional {
            if line1.is_none() {
                errors.push(LINE1_REQUIRED.to_string());
            }
            if town.is_none() {
                errors.push(TOWN_REQUIRED.to_string());
            }
            if postcode.is_none() {
                errors.push(POSTCODE_REQUIRED.to_string());
            }
            if untouched {
                return Ok(errors);
            }
        }
        if let Some(postcode) = postcode {
            if !is_full_uk_postcode(postcode) {
                errors.push(POSTCODE_INVALID.to_string());
            }
        }
        apply_validation_rules(component, context, evaluator, &mut errors)?;
        Ok(errors)
    }

    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        let part = |suffix: &str| {
            data.get(&format!("{name}-{suffix}"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let address = UkAddress {
            address_line1: part("addressLine1"),
            address_line2: part("addressLine2"),
            town: part("addressTown"),
            county: part("addressCounty"),
            postcode: part("addressPostcode"),
        };
        serde_json::to_value(address).map_err(|err| RunnerError::DataIntegrity(err.to_string()))
    }
}
