use chrono::{Local, NaiveDate};
use serde_json::Value;

use super::{answer_in, component_name, scalar_text, ComponentHandler, ComponentType};
use crate::runner::domain::{
    Component, DateComparison, DateError, DateParts, DateValidationRule, FormData,
};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;

const DEFAULT_DATE_NAME: &str = "date";
const EARLIEST_YEAR: i32 = 1901;

/// Three-part date entry. Errors are [`DateError`] values encoded as JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePartsComponentHandler;

impl DatePartsComponentHandler {
    /// Validation against an explicit "today", used for the relative comparisons.
    pub fn validate_on(
        &self,
        component: &Component,
        context: &Value,
        today: NaiveDate,
    ) -> Result<Vec<String>, RunnerError> {
        let input = answer_in(context, component)?;
        let parts = input.map(parts_from_value).unwrap_or_default();
        let date_name = component.date_name.as_deref().unwrap_or(DEFAULT_DATE_NAME);

        if is_empty(&parts) && component.optional {
            return Ok(Vec::new());
        }
        if !component.optional {
            if let Some(error) = check_complete(&parts, date_name) {
                return Ok(vec![error.encode()]);
            }
            if let Some(error) = check_real_date(&parts, date_name) {
                return Ok(vec![error.encode()]);
            }
        }

        let Some(date) = to_date(&parts) else {
            return Ok(Vec::new());
        };
        let mut errors = Vec::new();
        for rule in &component.date_validation_rules {
            if let Some(error) = apply_rule(rule, date, today, context)? {
                errors.push(error.encode());
            }
        }
        Ok(errors)
    }
}

impl ComponentHandler for DatePartsComponentHandler {
    fn kinds(&self) -> &'static [ComponentType] {
        &[ComponentType::DateParts]
    }

    fn validate(
        &self,
        component: &Component,
        context: &Value,
        _evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Vec<String>, RunnerError> {
        self.validate_on(component, context, Local::now().date_naive())
    }

    fn convert(&self, component: &Component, data: &FormData) -> Result<Value, RunnerError> {
        let name = component_name(component)?;
        let part = |suffix: &str| {
            data.get(&format!("{name}-{suffix}"))
                .and_then(scalar_text)
                .map(|text| text.trim().to_string())
        };
        let parts = DateParts {
            day: part("day"),
            month: part("month"),
            year: part("year"),
        };
        serde_json::to_value(parts).map_err(|err| RunnerError::DataIntegrity(err.to_string()))
    }
}

fn parts_from_value(value: &Value) -> DateParts {
    let part = |key: &str| value.get(key).and_then(scalar_text);
    DateParts {
        day: part("day"),
        month: part("month"),
        year: part("year"),
    }
}

fn present(part: &Option<String>) -> bool {
    part.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn is_empty(parts: &DateParts) -> bool {
    !present(&parts.day) && !present(&parts.month) && !present(&parts.year)
}

fn check_complete(parts: &DateParts, date_name: &str) -> Option<DateError> {
    if is_empty(parts) {
        return Some(DateError::whole_date(format!("Enter your {date_name}")));
    }
    let missing: Vec<&str> = [
        ("day", &parts.day),
        ("month", &parts.month),
        ("year", &parts.year),
    ]
    .into_iter()
    .filter(|(_, part)| !present(part))
    .map(|(label, _)| label)
    .collect();
    if missing.is_empty() {
        return None;
    }
    Some(DateError {
        error_message: format!("{date_name} must include a {}", missing.join(" and ")),
        day_error: !present(&parts.day),
        month_error: !present(&parts.month),
        year_error: !present(&parts.year),
    })
}

fn numeric(part: &Option<String>) -> Option<u32> {
    let text = part.as_deref()?.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

fn check_real_date(parts: &DateParts, date_name: &str) -> Option<DateError> {
    let real_date_message = format!("{date_name} must be a real date");
    let (day, month, year) = (numeric(&parts.day), numeric(&parts.month), numeric(&parts.year));
    let (Some(day), Some(month), Some(year)) = (day, month, year) else {
        return Some(DateError {
            error_message: real_date_message,
            day_error: day.is_none(),
            month_error: month.is_none(),
            year_error: year.is_none(),
        });
    };

    let year_digits = parts.year.as_deref().map(|text| text.trim().len()).unwrap_or(0);
    if year_digits != 4 {
        return Some(DateError {
            error_message: "Year must include 4 numbers".to_string(),
            day_error: false,
            month_error: false,
            year_error: true,
        });
    }

    let month_error = !(1..=12).contains(&month);
    let last_day = if month_error { 31 } else { days_in_month(i64::from(year), month) };
    let day_error = day < 1 || day > last_day;
    let year_error = (year as i32) < EARLIEST_YEAR;
    if day_error || month_error || year_error {
        return Some(DateError {
            error_message: real_date_message,
            day_error,
            month_error,
            year_error,
        });
    }
    None
}

fn to_date(parts: &DateParts) -> Option<NaiveDate> {
    let day = numeric(&parts.day)?;
    let month = numeric(&parts.month)?;
    let year = i32::try_from(numeric(&parts.year)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Date held by another date-parts answer. Blank answers resolve to nothing;
/// answers that are present but not a real date are a data error.
fn resolve_reference(context: &Value, id: Option<&str>) -> Result<Option<NaiveDate>, RunnerError> {
    let Some(id) = id else {
        return Ok(None);
    };
    let parts = match context.get(id) {
        Some(value) if value.is_object() => parts_from_value(value),
        _ => return Ok(None),
    };
    if is_empty(&parts) {
        return Ok(None);
    }
    to_date(&parts).map(Some).ok_or_else(|| {
        RunnerError::DataIntegrity("Invalid date parts provided for conversion".to_string())
    })
}

fn bound(
    literal: Option<NaiveDate>,
    reference: Option<&str>,
    context: &Value,
) -> Result<Option<NaiveDate>, RunnerError> {
    match literal {
        Some(date) => Ok(Some(date)),
        None => resolve_reference(context, reference),
    }
}

fn apply_rule(
    rule: &DateValidationRule,
    date: NaiveDate,
    today: NaiveDate,
    context: &Value,
) -> Result<Option<DateError>, RunnerError> {
    let raw = rule.comparison_type.as_deref().unwrap_or_default();
    let comparison: DateComparison = raw.parse()?;

    let fixed = || -> Result<NaiveDate, RunnerError> {
        bound(rule.fixed_date, rule.fixed_date_id.as_deref(), context)?.ok_or_else(|| {
            RunnerError::Configuration(format!(
                "Fixed date is required for comparison type: {}",
                comparison.label()
            ))
        })
    };

    let failed = match comparison {
        DateComparison::TodayOrInPast => date > today,
        DateComparison::InPast => date >= today,
        DateComparison::TodayOrInFuture => date < today,
        DateComparison::InFuture => date <= today,
        DateComparison::SameOrAfter => date < fixed()?,
        DateComparison::After => date <= fixed()?,
        DateComparison::SameOrBefore => date > fixed()?,
        DateComparison::Before => date >= fixed()?,
        DateComparison::Between => {
            let start = bound(rule.start_date, rule.start_date_id.as_deref(), context)?;
            let end = bound(rule.end_date, rule.end_date_id.as_deref(), context)?;
            let (start, end) = match (start, end) {
                (Some(start), Some(end)) => (start, end),
                (None, None) => {
                    return Err(RunnerError::Configuration(format!(
                        "Before and after date is required for comparison type: {}",
                        comparison.label()
                    )))
                }
                (Some(_), None) => {
                    return Err(RunnerError::Configuration(format!(
                        "After date is required for comparison type: {}",
                        comparison.label()
                    )))
                }
                (None, Some(_)) => {
                    return Err(RunnerError::Configuration(format!(
                        "Before date is required for comparison type: {}",
                        comparison.label()
                    )))
                }
            };
            date < start || date > end
        }
    };

    Ok(failed.then(|| DateError::whole_date(rule.error_message.clone())))
}
