use std::collections::BTreeMap;

use serde_json::Value;

use super::{is_unfilled, resolve_components, PageHandler, ResolvedComponent, WalkStep};
use crate::runner::domain::{Application, FormData, PageType};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;
use crate::runner::navigation::flatten_with_item;

/// Repeating-section pages. Each item is converted and validated separately and
/// stored on the page itself; nothing is written to the answer set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoJAddAnotherPageHandler;

/// 1-based item number written as plain digits.
pub(crate) fn item_number(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|number| *number > 0)
}

/// Splits `"<n>-<key>"` or `"<key>-<n>"` into the 1-based item number and the inner key.
pub(crate) fn split_item_key(key: &str) -> Option<(usize, &str)> {
    if let Some((head, rest)) = key.split_once('-') {
        if let Some(number) = item_number(head) {
            if !rest.is_empty() {
                return Some((number, rest));
            }
        }
    }
    let (rest, tail) = key.rsplit_once('-')?;
    let number = item_number(tail)?;
    (!rest.is_empty()).then_some((number, rest))
}

fn belongs_to(inner_key: &str, names: &[&str]) -> bool {
    names.iter().any(|name| {
        inner_key == *name
            || inner_key
                .strip_prefix(name)
                .is_some_and(|suffix| suffix.starts_with('-'))
    })
}

/// Groups composite submission keys into one data map per item.
pub(crate) fn split_items(data: &FormData, names: &[&str]) -> BTreeMap<usize, FormData> {
    let mut items: BTreeMap<usize, FormData> = BTreeMap::new();
    for (key, value) in data {
        let Some((number, inner)) = split_item_key(key) else {
            continue;
        };
        if belongs_to(inner, names) {
            items
                .entry(number)
                .or_default()
                .insert(inner.to_string(), value.clone());
        }
    }
    items
}

fn error_key(name: &str, item_number: usize) -> String {
    format!("{name}-{item_number}")
}

fn validate_item(
    application: &Application,
    resolved: &[ResolvedComponent],
    item: &FormData,
    item_number: usize,
    evaluator: &dyn ExpressionEvaluator,
    page_errors: &mut BTreeMap<String, Vec<String>>,
) -> Result<(), RunnerError> {
    let context = flatten_with_item(application, item);
    for entry in resolved {
        let errors = entry.handler.validate(&entry.component, &context, evaluator)?;
        if !errors.is_empty() {
            page_errors.insert(error_key(&entry.name, item_number), errors);
        }
    }
    Ok(())
}

impl PageHandler for MoJAddAnotherPageHandler {
    fn page_type(&self) -> PageType {
        PageType::MojAddAnother
    }

    fn process(
        &self,
        application: &mut Application,
        page_id: &str,
        data: &FormData,
        skip_validation: bool,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<bool, RunnerError> {
        let page = application.page(page_id)?;
        let number_of_items = page.add_another.number_of_items;
        let resolved = resolve_components(&page.components)?;
        let names: Vec<&str> = resolved.iter().map(|entry| entry.name.as_str()).collect();
        let submitted = split_items(data, &names);

        {
            let section = &mut application.page_mut(page_id)?.add_another;
            section.page_answer = Vec::with_capacity(number_of_items);
            section.page_errors = BTreeMap::new();
        }

        let empty = FormData::new();
        let mut page_errors = BTreeMap::new();
        for item_number in 1..=number_of_items {
            let raw = submitted.get(&item_number).unwrap_or(&empty);
            let mut item = FormData::new();
            for entry in &resolved {
                let answer = entry.handler.convert(&entry.component, raw)?;
                item.insert(entry.name.clone(), answer);
            }
            application
                .page_mut(page_id)?
                .add_another
                .page_answer
                .push(item.clone());

            if !skip_validation {
                validate_item(
                    application,
                    &resolved,
                    &item,
                    item_number,
                    evaluator,
                    &mut page_errors,
                )?;
            }
        }

        let has_errors = !page_errors.is_empty();
        application.page_mut(page_id)?.add_another.page_errors = page_errors;
        application.answers.clear_page(page_id);
        tracing::debug!(page_id, number_of_items, has_errors, "processed add-another page");
        Ok(has_errors)
    }

    fn walk(
        &self,
        application: &mut Application,
        page_id: &str,
        _extra_data: Option<&str>,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<WalkStep, RunnerError> {
        let page = application.page(page_id)?;
        let page_type = page.page_type.clone();
        let number_of_items = page.add_another.number_of_items;
        let items = page.add_another.page_answer.clone();
        let resolved = resolve_components(&page.components)?;

        let mut page_errors = BTreeMap::new();
        let mut unfilled = false;
        for index in 0..number_of_items {
            let mut hydrated = FormData::new();
            for entry in &resolved {
                let answer = items.get(index).and_then(|item| item.get(&entry.name));
                if is_unfilled(answer) {
                    unfilled = true;
                    break;
                }
                hydrated.insert(entry.name.clone(), answer.cloned().unwrap_or(Value::Null));
            }
            if unfilled {
                tracing::debug!(page_id, item = index + 1, "walk halted on unfilled item");
                break;
            }
            validate_item(
                application,
                &resolved,
                &hydrated,
                index + 1,
                evaluator,
                &mut page_errors,
            )?;
        }

        let has_errors = !page_errors.is_empty();
        application.page_mut(page_id)?.add_another.page_errors = page_errors;
        application.answers.clear_page(page_id);

        if unfilled || has_errors {
            return Ok(WalkStep {
                page_id: Some(page_id.to_string()),
                page_type,
                stop: true,
            });
        }

        let next = self.next_page(application, page_id, evaluator)?;
        Ok(WalkStep {
            page_id: next.next_page_id,
            page_type: next.next_page_type,
            stop: false,
        })
    }
}
