//! Flattened evaluation context and whole-form walks.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{Application, FormData, PageType};
use super::error::RunnerError;
use super::expression::ExpressionEvaluator;
use super::pages::{handler_for_page, item_number};

/// A page reached during a walk, with the sub-address it was reached at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitedPage {
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
}

impl VisitedPage {
    /// `"<pageId>"`, or `"<pageId>/<extraData>"` when a sub-address is set.
    pub fn address(&self) -> String {
        address(&self.page_id, self.extra_data.as_deref())
    }
}

fn address(page_id: &str, extra_data: Option<&str>) -> String {
    match extra_data {
        Some(extra) if !extra.is_empty() => format!("{page_id}/{extra}"),
        _ => page_id.to_string(),
    }
}

/// Where a forward walk halted and the pages it inspected on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub page_id: String,
    pub page_type: Option<String>,
    pub path: Vec<VisitedPage>,
}

/// Answers of every page keyed by component name.
///
/// Add-another pages contribute their item list under their page id. Component
/// names are applied afterwards and win on a collision.
pub fn flatten_application_data(application: &Application) -> Value {
    let mut data = Map::new();
    for page in &application.pages {
        if page.page_type.as_deref() == Some(PageType::MojAddAnother.label()) {
            let items = page
                .add_another
                .page_answer
                .iter()
                .cloned()
                .map(Value::Object)
                .collect();
            data.insert(page.page_id.clone(), Value::Array(items));
        }
    }
    for page in &application.pages {
        for component in &page.components {
            let Some(name) = component.name.as_deref() else {
                continue;
            };
            let answer = application
                .answers
                .answer(&page.page_id, name)
                .cloned()
                .unwrap_or(Value::Null);
            data.insert(name.to_string(), answer);
        }
    }
    Value::Object(data)
}

/// Flattened data with one add-another item's answers laid over the top.
pub fn flatten_with_item(application: &Application, item: &FormData) -> Value {
    let mut data = flatten_application_data(application);
    if let Value::Object(map) = &mut data {
        for (name, answer) in item {
            map.insert(name.clone(), answer.clone());
        }
    }
    data
}

/// Walks forward from `start_page_id` until a page is unfilled, invalid or terminal.
///
/// Each page is visited at most once and at most `max_steps` pages are inspected.
pub fn walk_to_next_invalid_or_unfilled_page(
    application: &mut Application,
    start_page_id: &str,
    extra_data: Option<&str>,
    evaluator: &dyn ExpressionEvaluator,
    max_steps: usize,
) -> Result<WalkOutcome, RunnerError> {
    let mut current = start_page_id.to_string();
    let mut visited = HashSet::new();
    let mut path = Vec::new();

    loop {
        let page = application.page(&current)?;
        let kind = page.kind()?;
        let page_type = page.page_type.clone();
        if kind.is_terminal() {
            tracing::debug!(page_id = %current, steps = path.len(), "walk reached terminal page");
            return Ok(WalkOutcome {
                page_id: current,
                page_type,
                path,
            });
        }
        if path.len() >= max_steps {
            return Err(RunnerError::StepBudgetExceeded { budget: max_steps });
        }
        if !visited.insert(current.clone()) {
            return Err(RunnerError::GraphCycleDetected { page_id: current });
        }
        path.push(VisitedPage {
            page_id: current.clone(),
            page_type: page_type.clone(),
            extra_data: extra_data.map(str::to_string),
        });

        let step = handler_for_page(kind).walk(application, &current, extra_data, evaluator)?;
        if step.stop {
            tracing::debug!(page_id = %current, steps = path.len(), "walk halted");
            return Ok(WalkOutcome {
                page_id: current,
                page_type,
                path,
            });
        }
        current = step.page_id.ok_or_else(|| {
            RunnerError::Configuration(format!("Page {current} has no next page to continue to."))
        })?;
    }
}

/// Item `n - 1` of the same repeating section when `extra_data` addresses item `n > 1`.
fn previous_item(
    application: &Application,
    page_id: &str,
    extra_data: Option<&str>,
) -> Result<Option<VisitedPage>, RunnerError> {
    let Some(number) = extra_data.and_then(item_number) else {
        return Ok(None);
    };
    let page = application.page(page_id)?;
    if number < 2 || page.kind()? != PageType::MojAddAnother {
        return Ok(None);
    }
    Ok(Some(VisitedPage {
        page_id: page_id.to_string(),
        page_type: page.page_type.clone(),
        extra_data: Some((number - 1).to_string()),
    }))
}

/// Page shown before `current_page_id` on the live path from the start page.
///
/// Replays navigation from `application.start_page`; `None` when the current page is
/// the start page or is not reachable with the current answers. An `extra_data` naming
/// item `n` of a repeating section steps back to item `n - 1`, and item 1 steps back to
/// the page before the section.
pub fn calculate_previous_page(
    application: &Application,
    current_page_id: &str,
    extra_data: Option<&str>,
    evaluator: &dyn ExpressionEvaluator,
    max_steps: usize,
) -> Result<Option<VisitedPage>, RunnerError> {
    let target = address(current_page_id, extra_data);
    let mut stack: Vec<VisitedPage> = Vec::new();
    let mut visited = HashSet::new();
    let mut next = VisitedPage {
        page_id: application.start_page.clone(),
        page_type: None,
        extra_data: None,
    };

    loop {
        let here = next.address();
        if here == target {
            return Ok(stack.pop());
        }
        if next.page_id == current_page_id && next.extra_data.is_none() {
            // Forward navigation never carries item addresses.
            let previous = previous_item(application, current_page_id, extra_data)?;
            return Ok(previous.or_else(|| stack.pop()));
        }
        if stack.len() >= max_steps {
            return Err(RunnerError::StepBudgetExceeded { budget: max_steps });
        }
        if !visited.insert(here) {
            return Err(RunnerError::GraphCycleDetected {
                page_id: next.page_id,
            });
        }

        let page = application.page(&next.page_id)?;
        let kind = page.kind()?;
        next.page_type = page.page_type.clone();
        let successor = handler_for_page(kind).next_page(application, &next.page_id, evaluator)?;
        stack.push(next);

        let Some(page_id) = successor.next_page_id else {
            return Ok(None);
        };
        next = VisitedPage {
            page_id,
            page_type: successor.next_page_type,
            extra_data: successor.extra_data,
        };
    }
}
