//! Page processing and forward navigation, dispatched on page type.

mod add_another;
mod default;

use serde_json::Value;

use super::components::{handler_for, ComponentHandler, ComponentType};
use super::conditions::first_matching_condition;
use super::domain::{Application, Component, FormData, PageType};
use super::error::RunnerError;
use super::expression::ExpressionEvaluator;
use super::navigation::flatten_application_data;

pub(crate) use add_another::item_number;
pub use add_another::MoJAddAnotherPageHandler;
pub use default::DefaultPageHandler;

/// Where a page leads once it has been answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NextPage {
    pub next_page_id: Option<String>,
    pub next_page_type: Option<String>,
    pub extra_data: Option<String>,
}

/// Outcome of inspecting one page during a forward walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkStep {
    /// The halting page when `stop` is set, otherwise its successor (if any).
    pub page_id: Option<String>,
    pub page_type: Option<String>,
    pub stop: bool,
}

pub trait PageHandler: Send + Sync {
    fn page_type(&self) -> PageType;

    /// Converts and validates the submission into the application.
    /// Returns `true` when any validation error was recorded.
    fn process(
        &self,
        application: &mut Application,
        page_id: &str,
        data: &FormData,
        skip_validation: bool,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<bool, RunnerError>;

    /// Decides whether a forward walk halts on this page.
    fn walk(
        &self,
        application: &mut Application,
        page_id: &str,
        extra_data: Option<&str>,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<WalkStep, RunnerError>;

    /// First truthy condition wins; the page's own `next_page_id` is the fallback.
    fn next_page(
        &self,
        application: &Application,
        page_id: &str,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<NextPage, RunnerError> {
        let page = application.page(page_id)?;
        let context = flatten_application_data(application);
        let next_page_id = match first_matching_condition(page, &context, evaluator)? {
            Some(condition) => condition.next_page_id.clone(),
            None => page.next_page_id.clone(),
        };
        let next_page_type = next_page_id
            .as_deref()
            .and_then(|id| application.find_page(id))
            .and_then(|next| next.page_type.clone());
        Ok(NextPage {
            next_page_id,
            next_page_type,
            extra_data: None,
        })
    }
}

/// Page handler for a page type. Terminal pages share the default handler.
pub fn handler_for_page(kind: PageType) -> &'static dyn PageHandler {
    match kind {
        PageType::Default | PageType::Summary | PageType::Stop => &DefaultPageHandler,
        PageType::MojAddAnother => &MoJAddAnotherPageHandler,
    }
}

/// Answerable component paired with its handler and data key.
pub(crate) struct ResolvedComponent {
    pub component: Component,
    pub handler: &'static dyn ComponentHandler,
    pub name: String,
}

/// Answerable components of a page in authored order; `html` blocks are skipped.
pub(crate) fn resolve_components(
    components: &[Component],
) -> Result<Vec<ResolvedComponent>, RunnerError> {
    let mut resolved = Vec::with_capacity(components.len());
    for component in components {
        let kind: ComponentType = component.component_type()?;
        let Some(handler) = handler_for(kind) else {
            continue;
        };
        let name = component.name.clone().ok_or_else(|| {
            RunnerError::Configuration(format!(
                "Component name is undefined for component ID {}.",
                component.question_id
            ))
        })?;
        resolved.push(ResolvedComponent {
            component: component.clone(),
            handler,
            name,
        });
    }
    Ok(resolved)
}

/// A walk halts on answers the user has not supplied yet.
pub(crate) fn is_unfilled(answer: Option<&Value>) -> bool {
    match answer {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}
