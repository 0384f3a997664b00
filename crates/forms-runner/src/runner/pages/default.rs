use super::{is_unfilled, resolve_components, PageHandler, WalkStep};
use crate::runner::domain::{Application, FormData, PageType};
use crate::runner::error::RunnerError;
use crate::runner::expression::ExpressionEvaluator;
use crate::runner::navigation::flatten_application_data;

/// Single-answer pages. Answers and errors live in the application's answer set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPageHandler;

impl PageHandler for DefaultPageHandler {
    fn page_type(&self) -> PageType {
        PageType::Default
    }

    fn process(
        &self,
        application: &mut Application,
        page_id: &str,
        data: &FormData,
        skip_validation: bool,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<bool, RunnerError> {
        let resolved = resolve_components(&application.page(page_id)?.components)?;

        for entry in &resolved {
            let answer = entry.handler.convert(&entry.component, data)?;
            application.answers.record_answer(page_id, &entry.name, answer);
        }

        let context = flatten_application_data(application);
        for entry in &resolved {
            let errors = if skip_validation {
                Vec::new()
            } else {
                entry.handler.validate(&entry.component, &context, evaluator)?
            };
            application.answers.record_errors(page_id, &entry.name, errors);
        }
        let has_errors = application.answers.has_errors(page_id);

        tracing::debug!(page_id, has_errors, "processed page");
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
        let resolved = resolve_components(&page.components)?;
        let halt = || WalkStep {
            page_id: Some(page_id.to_string()),
            page_type: page_type.clone(),
            stop: true,
        };

        if resolved
            .iter()
            .any(|entry| is_unfilled(application.answers.answer(page_id, &entry.name)))
        {
            tracing::debug!(page_id, "walk halted on unfilled page");
            return Ok(halt());
        }

        let context = flatten_application_data(application);
        for entry in &resolved {
            let errors = entry.handler.validate(&entry.component, &context, evaluator)?;
            application.answers.record_errors(page_id, &entry.name, errors);
        }
        if application.answers.has_errors(page_id) {
            tracing::debug!(page_id, "walk halted on invalid page");
            return Ok(halt());
        }

        let next = self.next_page(application, page_id, evaluator)?;
        Ok(WalkStep {
            page_id: next.next_page_id,
            page_type: next.next_page_type,
            stop: false,
        })
    }
}
