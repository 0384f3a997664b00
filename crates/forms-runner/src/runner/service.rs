use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use super::api::{
    GetApplicationRequest, GetApplicationResponse, MoJAddAnotherRequest, MoJRemoveRequest,
    ProcessApplicationRequest, ProcessApplicationResponse, StartApplicationRequest,
    StartApplicationResponse,
};
use super::domain::{Application, PageType};
use super::error::{RunnerError, UseCaseError};
use super::expression::{ExpressionEvaluator, SandboxedEvaluator};
use super::navigation::{calculate_previous_page, walk_to_next_invalid_or_unfilled_page};
use super::pages::handler_for_page;
use super::store::{ApplicationStore, FormStore};
use crate::config::EngineConfig;

/// Service running applicants through their forms.
pub struct FormsRunnerService<A, F> {
    applications: Arc<A>,
    forms: Arc<F>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    config: EngineConfig,
}

impl<A, F> FormsRunnerService<A, F>
where
    A: ApplicationStore + 'static,
    F: FormStore + 'static,
{
    pub fn new(applications: Arc<A>, forms: Arc<F>, config: EngineConfig) -> Self {
        let evaluator = Arc::new(SandboxedEvaluator::from_config(&config));
        Self::with_evaluator(applications, forms, evaluator, config)
    }

    pub fn with_evaluator(
        applications: Arc<A>,
        forms: Arc<F>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            applications,
            forms,
            evaluator,
            config,
        }
    }

    /// Create the applicant's application from a published form.
    pub fn start(
        &self,
        request: StartApplicationRequest,
    ) -> Result<StartApplicationResponse, UseCaseError> {
        self.start_application(&request).map_err(|source| {
            UseCaseError::new("starting application", &request.applicant_id, source)
        })
    }

    /// Fetch the application together with the page before `page_id`.
    pub fn get(
        &self,
        request: GetApplicationRequest,
    ) -> Result<GetApplicationResponse, UseCaseError> {
        self.get_application(&request).map_err(|source| {
            UseCaseError::new("getting application", &request.applicant_id, source)
        })
    }

    /// Record a page submission and route to the next page.
    pub fn process(
        &self,
        request: ProcessApplicationRequest,
    ) -> Result<ProcessApplicationResponse, UseCaseError> {
        self.process_page(&request, false)
            .map_err(|source| UseCaseError::new("processing form", &request.applicant_id, source))
    }

    /// Record an edit to an earlier page, then walk from the start page to the
    /// first page that still needs attention.
    pub fn process_change(
        &self,
        request: ProcessApplicationRequest,
    ) -> Result<ProcessApplicationResponse, UseCaseError> {
        self.process_page(&request, true)
            .map_err(|source| UseCaseError::new("processing form", &request.applicant_id, source))
    }

    /// Save the items so far without validating and add an empty item.
    pub fn add_another(
        &self,
        request: MoJAddAnotherRequest,
    ) -> Result<ProcessApplicationResponse, UseCaseError> {
        self.add_item(&request)
            .map_err(|source| UseCaseError::new("adding another", &request.applicant_id, source))
    }

    /// Drop one item from a repeating section.
    pub fn remove_from_add_another(
        &self,
        request: MoJRemoveRequest,
    ) -> Result<ProcessApplicationResponse, UseCaseError> {
        self.remove_item(&request).map_err(|source| {
            UseCaseError::new("removing from add another", &request.applicant_id, source)
        })
    }

    fn load(&self, applicant_id: &str) -> Result<Application, RunnerError> {
        self.applications
            .get_application(applicant_id)?
            .ok_or_else(|| RunnerError::not_found("Application", applicant_id))
    }

    fn save(&self, mut application: Application) -> Result<(), RunnerError> {
        application.updated_at = Utc::now();
        self.applications.update_application(application)?;
        Ok(())
    }

    fn start_application(
        &self,
        request: &StartApplicationRequest,
    ) -> Result<StartApplicationResponse, RunnerError> {
        let form = self
            .forms
            .get_form(&request.form_id)?
            .ok_or_else(|| RunnerError::not_found("Form", &request.form_id))?;
        let application = Application::start(form, &request.applicant_id, Utc::now());
        let response = StartApplicationResponse {
            start_page_id: application.start_page.clone(),
            extra_data: String::new(),
            form_title: application.title.clone(),
        };
        self.applications.update_application(application)?;
        tracing::info!(
            applicant_id = %request.applicant_id,
            form_id = %request.form_id,
            "application started"
        );
        Ok(response)
    }

    fn get_application(
        &self,
        request: &GetApplicationRequest,
    ) -> Result<GetApplicationResponse, RunnerError> {
        let application = self.load(&request.applicant_id)?;
        let previous = calculate_previous_page(
            &application,
            &request.page_id,
            request.extra_data.as_deref(),
            self.evaluator.as_ref(),
            self.config.max_walk_steps,
        )?;
        let (previous_page_id, previous_extra_data) = previous
            .map(|page| (page.page_id, page.extra_data.unwrap_or_default()))
            .unwrap_or_default();
        Ok(GetApplicationResponse {
            application,
            previous_page_id,
            previous_extra_data,
        })
    }

    fn process_page(
        &self,
        request: &ProcessApplicationRequest,
        walk_from_start: bool,
    ) -> Result<ProcessApplicationResponse, RunnerError> {
        let mut application = self.load(&request.applicant_id)?;
        let page = application.page(&request.page_id)?;
        let kind = page.kind()?;
        let page_type = page.page_type.clone();
        let handler = handler_for_page(kind);
        let evaluator = self.evaluator.as_ref();

        let has_errors = handler.process(
            &mut application,
            &request.page_id,
            &request.form_data,
            false,
            evaluator,
        )?;

        let response = if has_errors {
            ProcessApplicationResponse {
                next_page_id: request.page_id.clone(),
                next_page_type: page_type,
                extra_data: request.extra_data.clone().unwrap_or_default(),
            }
        } else if walk_from_start {
            let start_page = application.start_page.clone();
            let outcome = walk_to_next_invalid_or_unfilled_page(
                &mut application,
                &start_page,
                None,
                evaluator,
                self.config.max_walk_steps,
            )?;
            ProcessApplicationResponse {
                next_page_id: outcome.page_id,
                next_page_type: outcome.page_type,
                extra_data: String::new(),
            }
        } else {
            let next = handler.next_page(&application, &request.page_id, evaluator)?;
            ProcessApplicationResponse {
                next_page_id: next.next_page_id.unwrap_or_default(),
                next_page_type: next.next_page_type,
                extra_data: next.extra_data.unwrap_or_default(),
            }
        };

        self.save(application)?;
        tracing::info!(
            applicant_id = %request.applicant_id,
            page_id = %request.page_id,
            next_page_id = %response.next_page_id,
            has_errors,
            "page processed"
        );
        Ok(response)
    }

    fn add_another_page(application: &Application, page_id: &str) -> Result<(), RunnerError> {
        let page = application.page(page_id)?;
        if page.kind()? != PageType::MojAddAnother {
            return Err(RunnerError::not_found("Add another page", page_id));
        }
        Ok(())
    }

    fn add_item(
        &self,
        request: &MoJAddAnotherRequest,
    ) -> Result<ProcessApplicationResponse, RunnerError> {
        let mut application = self.load(&request.applicant_id)?;
        Self::add_another_page(&application, &request.page_id)?;

        handler_for_page(PageType::MojAddAnother).process(
            &mut application,
            &request.page_id,
            &request.form_data,
            true,
            self.evaluator.as_ref(),
        )?;
        let section = &mut application.page_mut(&request.page_id)?.add_another;
        section.number_of_items = request.number_of_items;

        self.save(application)?;
        tracing::info!(
            applicant_id = %request.applicant_id,
            page_id = %request.page_id,
            number_of_items = request.number_of_items,
            "add another item"
        );
        Ok(ProcessApplicationResponse {
            next_page_id: request.page_id.clone(),
            next_page_type: Some(PageType::MojAddAnother.label().to_string()),
            extra_data: String::new(),
        })
    }

    fn remove_item(
        &self,
        request: &MoJRemoveRequest,
    ) -> Result<ProcessApplicationResponse, RunnerError> {
        let mut application = self.load(&request.applicant_id)?;
        Self::add_another_page(&application, &request.page_id)?;

        let section = &mut application.page_mut(&request.page_id)?.add_another;
        if request.item_index >= section.page_answer.len() {
            return Err(RunnerError::InvalidRequest(format!(
                "Item index {} is out of bounds for page {}.",
                request.item_index, request.page_id
            )));
        }
        section.page_answer.remove(request.item_index);
        section.number_of_items = section.number_of_items.saturating_sub(1);
        section.page_errors = reindex_errors(&section.page_errors, request.item_index + 1);

        self.save(application)?;
        tracing::info!(
            applicant_id = %request.applicant_id,
            page_id = %request.page_id,
            item_index = request.item_index,
            "removed add another item"
        );
        Ok(ProcessApplicationResponse {
            next_page_id: request.page_id.clone(),
            next_page_type: Some(PageType::MojAddAnother.label().to_string()),
            extra_data: String::new(),
        })
    }
}

/// Drops errors of the removed 1-based item and shifts later items down by one.
pub(crate) fn reindex_errors(
    errors: &BTreeMap<String, Vec<String>>,
    removed: usize,
) -> BTreeMap<String, Vec<String>> {
    let mut reindexed = BTreeMap::new();
    for (key, messages) in errors {
        let numbered = key
            .rsplit_once('-')
            .and_then(|(name, number)| number.parse::<usize>().ok().map(|number| (name, number)));
        match numbered {
            Some((_, number)) if number == removed => {}
            Some((name, number)) if number > removed => {
                reindexed.insert(format!("{name}-{}", number - 1), messages.clone());
            }
            _ => {
                reindexed.insert(key.clone(), messages.clone());
            }
        }
    }
    reindexed
}
