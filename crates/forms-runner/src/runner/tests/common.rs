use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::runner::domain::{
    Application, ChoiceOption, Component, Condition, DateValidationRule, Form, FormData, Page,
    ValidationRule,
};
use crate::runner::expression::SandboxedEvaluator;
use crate::runner::store::{ApplicationStore, FormStore, StoreError};
use crate::runner::FormsRunnerService;

pub(super) fn evaluator() -> SandboxedEvaluator {
    SandboxedEvaluator::default()
}

pub(super) fn component(kind: &str, name: &str) -> Component {
    Component {
        question_id: format!("q-{name}"),
        kind: Some(kind.to_string()),
        name: Some(name.to_string()),
        label: Some(format!("Label for {name}")),
        ..Component::default()
    }
}

pub(super) fn optional(mut component: Component) -> Component {
    component.optional = true;
    component
}

pub(super) fn with_rule(mut component: Component, expression: &str, message: &str) -> Component {
    component.validation_rules.push(ValidationRule {
        id: format!("rule-{}", component.validation_rules.len() + 1),
        expression: expression.to_string(),
        error_message: message.to_string(),
    });
    component
}

pub(super) fn choice(value: &str) -> ChoiceOption {
    ChoiceOption {
        id: format!("id-{value}"),
        label: format!("Label {value}"),
        value: value.to_string(),
    }
}

pub(super) fn date_component(name: &str, rules: Vec<DateValidationRule>) -> Component {
    let mut component = component("dateParts", name);
    component.date_validation_rules = rules;
    component
}

pub(super) fn date_rule(comparison: &str, message: &str) -> DateValidationRule {
    DateValidationRule {
        comparison_type: Some(comparison.to_string()),
        error_message: message.to_string(),
        ..DateValidationRule::default()
    }
}

pub(super) fn date_value(day: &str, month: &str, year: &str) -> Value {
    json!({ "day": day, "month": month, "year": year })
}

pub(super) fn page(page_id: &str, components: Vec<Component>, next: Option<&str>) -> Page {
    Page {
        page_id: page_id.to_string(),
        page_type: Some("default".to_string()),
        title: Some(format!("Title {page_id}")),
        components,
        conditions: Vec::new(),
        next_page_id: next.map(str::to_string),
        add_another: Default::default(),
    }
}

pub(super) fn terminal(page_id: &str, page_type: &str) -> Page {
    let mut page = page(page_id, Vec::new(), None);
    page.page_type = Some(page_type.to_string());
    page
}

pub(super) fn add_another_page(
    page_id: &str,
    components: Vec<Component>,
    items: usize,
    next: Option<&str>,
) -> Page {
    let mut page = page(page_id, components, next);
    page.page_type = Some("mojAddAnother".to_string());
    page.add_another.number_of_items = items;
    page
}

pub(super) fn with_condition(mut page: Page, expression: &str, next: &str) -> Page {
    page.conditions.push(Condition {
        id: format!("cond-{}", page.conditions.len() + 1),
        label: String::new(),
        expression: expression.to_string(),
        next_page_id: Some(next.to_string()),
    });
    page
}

pub(super) fn form(pages: Vec<Page>) -> Form {
    let start_page = pages
        .first()
        .map(|page| page.page_id.clone())
        .unwrap_or_default();
    Form {
        form_id: "form-1".to_string(),
        title: "Test form".to_string(),
        description: "Form used by tests".to_string(),
        start_page,
        pages,
    }
}

pub(super) fn application(pages: Vec<Page>) -> Application {
    let started = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    Application::start(form(pages), "applicant-1", started)
}

pub(super) fn data(value: Value) -> FormData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other:?}"),
    }
}

/// Branching form: name, then age; adults go to the address page, minors to a stop page.
pub(super) fn branching_form() -> Form {
    let name_page = page("name", vec![component("text", "full_name")], Some("age"));
    let age_page = with_condition(
        page("age", vec![component("number", "age")], Some("address")),
        "data.age < 18",
        "too-young",
    );
    let address_page = page("address", vec![component("ukaddress", "home")], Some("summary"));
    form(vec![
        name_page,
        age_page,
        address_page,
        terminal("too-young", "stop"),
        terminal("summary", "summary"),
    ])
}

pub(super) fn build_service(
    form: Form,
) -> (
    FormsRunnerService<MemoryApplicationStore, MemoryFormStore>,
    Arc<MemoryApplicationStore>,
) {
    let applications = Arc::new(MemoryApplicationStore::default());
    let forms = Arc::new(MemoryFormStore::with_form(form));
    let service = FormsRunnerService::new(applications.clone(), forms, EngineConfig::default());
    (service, applications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplicationStore {
    pub(super) records: Arc<Mutex<HashMap<String, Application>>>,
}

impl MemoryApplicationStore {
    pub(super) fn stored(&self, applicant_id: &str) -> Application {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(applicant_id)
            .cloned()
            .expect("application stored")
    }
}

impl ApplicationStore for MemoryApplicationStore {
    fn get_application(&self, applicant_id: &str) -> Result<Option<Application>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(applicant_id).cloned())
    }

    fn update_application(&self, application: Application) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(application.applicant_id.clone(), application);
        Ok(())
    }

    fn delete_application(&self, applicant_id: &str) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.remove(applicant_id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryFormStore {
    forms: Arc<Mutex<HashMap<String, Form>>>,
}

impl MemoryFormStore {
    pub(super) fn with_form(form: Form) -> Self {
        let store = Self::default();
        store
            .forms
            .lock()
            .expect("form mutex poisoned")
            .insert(form.form_id.clone(), form);
        store
    }
}

impl FormStore for MemoryFormStore {
    fn get_form(&self, form_id: &str) -> Result<Option<Form>, StoreError> {
        let guard = self.forms.lock().expect("form mutex poisoned");
        Ok(guard.get(form_id).cloned())
    }
}

pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn get_application(&self, _applicant_id: &str) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Backend("Database error".to_string()))
    }

    fn update_application(&self, _application: Application) -> Result<(), StoreError> {
        Err(StoreError::Backend("Database error".to_string()))
    }

    fn delete_application(&self, _applicant_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unknown)
    }
}
