use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::answers::AnswerSet;
use super::components::ComponentType;
use super::error::RunnerError;

/// Raw key/value pairs submitted for a page, or a per-item slice of them.
pub type FormData = Map<String, Value>;

/// Author-supplied boolean expression plus the message shown when it is falsy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default)]
    pub id: String,
    pub expression: String,
    pub error_message: String,
}

/// One selectable answer for select, radio and checkbox components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    #[serde(default)]
    pub id: String,
    pub label: String,
    pub value: String,
}

/// Comparison applied by a [`DateValidationRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    TodayOrInPast,
    InPast,
    TodayOrInFuture,
    InFuture,
    SameOrAfter,
    After,
    SameOrBefore,
    Before,
    Between,
}

impl DateComparison {
    pub const fn label(self) -> &'static str {
        match self {
            DateComparison::TodayOrInPast => "todayOrInPast",
            DateComparison::InPast => "inPast",
            DateComparison::TodayOrInFuture => "todayOrInFuture",
            DateComparison::InFuture => "inFuture",
            DateComparison::SameOrAfter => "sameOrAfter",
            DateComparison::After => "after",
            DateComparison::SameOrBefore => "sameOrBefore",
            DateComparison::Before => "before",
            DateComparison::Between => "between",
        }
    }
}

impl FromStr for DateComparison {
    type Err = RunnerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let comparison = match value {
            "todayOrInPast" => DateComparison::TodayOrInPast,
            "inPast" => DateComparison::InPast,
            "todayOrInFuture" => DateComparison::TodayOrInFuture,
            "inFuture" => DateComparison::InFuture,
            "sameOrAfter" => DateComparison::SameOrAfter,
            "after" => DateComparison::After,
            "sameOrBefore" => DateComparison::SameOrBefore,
            "before" => DateComparison::Before,
            "between" => DateComparison::Between,
            other => {
                return Err(RunnerError::Configuration(format!(
                    "Unknown date comparison type: {other}"
                )))
            }
        };
        Ok(comparison)
    }
}

/// Date rule. Each bound is either a literal date or the name of another date field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateValidationRule {
    #[serde(default)]
    pub id: String,
    pub error_message: String,
    #[serde(default)]
    pub comparison_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_date_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date_id: Option<String>,
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; the time of day is dropped.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|err| format!("failed to parse '{raw}' as a date ({err})"))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Input or display field within a page. Definitions never carry answers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub question_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub label_is_page_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_validation_rules: Vec<DateValidationRule>,
}

impl Component {
    /// Declared type, failing when the definition leaves it out.
    pub fn component_type(&self) -> Result<ComponentType, RunnerError> {
        let raw = self.kind.as_deref().ok_or_else(|| {
            RunnerError::Configuration(format!(
                "Component type is undefined for component ID {}.",
                self.question_id
            ))
        })?;
        raw.parse()
    }
}

/// Authored branch: when `expression` is truthy the walk continues at `next_page_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Default,
    MojAddAnother,
    Summary,
    Stop,
}

impl PageType {
    pub const fn label(self) -> &'static str {
        match self {
            PageType::Default => "default",
            PageType::MojAddAnother => "mojAddAnother",
            PageType::Summary => "summary",
            PageType::Stop => "stop",
        }
    }

    /// Forward walks end on these pages without inspecting their components.
    pub const fn is_terminal(self) -> bool {
        matches!(self, PageType::Summary | PageType::Stop)
    }
}

impl FromStr for PageType {
    type Err = RunnerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(PageType::Default),
            "mojAddAnother" => Ok(PageType::MojAddAnother),
            "summary" => Ok(PageType::Summary),
            "stop" => Ok(PageType::Stop),
            other => Err(RunnerError::Configuration(format!(
                "Unsupported page type: {other}"
            ))),
        }
    }
}

/// Repeating-section state carried by `mojAddAnother` pages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAnotherSection {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub number_of_items: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub number_of_items_to_start_with: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_another_button_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_label: Option<String>,
    /// One answer map per item, index-aligned with `number_of_items`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_answer: Vec<FormData>,
    /// Keyed by `"<componentName>-<1-based item number>"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub page_errors: BTreeMap<String, Vec<String>>,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_id: Option<String>,
    #[serde(flatten)]
    pub add_another: AddAnotherSection,
}

impl Page {
    pub fn kind(&self) -> Result<PageType, RunnerError> {
        let raw = self.page_type.as_deref().ok_or_else(|| {
            RunnerError::Configuration(format!(
                "Page type is undefined for page ID {}.",
                self.page_id
            ))
        })?;
        raw.parse()
    }
}

/// Authored, reusable form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub form_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_page: String,
    pub pages: Vec<Page>,
}

/// Lifecycle of an application. Submission belongs to a downstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Started,
}

/// An applicant's copy of a form together with everything they have answered so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub applicant_id: String,
    pub form_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ApplicationStatus,
    pub start_page: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub answers: AnswerSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn start(form: Form, applicant_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: applicant_id.to_string(),
            applicant_id: applicant_id.to_string(),
            form_id: form.form_id,
            title: form.title,
            description: form.description,
            status: ApplicationStatus::Started,
            start_page: form.start_page,
            pages: form.pages,
            answers: AnswerSet::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.page_id == page_id)
    }

    pub fn page(&self, page_id: &str) -> Result<&Page, RunnerError> {
        self.find_page(page_id)
            .ok_or_else(|| RunnerError::not_found("Page", page_id))
    }

    pub fn page_mut(&mut self, page_id: &str) -> Result<&mut Page, RunnerError> {
        self.pages
            .iter_mut()
            .find(|page| page.page_id == page_id)
            .ok_or_else(|| RunnerError::not_found("Page", page_id))
    }
}

/// Converted answer of a `ukaddress` component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UkAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
}

/// Converted answer of a `dateParts` component, kept as the strings the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// Structured date error; serialized into the error list so sub-fields can be highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateError {
    pub error_message: String,
    pub day_error: bool,
    pub month_error: bool,
    pub year_error: bool,
}

impl DateError {
    pub fn whole_date(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            day_error: true,
            month_error: true,
            year_error: true,
        }
    }

    pub fn encode(&self) -> String {
        serde_json::json!({
            "errorMessage": self.error_message,
            "dayError": self.day_error,
            "monthError": self.month_error,
            "yearError": self.year_error,
        })
        .to_string()
    }
}
