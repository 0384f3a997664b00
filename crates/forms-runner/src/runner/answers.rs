use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Converted answer and last validation result for one component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentAnswer {
    #[serde(default)]
    pub answer: Value,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Per-application answers keyed by page id, then component name.
///
/// Definitions stay immutable; everything a user enters lands here. Add-another
/// items are the exception and live on the page's `AddAnotherSection`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    pages: BTreeMap<String, BTreeMap<String, ComponentAnswer>>,
}

impl AnswerSet {
    pub fn get(&self, page_id: &str, name: &str) -> Option<&ComponentAnswer> {
        self.pages.get(page_id).and_then(|page| page.get(name))
    }

    pub fn answer(&self, page_id: &str, name: &str) -> Option<&Value> {
        self.get(page_id, name).map(|entry| &entry.answer)
    }

    pub fn errors(&self, page_id: &str, name: &str) -> &[String] {
        self.get(page_id, name)
            .map(|entry| entry.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Replaces the stored answer. Existing errors are kept until revalidated.
    pub fn record_answer(&mut self, page_id: &str, name: &str, answer: Value) {
        self.entry(page_id, name).answer = answer;
    }

    pub fn record_errors(&mut self, page_id: &str, name: &str, errors: Vec<String>) {
        self.entry(page_id, name).errors = errors;
    }

    pub fn has_errors(&self, page_id: &str) -> bool {
        self.pages
            .get(page_id)
            .map(|page| page.values().any(|entry| !entry.errors.is_empty()))
            .unwrap_or(false)
    }

    pub fn clear_page(&mut self, page_id: &str) {
        self.pages.remove(page_id);
    }

    fn entry(&mut self, page_id: &str, name: &str) -> &mut ComponentAnswer {
        self.pages
            .entry(page_id.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
    }
}
