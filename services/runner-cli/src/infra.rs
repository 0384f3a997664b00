use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use forms_runner::runner::{Application, ApplicationStore, Form, FormStore, StoreError};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend(format!("{name} mutex poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationStore {
    records: Arc<Mutex<HashMap<String, Application>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
    fn get_application(&self, applicant_id: &str) -> Result<Option<Application>, StoreError> {
        let guard = lock(&self.records, "application store")?;
        Ok(guard.get(applicant_id).cloned())
    }

    fn update_application(&self, application: Application) -> Result<(), StoreError> {
        let mut guard = lock(&self.records, "application store")?;
        guard.insert(application.applicant_id.clone(), application);
        Ok(())
    }

    fn delete_application(&self, applicant_id: &str) -> Result<(), StoreError> {
        let mut guard = lock(&self.records, "application store")?;
        guard.remove(applicant_id);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFormStore {
    forms: Arc<Mutex<HashMap<String, Form>>>,
}

impl InMemoryFormStore {
    pub(crate) fn publish(&self, form: Form) -> Result<(), StoreError> {
        let mut guard = lock(&self.forms, "form store")?;
        guard.insert(form.form_id.clone(), form);
        Ok(())
    }
}

impl FormStore for InMemoryFormStore {
    fn get_form(&self, form_id: &str) -> Result<Option<Form>, StoreError> {
        let guard = lock(&self.forms, "form store")?;
        Ok(guard.get(form_id).cloned())
    }
}
