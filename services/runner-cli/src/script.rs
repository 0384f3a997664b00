use std::fs;
use std::sync::Arc;

use forms_runner::config::AppConfig;
use forms_runner::error::AppError;
use forms_runner::runner::{
    Form, FormData, FormsRunnerService, GetApplicationRequest, MoJAddAnotherRequest,
    MoJRemoveRequest, ProcessApplicationRequest, StartApplicationRequest,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::RunArgs;
use crate::infra::{InMemoryApplicationStore, InMemoryFormStore};

/// One scripted interaction, named after the use case it drives.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ScriptStep {
    #[serde(rename_all = "camelCase")]
    Process {
        page_id: String,
        #[serde(default)]
        form_data: FormData,
        #[serde(default)]
        extra_data: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Change {
        page_id: String,
        #[serde(default)]
        form_data: FormData,
    },
    #[serde(rename_all = "camelCase")]
    AddAnother {
        page_id: String,
        number_of_items: usize,
        #[serde(default)]
        form_data: FormData,
    },
    #[serde(rename_all = "camelCase")]
    Remove { page_id: String, item_index: usize },
    #[serde(rename_all = "camelCase")]
    Get {
        page_id: String,
        #[serde(default)]
        extra_data: Option<String>,
    },
}

fn print_step<T: Serialize>(
    number: usize,
    action: &str,
    page_id: &str,
    response: &T,
) -> Result<(), AppError> {
    println!("{number:>3}. {action} {page_id}");
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

pub(crate) fn run_script(args: RunArgs, config: &AppConfig) -> Result<(), AppError> {
    let form: Form = serde_json::from_str(&fs::read_to_string(&args.form)?)?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&fs::read_to_string(&args.script)?)?;

    let forms = InMemoryFormStore::default();
    let form_id = form.form_id.clone();
    forms.publish(form)?;
    let service = FormsRunnerService::new(
        Arc::new(InMemoryApplicationStore::default()),
        Arc::new(forms),
        config.engine.clone(),
    );

    let applicant_id = args.applicant;
    let started = service.start(StartApplicationRequest {
        applicant_id: applicant_id.clone(),
        form_id: form_id.clone(),
    })?;
    print_step(0, "start", &form_id, &started)?;
    info!(%applicant_id, %form_id, steps = steps.len(), "replaying script");

    for (index, step) in steps.into_iter().enumerate() {
        let number = index + 1;
        match step {
            ScriptStep::Process {
                page_id,
                form_data,
                extra_data,
            } => {
                let response = service.process(ProcessApplicationRequest {
                    applicant_id: applicant_id.clone(),
                    page_id: page_id.clone(),
                    form_data,
                    extra_data,
                })?;
                print_step(number, "process", &page_id, &response)?;
            }
            ScriptStep::Change { page_id, form_data } => {
                let response = service.process_change(ProcessApplicationRequest {
                    applicant_id: applicant_id.clone(),
                    page_id: page_id.clone(),
                    form_data,
                    extra_data: None,
                })?;
                print_step(number, "change", &page_id, &response)?;
            }
            ScriptStep::AddAnother {
                page_id,
                number_of_items,
                form_data,
            } => {
                let response = service.add_another(MoJAddAnotherRequest {
                    applicant_id: applicant_id.clone(),
                    page_id: page_id.clone(),
                    number_of_items,
                    form_data,
                })?;
                print_step(number, "addAnother", &page_id, &response)?;
            }
            ScriptStep::Remove { page_id, item_index } => {
                let response = service.remove_from_add_another(MoJRemoveRequest {
                    applicant_id: applicant_id.clone(),
                    page_id: page_id.clone(),
                    item_index,
                    form_data: FormData::new(),
                })?;
                print_step(number, "remove", &page_id, &response)?;
            }
            ScriptStep::Get {
                page_id,
                extra_data,
            } => {
                let response = service.get(GetApplicationRequest {
                    applicant_id: applicant_id.clone(),
                    page_id: page_id.clone(),
                    extra_data,
                })?;
                print_step(number, "get", &page_id, &response)?;
            }
        }
    }

    let finished = service.get(GetApplicationRequest {
        applicant_id,
        page_id: String::new(),
        extra_data: None,
    })?;
    println!("Final application");
    println!("{}", serde_json::to_string_pretty(&finished.application)?);
    Ok(())
}
