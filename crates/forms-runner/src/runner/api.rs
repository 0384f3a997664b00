//! Request and response shapes of the runner use cases.

use serde::{Deserialize, Serialize};

use super::domain::{Application, FormData};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartApplicationRequest {
    pub applicant_id: String,
    pub form_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartApplicationResponse {
    pub start_page_id: String,
    pub extra_data: String,
    pub form_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetApplicationRequest {
    pub applicant_id: String,
    pub page_id: String,
    #[serde(default)]
    pub extra_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetApplicationResponse {
    pub application: Application,
    pub previous_page_id: String,
    pub previous_extra_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessApplicationRequest {
    pub applicant_id: String,
    pub page_id: String,
    #[serde(default)]
    pub form_data: FormData,
    #[serde(default)]
    pub extra_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessApplicationResponse {
    pub next_page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_type: Option<String>,
    pub extra_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoJAddAnotherRequest {
    pub applicant_id: String,
    pub page_id: String,
    pub number_of_items: usize,
    #[serde(default)]
    pub form_data: FormData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoJRemoveRequest {
    pub applicant_id: String,
    pub page_id: String,
    pub item_index: usize,
    #[serde(default)]
    pub form_data: FormData,
}
