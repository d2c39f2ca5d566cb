use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// Form fields shared by the multipart and JSON variants of the intake form.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFields {
    #[serde(default, alias = "bl", deserialize_with = "blank_as_none")]
    pub bl_container: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub container_info: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub consignee_data: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub request_reason: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub free_time_granted: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub discharge_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub first_return_attempt_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub container_return_date: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub return_terminal_city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub occurrence_summary: Option<String>,
}

impl SubmissionFields {
    /// Stores a multipart text field by its form name. Unknown names are
    /// ignored and reported back as `false`.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "blContainer" | "bl" => &mut self.bl_container,
            "containerInfo" => &mut self.container_info,
            "consigneeData" => &mut self.consignee_data,
            "requestReason" => &mut self.request_reason,
            "freeTimeGranted" => &mut self.free_time_granted,
            "dischargeDate" => &mut self.discharge_date,
            "firstReturnAttemptDate" => &mut self.first_return_attempt_date,
            "containerReturnDate" => &mut self.container_return_date,
            "returnTerminalCity" => &mut self.return_terminal_city,
            "occurrenceSummary" => &mut self.occurrence_summary,
            _ => return false,
        };
        if let Some(value) = non_blank(value) {
            *slot = Some(value);
        }
        true
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(non_blank))
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone, Debug)]
pub enum Attachments {
    /// Files received in the request body, uploaded by this service.
    Files(Vec<UploadedFile>),
    /// Public URLs of files the client already uploaded to storage.
    Urls(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub fields: SubmissionFields,
    pub attachments: Attachments,
}

/// JSON body of the client-upload variant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSubmissionPayload {
    #[serde(flatten)]
    pub fields: SubmissionFields,
    #[serde(default)]
    pub file_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub message: String,
    pub submission_id: String,
    pub summary_key: String,
}
