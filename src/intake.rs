use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::{Attachments, Submission, UploadedFile};
use crate::naming::{attachment_key, sanitize_reference, summary_key, SubmissionId};
use crate::notify::SubmissionNotice;
use crate::state::AppState;
use crate::summary::{render_summary, SummaryContext, SUMMARY_CONTENT_TYPE};

#[derive(Debug)]
pub struct IntakeReceipt {
    pub submission_id: SubmissionId,
    pub reference: String,
    pub summary_key: String,
    pub file_urls: Vec<String>,
}

/// Stores the submission's artifacts and schedules the reviewer notification.
///
/// Attachments are written in the order received, each followed by a public
/// URL lookup, and the summary is written last. A failed write leaves earlier
/// objects in place.
pub async fn process_submission(
    state: &AppState,
    submission: Submission,
) -> AppResult<IntakeReceipt> {
    let Submission {
        fields,
        attachments,
    } = submission;

    let prepared = match attachments {
        Attachments::Files(files) => Prepared::Files(valid_files(files)?),
        Attachments::Urls(urls) => Prepared::Urls(valid_urls(urls)?),
    };

    let reference = sanitize_reference(fields.bl_container.as_deref());
    let submission_id = SubmissionId::generate();

    let file_urls = match prepared {
        Prepared::Files(files) => {
            store_attachments(state, &reference, &submission_id, files).await?
        }
        Prepared::Urls(urls) => urls,
    };

    let summary_text = render_summary(&SummaryContext {
        submission_id: &submission_id,
        fields: &fields,
        file_urls: &file_urls,
        received_at: Utc::now(),
    });
    let summary_key = summary_key(&reference, &submission_id);
    state
        .storage
        .put_object(
            &summary_key,
            Bytes::from(summary_text.clone().into_bytes()),
            SUMMARY_CONTENT_TYPE,
        )
        .await
        .map_err(|err| {
            error!(submission_id = %submission_id, key = %summary_key, error = ?err, "summary upload failed");
            AppError::from(err)
        })?;

    info!(
        submission_id = %submission_id,
        reference = %reference,
        attachments = file_urls.len(),
        summary_key = %summary_key,
        "submission stored"
    );

    state.notifier.dispatch(SubmissionNotice {
        submission_id: submission_id.to_string(),
        reference: reference.clone(),
        consignee: fields.consignee_data.clone(),
        file_urls: file_urls.clone(),
        summary_filename: summary_key.clone(),
        summary_text,
    });

    Ok(IntakeReceipt {
        submission_id,
        reference,
        summary_key,
        file_urls,
    })
}

enum Prepared {
    Files(Vec<UploadedFile>),
    Urls(Vec<String>),
}

/// Drops parts without a filename; at least one file must remain.
fn valid_files(files: Vec<UploadedFile>) -> AppResult<Vec<UploadedFile>> {
    let files: Vec<UploadedFile> = files
        .into_iter()
        .filter(|file| !file.filename.trim().is_empty())
        .collect();
    if files.is_empty() {
        warn!("submission rejected: no file attached");
        return Err(AppError::bad_request("at least one file is required"));
    }
    Ok(files)
}

fn valid_urls(urls: Vec<String>) -> AppResult<Vec<String>> {
    urls.into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .map(|raw| match Url::parse(&raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(raw),
            _ => Err(AppError::bad_request(format!(
                "fileUrls must contain absolute http(s) URLs, got {raw:?}"
            ))),
        })
        .collect()
}

async fn store_attachments(
    state: &AppState,
    reference: &str,
    submission_id: &SubmissionId,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());

    for (idx, file) in files.into_iter().enumerate() {
        let key = attachment_key(reference, idx + 1, submission_id, &file.filename);
        let size = file.bytes.len();

        state
            .storage
            .put_object(&key, file.bytes, &file.content_type)
            .await
            .map_err(|err| {
                error!(
                    submission_id = %submission_id,
                    key = %key,
                    stored_before_failure = urls.len(),
                    error = ?err,
                    "attachment upload failed"
                );
                AppError::from(err)
            })?;

        let url = state.storage.public_url(&key).await.map_err(|err| {
            error!(submission_id = %submission_id, key = %key, error = ?err, "public URL lookup failed");
            AppError::from(err)
        })?;

        debug!(
            submission_id = %submission_id,
            key = %key,
            original_name = %file.filename,
            size_bytes = size,
            "attachment stored"
        );
        urls.push(url);
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF"),
        }
    }

    #[test]
    fn drops_unnamed_parts_and_keeps_order() {
        let files = valid_files(vec![file(""), file("a.pdf"), file("  "), file("b.pdf")]).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.pdf"]);
    }

    #[test]
    fn rejects_when_no_named_file_remains() {
        let err = valid_files(vec![file("")]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(valid_files(Vec::new()).is_err());
    }

    #[test]
    fn url_list_drops_blanks_and_requires_http() {
        let urls = valid_urls(vec![
            " https://cdn.example.com/a.pdf ".to_string(),
            String::new(),
        ])
        .unwrap();
        assert_eq!(urls, ["https://cdn.example.com/a.pdf"]);

        let err = valid_urls(vec!["ftp://files.example.com/a.pdf".to_string()]).unwrap_err();
        assert!(err.message().contains("fileUrls"));
        assert!(valid_urls(vec!["not a url".to_string()]).is_err());
    }
}
