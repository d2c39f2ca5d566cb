use axum::extract::{FromRequest, Json, Multipart, Request, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use bytes::Bytes;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::intake::process_submission;
use crate::models::{
    Attachments, Submission, SubmissionFields, SubmissionResponse, UploadedFile,
    UrlSubmissionPayload,
};
use crate::state::AppState;

pub const FILE_FIELD_NAMES: &[&str] = &["arquivo", "arquivos", "files"];

pub async fn submit_form(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let submission = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| {
                warn!(error = %rejection.body_text(), "invalid multipart request");
                AppError::new(rejection.status(), rejection.body_text())
            })?;
        read_multipart(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(payload) = Json::<UrlSubmissionPayload>::from_request(request, &state)
            .await
            .map_err(|rejection| {
                warn!(error = %rejection.body_text(), "invalid JSON submission");
                AppError::new(rejection.status(), rejection.body_text())
            })?;
        Submission {
            fields: payload.fields,
            attachments: Attachments::Urls(payload.file_urls),
        }
    } else {
        warn!(content_type = %content_type, "submission rejected: unsupported content type");
        return Err(AppError::bad_request(
            "expected multipart/form-data or application/json body",
        ));
    };

    match process_submission(&state, submission).await {
        Ok(receipt) => {
            info!(
                submission_id = %receipt.submission_id,
                reference = %receipt.reference,
                attachments = receipt.file_urls.len(),
                "form submission accepted"
            );
            Ok((
                StatusCode::CREATED,
                Json(SubmissionResponse {
                    message: "Formulário recebido com sucesso!".to_string(),
                    submission_id: receipt.submission_id.to_string(),
                    summary_key: receipt.summary_key,
                }),
            ))
        }
        Err(err) if err.status().is_client_error() => {
            warn!(status = %err.status(), error = %err.message(), "form submission rejected");
            Err(err)
        }
        Err(err) => {
            error!(status = %err.status(), error = %err.message(), "form submission failed");
            Err(err)
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<Submission> {
    let mut fields = SubmissionFields::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        let msg = format!("invalid multipart data: {err}");
        warn!(error = %err, status = %err.status(), "invalid multipart data");
        AppError::new(err.status(), msg)
    })? {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        if FILE_FIELD_NAMES.contains(&name.as_str()) {
            let filename = field.file_name().map(|n| n.to_string()).unwrap_or_default();
            let declared = field.content_type().map(|mime| mime.to_string());
            let data: Bytes = field.bytes().await.map_err(|err| {
                let msg = format!("failed to read file bytes: {err}");
                warn!(error = %err, status = %err.status(), "failed to read file bytes");
                AppError::new(err.status(), msg)
            })?;
            let content_type = declared.unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string()
            });
            files.push(UploadedFile {
                filename,
                content_type,
                bytes: data,
            });
            continue;
        }

        let value = field.text().await.map_err(|err| {
            let msg = format!("invalid form field {name}: {err}");
            warn!(error = %err, field = %name, "invalid form field");
            AppError::new(err.status(), msg)
        })?;
        if !fields.set(&name, value) {
            warn!(field = %name, "ignoring unknown form field");
        }
    }

    Ok(Submission {
        fields,
        attachments: Attachments::Files(files),
    })
}
