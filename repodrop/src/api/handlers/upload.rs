use crate::AppState;
use crate::api::models::upload::{ErrorBody, UploadResponse};
use crate::content_store::CommitRequest;
use crate::errors::{Error, Result};
use crate::naming::generate_short_name;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::Method,
};
use uuid::Uuid;

/// The file taken from the multipart body
struct CapturedFile {
    name: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: impl std::fmt::Display) -> Error {
    Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    }
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    summary = "Upload file",
    description = "Upload one file under the `files[]` multipart field. The file is committed to the configured GitHub \
                   repository under a short random name that keeps the original extension.",
    request_body(
        content_type = "multipart/form-data",
        description = "A file part named `files[]`; other parts are ignored"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file under the upload field, or malformed multipart body", body = ErrorBody),
        (status = 405, description = "Method other than POST", body = String, content_type = "text/plain"),
        (status = 413, description = "File larger than the configured limit", body = ErrorBody),
        (status = 500, description = "Missing server configuration or GitHub rejected the commit", body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    method: Method,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    if method != Method::POST {
        return Err(Error::MethodNotAllowed { method });
    }

    // Refuse before touching the body if we could never store the file anyway
    let target = state.config.upload_target()?;

    let mut multipart = multipart.map_err(|e| multipart_error(e.body_text()))?;

    let upload_id = Uuid::new_v4();
    let field_name = state.config.upload.field_name.as_str();
    let max_file_size = state.config.upload.max_file_size;
    let mut captured: Option<CapturedFile> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        // First file under the upload field wins; everything else is drained unbuffered
        let is_upload = captured.is_none() && field.name() == Some(field_name) && field.file_name().is_some();

        if !is_upload {
            tracing::debug!(
                upload_id = %upload_id,
                field = ?field.name(),
                file_name = ?field.file_name(),
                "Discarding multipart part"
            );
            while field.chunk().await.map_err(multipart_error)?.is_some() {}
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let mut bytes = Vec::new();

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if let Some(limit) = max_file_size
                && (bytes.len() + chunk.len()) as u64 > limit
            {
                tracing::warn!(
                    upload_id = %upload_id,
                    received = bytes.len() + chunk.len(),
                    limit = limit,
                    "File size limit exceeded, aborting upload"
                );
                return Err(Error::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        let name = generate_short_name(&original_name);
        tracing::info!(
            upload_id = %upload_id,
            original_name = %original_name,
            file_name = %name,
            bytes = bytes.len(),
            "Received file"
        );
        captured = Some(CapturedFile { name, bytes });
    }

    let Some(file) = captured else {
        return Err(Error::NoFileUploaded {
            field: field_name.to_string(),
        });
    };

    let commit = CommitRequest::for_upload(&file.name, &file.bytes, &target.repo.branch);
    let receipt = state.store.put_file(&target.repo, &file.name, &commit).await?;

    let url = target.public_url(&file.name);
    tracing::info!(
        upload_id = %upload_id,
        file_name = %file.name,
        sha = ?receipt.sha,
        url = %url,
        "File committed"
    );

    Ok(Json(UploadResponse::single(url)))
}
