//! File upload, listing, download and delete endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use locker_metadata::FileSummary;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// RFC 5987 `attr-char` minus alphanumerics; everything else is escaped.
const ATTR_CHAR_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub id: i64,
    pub filename: String,
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<FileSummary>>> {
    let files = state.registry.list().await?;
    Ok(Json(files))
}

/// POST /api/upload
///
/// Expects a multipart body with a `file` part. Other parts are ignored.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let (filename, content) = read_file_part(&mut multipart).await?;
    let record = state.registry.upload(&filename, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded",
            id: record.id,
            filename: record.filename,
        }),
    ))
}

/// GET /api/download/{id}
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let download = state.registry.download(id).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (header::CONTENT_LENGTH, download.content.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition_value(&download.filename),
            ),
        ],
        Body::from(download.content),
    )
        .into_response())
}

/// DELETE /api/delete/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    let record = state.registry.delete(id).await?;

    Ok(Json(DeleteResponse {
        message: format!("Deleted {}", record.filename),
    }))
}

/// Pull the `file` part out of a multipart body.
async fn read_file_part(multipart: &mut Multipart) -> ApiResult<(String, Bytes)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("No selected file".to_string()))?;
        let content = field.bytes().await?;
        return Ok((filename, content));
    }

    Err(ApiError::BadRequest("No file part".to_string()))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid file id: {raw:?}")))
}

/// Build an `attachment` Content-Disposition with an ASCII fallback and an
/// RFC 5987 `filename*` parameter.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download"
    } else {
        ascii_safe.as_str()
    };

    let encoded = utf8_percent_encode(filename, ATTR_CHAR_ESCAPES);
    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
