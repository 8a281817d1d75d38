// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP handlers for the upload / sign / fetch surface.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use countersign_core::error::Error as CoreError;
use countersign_core::DocumentId;

use crate::AppState;

/// Content type served for stored docx blobs.
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Response to a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Signing URL with the identifier embedded.
    #[serde(rename = "shareLink")]
    pub share_link: String,
}

/// Body of a sign request.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    /// Name to substitute into the template. Missing is treated as empty
    /// and rejected by the engine before any I/O.
    #[serde(rename = "signerName", default)]
    pub signer_name: String,
}

/// Generic confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Maps core errors onto HTTP statuses.
///
/// Caller-fault errors carry their message; server-side failures are
/// logged with full detail and reported to the caller as a generic
/// message only.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::InvalidRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            CoreError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "document not found".to_string())
            }
            CoreError::Conflict(_) => (
                StatusCode::CONFLICT,
                "a signing operation is already in progress for this document".to_string(),
            ),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred; please try again later".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `POST /upload` - store a docx template, respond with its share link.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        CoreError::InvalidRequest(format!("malformed multipart body: {e}"))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            CoreError::InvalidRequest(format!("failed to read uploaded file: {e}"))
        })?;
        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = file else {
        return Err(CoreError::InvalidRequest(
            "no file received; upload a docx document".to_string(),
        )
        .into());
    };
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let id = state.engine.upload(extension, &bytes).await?;
    Ok(Json(UploadResponse {
        message: "file received".to_string(),
        share_link: format!("{}/sign/{id}", state.share_base_url),
    }))
}

/// `POST /sign/{file_id}` - run the signing workflow for a document.
pub async fn sign(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(request): Json<SignRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = DocumentId::parse(&file_id)?;
    let outcome = state.engine.sign(&id, &request.signer_name).await?;
    Ok(Json(MessageResponse {
        message: format!("document signed and sent by {}", outcome.signer_name),
    }))
}

/// `GET /file/{file_id}` - serve the document's current bytes.
pub async fn fetch(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = DocumentId::parse(&file_id)?;
    let (bytes, extension) = state.engine.fetch(&id).await?;
    let content_type = match extension.as_str() {
        "docx" => DOCX_CONTENT_TYPE,
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
