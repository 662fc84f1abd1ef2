//! `POST /v1/extract`: run the pipeline over one uploaded document.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DEFAULT_DOCUMENT_TYPE};
use crate::models::ExtractionResult;

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    #[serde(default = "default_document_type")]
    pub document_type: String,
}

fn default_document_type() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

/// Upload parts collected from the multipart body.
#[derive(Debug, Default)]
struct UploadParts {
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
    declared_type: Option<String>,
}

/// Pick the document-type hint the pipeline sees.
///
/// The uploaded file name wins since its suffix drives decoding; then the
/// type declared in the form body; then the query parameter.
pub fn select_document_type(
    file_name: Option<&str>,
    declared: Option<&str>,
    query: &str,
) -> String {
    [file_name, declared]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(query)
        .to_string()
}

pub async fn extract(
    State(ctx): State<ApiContext>,
    Query(query): Query<ExtractQuery>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let mut parts = UploadParts::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(ApiError::from_multipart(e, ctx.max_upload_bytes)),
        };

        match field.name().unwrap_or("") {
            "file" => {
                parts.file_name = field.file_name().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::from_multipart(e, ctx.max_upload_bytes))?;
                parts.bytes = Some(data.to_vec());
            }
            "document_type" | "document_type_body" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_multipart(e, ctx.max_upload_bytes))?;
                parts.declared_type = Some(text);
            }
            _ => {}
        }
    }

    let bytes = parts
        .bytes
        .ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;
    let hint = select_document_type(
        parts.file_name.as_deref(),
        parts.declared_type.as_deref(),
        &query.document_type,
    );

    tracing::info!(hint = %hint, bytes = bytes.len(), "Extraction request received");

    let pipeline = ctx.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.run(&bytes, &hint))
        .await
        .map_err(|e| ApiError::Internal(format!("Extraction task failed: {e}")))?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_takes_precedence() {
        assert_eq!(
            select_document_type(Some("lease.pdf"), Some("kira"), "kira_sozlesmesi"),
            "lease.pdf"
        );
    }

    #[test]
    fn declared_type_used_without_file_name() {
        assert_eq!(
            select_document_type(None, Some("scan.png"), "kira_sozlesmesi"),
            "scan.png"
        );
    }

    #[test]
    fn blank_values_fall_through_to_query() {
        assert_eq!(
            select_document_type(Some("  "), Some(""), "kira_sozlesmesi"),
            "kira_sozlesmesi"
        );
    }
}
