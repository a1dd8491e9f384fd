//! Axum route handlers for letter generation and download.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::documents::fields::EmployeeFields;
use crate::documents::service::GenerateResponse;
use crate::documents::DocumentType;
use crate::errors::AppError;
use crate::state::AppState;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Serialize)]
pub struct DocumentTypeInfo {
    pub document_type: DocumentType,
    pub label: &'static str,
    pub route: &'static str,
    pub template_file: &'static str,
    pub template_available: bool,
}

async fn generate(
    state: AppState,
    document_type: DocumentType,
    fields: EmployeeFields,
) -> Result<Json<GenerateResponse>, AppError> {
    let response = state.documents.generate(document_type, &fields).await?;
    Ok(Json(response))
}

/// POST /generate-offer-letter
pub async fn handle_offer_letter(
    State(state): State<AppState>,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, DocumentType::Offer, fields).await
}

/// POST /generate-appointment-letter
pub async fn handle_appointment_letter(
    State(state): State<AppState>,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, DocumentType::Appointment, fields).await
}

/// POST /generate-termination-letter
pub async fn handle_termination_letter(
    State(state): State<AppState>,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, DocumentType::Termination, fields).await
}

/// POST /generate-experience-letter
pub async fn handle_experience_letter(
    State(state): State<AppState>,
    Json(fields): Json<EmployeeFields>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate(state, DocumentType::Experience, fields).await
}

/// GET /download/:filename
///
/// Serves a generated letter as an attachment. There is no ownership check:
/// anyone holding a filename can fetch it.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.documents.download(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, DOCX_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /document-types
///
/// Lists the supported letters and whether each template is deployed.
pub async fn handle_document_types(State(state): State<AppState>) -> Json<Vec<DocumentTypeInfo>> {
    let mut types = Vec::with_capacity(DocumentType::ALL.len());
    for document_type in DocumentType::ALL {
        let path = state
            .documents
            .templates_dir()
            .join(document_type.template_file());
        types.push(DocumentTypeInfo {
            document_type,
            label: document_type.label(),
            route: document_type.route(),
            template_file: document_type.template_file(),
            template_available: tokio::fs::try_exists(&path).await.unwrap_or(false),
        });
    }
    Json(types)
}
