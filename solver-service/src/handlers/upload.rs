use crate::error::SolveError;
use crate::models::{SolutionSet, UploadedDocument};
use crate::services::{build_prompt, GenerationParams};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use metrics::counter;
use serde::Serialize;
use service_core::middleware::RequestId;

/// Name of the multipart part carrying the document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct SolutionsResponse {
    pub solutions: SolutionSet,
}

/// `POST /upload`: extract the PDF's text, have the answer generator solve
/// the questions in it, and relay the solutions.
pub async fn upload_pdf(
    State(state): State<AppState>,
    request_id: RequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SolutionsResponse>, SolveError> {
    let result = solve_upload(&state, &request_id, multipart).await;

    let outcome = match &result {
        Ok(_) => "solved",
        Err(e) => e.outcome(),
    };
    counter!("solver_uploads_total", "outcome" => outcome).increment(1);

    match &result {
        Ok(response) => tracing::info!(
            request_id = %request_id.as_str(),
            solution_count = response.solutions.count(),
            "Upload solved"
        ),
        Err(e) if e.status().is_client_error() => tracing::info!(
            request_id = %request_id.as_str(),
            error = %e,
            "Upload rejected"
        ),
        Err(e) => tracing::error!(
            request_id = %request_id.as_str(),
            error = %e,
            "Upload failed"
        ),
    }

    result.map(Json)
}

async fn solve_upload(
    state: &AppState,
    request_id: &RequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<SolutionsResponse, SolveError> {
    let upload = read_upload(multipart).await?;

    tracing::info!(
        request_id = %request_id.as_str(),
        file_name = %upload.file_name,
        size = upload.size(),
        "Upload received"
    );

    // Removed from disk when `scratch` goes out of scope, on every path below.
    let scratch = state
        .scratch
        .persist(request_id.as_str(), &upload.file_name, &upload.data)
        .await?;

    let text = state.extractor.extract_text(scratch.path()).await?;
    if text.trim().is_empty() {
        return Err(SolveError::NoText);
    }

    tracing::debug!(text_len = text.len(), "Text extracted");

    let prompt = build_prompt(&text);
    let response = state
        .text_provider
        .generate(&prompt, &GenerationParams::json())
        .await?;

    let generated = response.text.ok_or(SolveError::NoContent)?;
    let solutions = SolutionSet::parse(&generated)?;

    let malformed = solutions.malformed_ids();
    if !malformed.is_empty() {
        tracing::warn!(
            ids = ?malformed,
            "Some solutions are not {{question, solution}} records"
        );
    }

    Ok(SolutionsResponse { solutions })
}

/// Pull the `file` part out of the form and validate its name.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedDocument, SolveError> {
    // A body that is not multipart at all carries no file.
    let mut multipart = multipart.map_err(|_| SolveError::NoFileUploaded)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SolveError::UnreadableUpload(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A `file` part without a filename parameter is a plain form value.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        if file_name.is_empty() {
            return Err(SolveError::NoFileSelected);
        }
        if !UploadedDocument::has_pdf_name(&file_name) {
            return Err(SolveError::InvalidFormat);
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| SolveError::UnreadableUpload(e.body_text()))?;

        return Ok(UploadedDocument { file_name, data });
    }

    Err(SolveError::NoFileUploaded)
}
