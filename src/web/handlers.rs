// API handlers for the web server

use super::{
    AppState,
    error::ApiError,
    extract_request_data::extract_upload_file,
    models::*,
    upload::{TransientImageFile, allowed_file, secure_filename, unique_filename},
};
use crate::scanner::{DecodedSymbol, ScanError};
use axum::{
    Json,
    body::Bytes,
    extract::{Request, State, rejection::BytesRejection},
    response::Html,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../static/index.html");

// --- GET / ---
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// --- GET /health ---
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::HEALTHY)
}

// --- POST /upload ---
// Validates the multipart `file`, persists it for the duration of the scan and decodes it.
pub async fn upload(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ScanResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let upload = extract_upload_file(request).await?;

    let file_name = upload
        .file_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No file selected".to_string()))?;

    let allowed = state.config.allowed_extensions;
    if !allowed_file(&file_name, allowed) {
        debug!("Rejected upload {:?}: extension not allowed", file_name);
        return Err(ApiError::BadRequest("Invalid file type".to_string()));
    }

    // Sanitizing can eat the extension (e.g. a purely non-ASCII stem), so re-check it.
    let safe_name = secure_filename(&file_name)
        .filter(|name| allowed_file(name, allowed))
        .ok_or_else(|| ApiError::BadRequest("Invalid filename".to_string()))?;
    let stored_name = unique_filename(&safe_name);

    info!(
        "Upload request: request_id={}, file={:?}, content_type={:?}, size={}",
        request_id,
        file_name,
        upload.content_type,
        upload.data.len()
    );

    let upload_dir = state.config.upload_dir.clone();
    let pipeline = state.pipeline.clone();
    let data = upload.data;

    // Save, decode and cleanup share one blocking task: it runs to completion even if the
    // client goes away, and the transient file is dropped on every exit path including panics.
    let outcome = tokio::task::spawn_blocking(move || -> Result<Vec<DecodedSymbol>, ScanError> {
        let transient = TransientImageFile::persist(&upload_dir, &stored_name, &data)?;
        pipeline.decode_file(transient.path())
    })
    .await
    .map_err(|e| processing_failure(request_id, &e))?;

    let symbols = outcome.map_err(|e| processing_failure(request_id, &e))?;

    info!(
        "Upload scanned: request_id={}, symbols={}",
        request_id,
        symbols.len()
    );
    Ok(Json(ScanResponse::from_symbols(symbols, NO_CODES_IN_IMAGE)))
}

fn processing_failure(request_id: Uuid, err: &dyn std::fmt::Display) -> ApiError {
    error!("Upload processing failed: request_id={}, error={}", request_id, err);
    ApiError::InternalServerError(format!("Error processing file: {}", err))
}

// --- POST /scan_frame ---
// Decodes one base64 video frame. Undecodable frames are reported as "nothing found".
pub async fn scan_frame(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ScanResponse>, ApiError> {
    let body = body?;

    let image = FrameRequest::from_json(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?
        .image
        .ok_or_else(|| ApiError::BadRequest("No image data provided".to_string()))?;

    debug!("Frame scan request: {} bytes of image text", image.len());

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.decode_frame(&image))
        .await
        .map_err(|e| {
            error!("Frame scan task failed: {}", e);
            ApiError::InternalServerError(format!("Error scanning frame: {}", e))
        })?;

    let symbols = outcome.unwrap_or_else(|e| {
        warn!("Frame could not be decoded, reporting no codes: {}", e);
        Vec::new()
    });

    Ok(Json(ScanResponse::from_symbols(symbols, NO_CODES_IN_FRAME)))
}
