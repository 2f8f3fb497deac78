use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
};
use tracing::{debug, warn};

use super::error::ApiError;

pub const FILE_FIELD: &str = "file";

/// The `file` part of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-supplied filename, untrusted.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Pulls the `file` field out of a multipart request.
///
/// A request that is not multipart at all has no file part and is reported as such.
pub async fn extract_upload_file(request: Request) -> Result<UploadedFile, ApiError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
        debug!("Upload request is not multipart: {}", e);
        ApiError::BadRequest("No file provided".to_string())
    })?;

    let mut uploaded: Option<UploadedFile> = None;
    let mut ignored_fields = 0;

    // Loop through all fields to find "file" and ignore others
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            let field_name = field.name().unwrap_or("unnamed").to_string();
            debug!("Ignoring multipart field: {}", field_name);
            ignored_fields += 1;
            continue;
        }

        if uploaded.is_some() {
            warn!("Multiple 'file' fields found in multipart request, using the first one");
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        debug!(
            "Received file {:?} with content type: {:?}",
            file_name, content_type
        );

        let data = field.bytes().await?;
        uploaded = Some(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    if ignored_fields > 0 {
        debug!(
            "Ignored {} non-file fields in multipart request",
            ignored_fields
        );
    }

    uploaded.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))
}
