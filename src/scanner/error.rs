// Error kinds produced by the decode pipeline.
// Callers decide how each kind is surfaced: the frame path degrades to an
// empty result, the upload path reports a processing failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("malformed data URL: missing ',' after the media type")]
    MalformedDataUrl,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
