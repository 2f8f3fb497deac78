// Immutable runtime configuration handed to the router at construction.

use std::path::PathBuf;

/// Extensions accepted by the upload endpoint, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Maximum request body size (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Directory receiving transient upload files.
    pub upload_dir: PathBuf,
    /// Requests with larger bodies are rejected before any processing.
    pub max_upload_bytes: usize,
    pub allowed_extensions: &'static [&'static str],
}

impl ScannerConfig {
    pub fn new(upload_dir: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_upload_bytes,
            allowed_extensions: ALLOWED_EXTENSIONS,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_DIR, DEFAULT_MAX_UPLOAD_BYTES)
    }
}
