// Web server module
// Handles the HTTP endpoints for page serving, uploads and frame scanning

mod app;
mod error;
mod extract_request_data;
mod handlers;
mod listeners;
mod models;
mod upload;

pub use app::{AppState, create_router};
pub use listeners::create_listener;
pub use upload::prepare_upload_dir;
