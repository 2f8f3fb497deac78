// Main entry point for the qr-scanner-server application.
// Parses configuration, prepares the upload directory, builds the Axum router
// and serves it until a shutdown signal arrives.

mod config;
mod scanner;
mod shutdown_signal;
mod web;

#[cfg(test)]
mod test_support;

use clap::Parser;
use config::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_DIR, ScannerConfig};
use scanner::DecodePipeline;
use shutdown_signal::shutdown_signal;
use std::path::PathBuf;
use tracing::Level;
use web::{AppState, create_listener, create_router, prepare_upload_dir};

/// Command line arguments for qr-scanner-server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// If this option is specified without value, it will default to "*", meaning the server will listen on all interfaces.
    #[arg(long, env = "QR_SCANNER_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "QR_SCANNER_PORT", default_value_t = 5000)]
    port: u16,

    /// Directory where uploads are kept while they are being scanned.
    #[arg(long, env = "QR_SCANNER_UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "QR_SCANNER_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Log at DEBUG level instead of INFO.
    #[arg(short, long, env = "QR_SCANNER_VERBOSE", action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = AppConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting qr-scanner-server...");

    if let Err(e) = prepare_upload_dir(&args.upload_dir) {
        tracing::error!(
            "FATAL: Failed to prepare upload directory {}: {}",
            args.upload_dir.display(),
            e
        );
        eprintln!("FATAL: Upload directory is unusable. Error: {}. Exiting.", e);
        std::process::exit(1);
    }

    let config = ScannerConfig::new(args.upload_dir, args.max_upload_bytes);
    tracing::info!(
        "Upload directory: {}, max request size: {} bytes, allowed extensions: {}",
        config.upload_dir.display(),
        config.max_upload_bytes,
        config.allowed_extensions.join(", ")
    );

    let app = create_router(AppState::new(config, DecodePipeline::default()));
    tracing::info!("Axum router configured.");

    let listener = match create_listener(&args.host, args.port).await {
        Ok((addr, listener)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            listener
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("qr-scanner-server has shut down.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = AppConfig::try_parse_from(["qr-scanner-server"]).unwrap();
        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 5000);
        assert_eq!(args.upload_dir, PathBuf::from("static/uploads"));
        assert_eq!(args.max_upload_bytes, 16 * 1024 * 1024);
        assert!(!args.verbose);
    }

    #[test]
    fn test_bare_host_means_all_interfaces() {
        let args = AppConfig::try_parse_from(["qr-scanner-server", "--host", "-p", "8080"]).unwrap();
        assert_eq!(args.host, "*");
        assert_eq!(args.port, 8080);
    }

    #[test]
    fn test_cli_overrides() {
        let args = AppConfig::try_parse_from([
            "qr-scanner-server",
            "--upload-dir",
            "/tmp/qr",
            "--max-upload-bytes",
            "1024",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.upload_dir, PathBuf::from("/tmp/qr"));
        assert_eq!(args.max_upload_bytes, 1024);
        assert!(args.verbose);
    }
}
