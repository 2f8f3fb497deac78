// Upload-side file handling: extension allowlist, filename sanitization,
// collision-free naming and the transient on-disk copy.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

// Length of `Uuid::simple()` output.
const UNIQUE_TOKEN_LEN: usize = 32;

/// Checks the text after the last `.` against `allowed`, ignoring case.
pub fn allowed_file(file_name: &str, allowed: &[&str]) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, extension)| {
            allowed
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(extension))
        })
}

/// Reduces an untrusted client filename to a single safe path component.
///
/// Returns `None` when nothing usable is left.
pub fn secure_filename(file_name: &str) -> Option<String> {
    // Compatibility decomposition splits accents off their base letters first.
    let flattened: String = file_name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_ascii_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        return None;
    }

    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|device| device.eq_ignore_ascii_case(stem))
    {
        return Some(format!("_{}", trimmed));
    }

    Some(trimmed.to_string())
}

/// Prefixes a sanitized filename with a random 128-bit token.
pub fn unique_filename(sanitized: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitized)
}

fn is_transient_name(file_name: &str) -> bool {
    file_name
        .split_once('_')
        .is_some_and(|(token, _)| {
            token.len() == UNIQUE_TOKEN_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
        })
}

/// Creates the upload directory and removes transient files a previous run left behind.
pub fn prepare_upload_dir(dir: &Path) -> io::Result<usize> {
    fs::create_dir_all(dir)?;

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let stale = entry.file_type()?.is_file()
            && entry.file_name().to_str().is_some_and(is_transient_name);
        if !stale {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(
                "Failed to remove stale upload {}: {}",
                entry.path().display(),
                e
            ),
        }
    }

    if removed > 0 {
        info!(
            "Removed {} stale upload(s) from {}",
            removed,
            dir.display()
        );
    }

    Ok(removed)
}

/// An uploaded image persisted for the lifetime of one request.
///
/// The file is removed when this value is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct TransientImageFile {
    path: PathBuf,
}

impl TransientImageFile {
    /// Writes `data` to `dir/file_name`. Never overwrites an existing file.
    pub fn persist(dir: &Path, file_name: &str, data: &[u8]) -> io::Result<Self> {
        let path = dir.join(file_name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;

        // Owns the path from here on, so a failed write is cleaned up too.
        let transient = Self { path };
        file.write_all(data)?;
        debug!(
            "Persisted {} bytes to {}",
            data.len(),
            transient.path.display()
        );

        Ok(transient)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientImageFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed transient upload {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to remove transient upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ALLOWED_EXTENSIONS;
    use std::collections::HashSet;

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_allowed_file() {
        for name in ["photo.PNG", "a.jpg", "a.JpEg", "anim.gif", "scan.bmp", "x.y.png"] {
            assert!(allowed_file(name, ALLOWED_EXTENSIONS), "{name}");
        }
        for name in ["archive.zip", "png", "photo.png.exe", "photo.", "", ".tiff"] {
            assert!(!allowed_file(name, ALLOWED_EXTENSIONS), "{name}");
        }
    }

    #[test]
    fn test_secure_filename_strips_directories() {
        assert_eq!(
            secure_filename("../../etc/passwd.png").as_deref(),
            Some("etc_passwd.png")
        );
        assert_eq!(
            secure_filename("C:\\Users\\me\\qr.jpg").as_deref(),
            Some("C_Users_me_qr.jpg")
        );
        assert_eq!(secure_filename("/abs/qr.png").as_deref(), Some("abs_qr.png"));
    }

    #[test]
    fn test_secure_filename_normalizes_characters() {
        assert_eq!(
            secure_filename("my cool  photo.png").as_deref(),
            Some("my_cool_photo.png")
        );
        assert_eq!(secure_filename("caf\u{e9}$%.png").as_deref(), Some("cafe.png"));
        assert_eq!(secure_filename("\u{fb01}le.png").as_deref(), Some("file.png"));
        assert_eq!(secure_filename("\u{ff31}\u{ff32}.png").as_deref(), Some("QR.png"));
        assert_eq!(secure_filename(".hidden.png").as_deref(), Some("hidden.png"));
    }

    #[test]
    fn test_secure_filename_guards_device_names() {
        assert_eq!(secure_filename("con.png").as_deref(), Some("_con.png"));
        assert_eq!(secure_filename("LPT1").as_deref(), Some("_LPT1"));
        assert_eq!(secure_filename("console.png").as_deref(), Some("console.png"));
    }

    #[test]
    fn test_secure_filename_rejects_degenerate_names() {
        for name in ["", "..", "../..", "\u{4e2d}\u{6587}", "___", " / "] {
            assert_eq!(secure_filename(name), None, "{name:?}");
        }
        // Only the extension survives, which no longer reads as an extension.
        assert_eq!(secure_filename("\u{4e2d}.png").as_deref(), Some("png"));
    }

    #[test]
    fn test_unique_filename_format() {
        let name = unique_filename("qr.png");
        let (token, rest) = name.split_once('_').unwrap();
        assert_eq!(rest, "qr.png");
        assert_eq!(token.len(), UNIQUE_TOKEN_LEN);
        assert!(is_transient_name(&name));
        assert_ne!(unique_filename("qr.png"), unique_filename("qr.png"));
    }

    #[test]
    fn test_transient_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let transient = TransientImageFile::persist(dir.path(), "abc.png", b"bytes").unwrap();

        assert_eq!(fs::read(transient.path()).unwrap(), b"bytes");
        assert_eq!(file_count(dir.path()), 1);

        drop(transient);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn test_transient_file_removed_during_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _transient = TransientImageFile::persist(&path, "boom.png", b"bytes").unwrap();
            panic!("decoder blew up");
        });

        assert!(result.is_err());
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn test_persist_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = TransientImageFile::persist(dir.path(), "same.png", b"one").unwrap();

        let err = TransientImageFile::persist(dir.path(), "same.png", b"two").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(first.path()).unwrap(), b"one");
    }

    #[test]
    fn test_persist_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(TransientImageFile::persist(&missing, "a.png", b"x").is_err());
    }

    #[test]
    fn test_concurrent_uploads_with_same_name_never_collide() {
        let dir = tempfile::tempdir().unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let dir = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    let name = unique_filename("photo.png");
                    TransientImageFile::persist(&dir, &name, b"data").unwrap()
                })
            })
            .collect();
        let files: Vec<TransientImageFile> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let paths: HashSet<&Path> = files.iter().map(TransientImageFile::path).collect();
        assert_eq!(paths.len(), 32);
        assert_eq!(file_count(dir.path()), 32);

        drop(files);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn test_prepare_upload_dir_sweeps_only_transient_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("static").join("uploads");
        fs::create_dir_all(&uploads).unwrap();

        fs::write(uploads.join(unique_filename("left.png")), b"stale").unwrap();
        fs::write(uploads.join("keep.txt"), b"not ours").unwrap();

        assert_eq!(prepare_upload_dir(&uploads).unwrap(), 1);
        assert!(uploads.join("keep.txt").exists());
        assert_eq!(file_count(&uploads), 1);
    }

    #[test]
    fn test_prepare_upload_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("nested").join("uploads");

        assert_eq!(prepare_upload_dir(&uploads).unwrap(), 0);
        assert!(uploads.is_dir());
    }
}
