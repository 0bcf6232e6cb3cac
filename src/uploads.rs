//! Upload set for patient images.
//!
//! Files land in one destination directory under a sanitized version of the
//! client's file name. A clash gets a `_1`, `_2`, … suffix. Nothing is ever
//! cleaned up.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions accepted by the upload form.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpe", "jpeg", "png", "gif", "svg", "bmp", "webp"];

/// Fallback name when sanitizing leaves nothing usable.
const DEFAULT_STEM: &str = "photo";

/// Upper bound on clash suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No free file name for {0}")]
    NameExhausted(String),

    #[error("Path is outside the upload directory: {0}")]
    OutsideUploadDir(String),
}

/// True when the file name has an allow-listed extension whose MIME type is
/// an image type.
pub fn is_allowed_image(file_name: &str) -> bool {
    let Some(ext) = extension_of(file_name) else {
        return false;
    };
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return false;
    }
    mime_guess::from_ext(&ext)
        .first()
        .map(|m| m.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Strip directories and special characters from a client file name.
///
/// The stem and the extension are cleaned separately so a stem with no usable
/// characters never swallows the extension. The extension is lowercased.
pub fn sanitize_filename(name: &str) -> String {
    // Browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (base, None),
    };

    let stem: String = sanitize_stem(stem).chars().take(100).collect();
    let stem = if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    };

    let ext: Option<String> = ext
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|e| !e.is_empty());

    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize_stem(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .filter(|&c| c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Remove consecutive dots (path traversal prevention)
    let sanitized = sanitized.replace("..", "");
    sanitized
        .trim_start_matches(['.', '_'])
        .trim_end_matches('.')
        .to_string()
}

/// The destination directory for uploaded images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dest: PathBuf,
}

impl UploadStore {
    /// Create the directory if needed. The stored path is absolute so the
    /// paths handed to `/predict` do not depend on the working directory.
    pub fn open(dest: &Path) -> Result<Self, UploadError> {
        std::fs::create_dir_all(dest)?;
        let dest = dest.canonicalize()?;
        Ok(Self { dest })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Absolute path a stored file name maps to.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dest.join(file_name)
    }

    /// Write `bytes` under a free name derived from `file_name`. Returns the
    /// absolute path of the new file.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
        let safe = sanitize_filename(file_name);
        let (stem, ext) = match safe.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
            None => (safe.clone(), String::new()),
        };

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                safe.clone()
            } else {
                format!("{stem}_{attempt}{ext}")
            };
            let path = self.path(&candidate);

            // create_new makes the existence check and the create one step
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)?;
                    file.sync_all()?;
                    tracing::info!(file = %candidate, size = bytes.len(), "Image stored");
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(UploadError::NameExhausted(safe))
    }

    /// Map a path received from a client back onto a file inside the upload
    /// directory.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, UploadError> {
        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.dest.join(candidate)
        };
        let resolved = joined.canonicalize()?;
        if resolved.starts_with(&self.dest) {
            Ok(resolved)
        } else {
            Err(UploadError::OutsideUploadDir(raw.to_string()))
        }
    }
}
