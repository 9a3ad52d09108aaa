use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use actix_web::web;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::app::AppError;

/// Longest name kept, the `filename` column holds 150 characters.
pub const MAX_FILENAME_LEN: usize = 150;

/// Turns a client supplied filename into one that is safe to join onto the upload folder.
/// Directory parts are dropped, accents are folded to ASCII, whitespace becomes `_` and
/// anything outside `[A-Za-z0-9._-]` is removed. Long names are cut to
/// `MAX_FILENAME_LEN` keeping the extension. A name that ends up empty is replaced by a random one.
///
/// # Example
/// ```
/// assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_filename("My résumé.pdf"), "My_resume.pdf");
/// ```
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");

    let mut cleaned = String::with_capacity(base.len());
    let mut pending_space = false;
    for c in base.nfkd() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-') {
            continue;
        }
        if pending_space && !cleaned.is_empty() {
            cleaned.push('_');
        }
        pending_space = false;
        cleaned.push(c);
    }

    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == '_');
    if trimmed.is_empty() {
        return Uuid::new_v4().to_string();
    }

    truncate_keeping_extension(trimmed)
}

// Input is ASCII only, so byte offsets are char boundaries.
fn truncate_keeping_extension(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if name.len() - dot <= 16 => name.split_at(dot),
        _ => (name, ""),
    };
    let stem = &stem[..MAX_FILENAME_LEN - extension.len()];
    let stem = stem.trim_end_matches(|c: char| c == '.' || c == '_');

    format!("{}{}", stem, extension)
}

/// Writes `bytes` to `folder/filename` on the blocking pool and returns the path written.
/// A file with the same name gets overwritten.
pub async fn store(folder: &Path, filename: &str, bytes: Vec<u8>) -> Result<PathBuf, AppError> {
    let mut path = folder.to_path_buf();
    path.push(filename);

    let folder = folder.to_path_buf();
    let target = path.clone();
    web::block(move || {
        fs::create_dir_all(&folder)?;
        fs::write(&target, bytes)
    })
    .await??;

    log::info!("Stored upload at {}", path.display());
    Ok(path)
}

pub async fn read(path: &str) -> Result<Vec<u8>, AppError> {
    let path = PathBuf::from(path);
    Ok(web::block(move || fs::read(path)).await??)
}

/// Best effort removal of stored files, a file that is already gone is fine.
pub async fn remove(paths: Vec<String>) {
    if paths.is_empty() {
        return;
    }

    let result = web::block(move || {
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => log::info!("Removed upload {}", path),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => log::warn!("Could not remove upload {}: {}", path, err),
            }
        }
    })
    .await;

    if let Err(err) = result {
        log::warn!("Upload cleanup did not run: {}", err);
    }
}
