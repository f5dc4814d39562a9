//! Upload relay storage
//!
//! Stores uploaded backdrop images on disk and hands back the reference
//! the display uses to fetch them again.

use std::path::{Path, PathBuf};
use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tracing::info;

/// Public URL prefix under which stored files are served
const UPLOADS_PREFIX: &str = "uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file")]
    MissingFile,

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed store for uploaded files
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the storage directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Store `bytes` under a generated name and return `uploads/<name>`
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let name = generate_name(original_name, Utc::now().timestamp_millis());
        fs::write(self.dir.join(&name), bytes).await?;
        info!("Stored upload {} ({} bytes)", name, bytes.len());
        Ok(format!("{}/{}", UPLOADS_PREFIX, name))
    }
}

/// Timestamp-prefixed file name with all whitespace removed
///
/// Only the last path component of the client-supplied name is kept, and
/// characters with a meaning inside a URL path become `_` so the returned
/// reference can be fetched as-is.
fn generate_name(original_name: &str, now_millis: i64) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if is_url_safe(c) { c } else { '_' })
        .collect();

    let cleaned = match cleaned.as_str() {
        "" | "." | ".." => "upload".to_string(),
        _ => cleaned,
    };
    format!("{}-{}", now_millis, cleaned)
}

fn is_url_safe(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '~')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_name_strips_whitespace() {
        assert_eq!(
            generate_name("Stage Back drop.png", 1700000000000),
            "1700000000000-StageBackdrop.png"
        );
        assert_eq!(generate_name("tab\tand\nnewline.jpg", 5), "5-tabandnewline.jpg");
    }

    #[test]
    fn test_generate_name_drops_directories() {
        assert_eq!(generate_name("../../etc/passwd", 1), "1-passwd");
        assert_eq!(generate_name("C:\\Users\\me\\bg.png", 1), "1-bg.png");
    }

    #[test]
    fn test_generate_name_replaces_url_reserved_characters() {
        assert_eq!(generate_name("a?b#c%d.png", 1), "1-a_b_c_d.png");
        assert_eq!(generate_name("cover&art+v2;final.jpg", 1), "1-cover_art_v2_final.jpg");
        assert_eq!(generate_name("poster_v1-final~.png", 1), "1-poster_v1-final~.png");
    }

    #[test]
    fn test_generate_name_fallback() {
        assert_eq!(generate_name("", 9), "9-upload");
        assert_eq!(generate_name("   ", 9), "9-upload");
        assert_eq!(generate_name("dir/..", 9), "9-upload");
    }

    #[tokio::test]
    async fn test_save_writes_file_unmodified() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::new(tmp.path().join("nested"), 1024);
        store.ensure_dir().await.unwrap();

        let reference = store.save("my photo.png", b"\x89PNG data").await.unwrap();
        let name = reference.strip_prefix("uploads/").unwrap();
        assert!(name.ends_with("-myphoto.png"));

        let stored = std::fs::read(store.dir().join(name)).unwrap();
        assert_eq!(stored, b"\x89PNG data");
    }
}
