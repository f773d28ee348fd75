// On-disk image storage for catalog entities.
//
// Files are written under `<root>/<owner-kind>/` with collision-resistant
// UUID names and served back under the stable `/uploads/...` URL prefix.
// Writes go through a temp file and rename so a half-written file is never
// reachable from an entity record.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

pub const URL_PREFIX: &str = "/uploads";

/// Allowed image extensions (with their MIME types)
const ALLOWED: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Unsupported image type: {0}. Allowed: jpeg, jpg, png, webp")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("Too many files: {count} (limit {limit})")]
    TooManyFiles { count: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An uploaded binary as received from a multipart field
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Which entity kind owns a stored file; determines directory and URL prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Categories,
    Products,
}

impl OwnerKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            OwnerKind::Categories => "categories",
            OwnerKind::Products => "products",
        }
    }
}

#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_file_bytes: usize,
    max_files_per_owner: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: usize, max_files_per_owner: usize) -> Self {
        Self { root: root.into(), max_file_bytes, max_files_per_owner }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check type and size limits without touching the filesystem. Used to
    /// validate every file of a request before any of them is persisted.
    pub fn validate(&self, file: &UploadedFile) -> Result<&'static str, MediaError> {
        if file.data.len() > self.max_file_bytes {
            return Err(MediaError::TooLarge {
                size: file.data.len(),
                limit: self.max_file_bytes,
            });
        }

        let ext = file
            .filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.').map(|(_, e)| e))
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let allowed_ext = ALLOWED.iter().find(|(e, _)| *e == ext);
        let entry = allowed_ext.ok_or_else(|| {
            MediaError::UnsupportedType(file.filename.clone().unwrap_or_else(|| "<unnamed>".into()))
        })?;

        if let Some(mime) = file.content_type.as_deref() {
            if !ALLOWED.iter().any(|(_, m)| *m == mime) {
                return Err(MediaError::UnsupportedType(mime.to_string()));
            }
        }

        Ok(entry.0)
    }

    /// Reject batches exceeding the per-owner file count
    pub fn check_count(&self, count: usize) -> Result<(), MediaError> {
        if count > self.max_files_per_owner {
            return Err(MediaError::TooManyFiles { count, limit: self.max_files_per_owner });
        }
        Ok(())
    }

    /// Persist an uploaded file and return its stable URL path,
    /// e.g. `/uploads/categories/3f2a....png`
    pub async fn store(&self, kind: OwnerKind, file: &UploadedFile) -> Result<String, MediaError> {
        let ext = self.validate(file)?;

        let dir = self.root.join(kind.dir_name());
        fs::create_dir_all(&dir).await?;

        let name = format!("{}.{}", Uuid::new_v4(), ext);
        let tmp_path = dir.join(format!(".{}.tmp", name));
        let final_path = dir.join(&name);

        // Write-then-rename keeps partially written files unreachable
        let mut out = fs::File::create(&tmp_path).await?;
        out.write_all(&file.data).await?;
        out.flush().await?;
        drop(out);
        fs::rename(&tmp_path, &final_path).await?;

        Ok(format!("{}/{}/{}", URL_PREFIX, kind.dir_name(), name))
    }

    /// Store the new file, then best-effort delete the one it replaces
    pub async fn replace(
        &self,
        kind: OwnerKind,
        old_url: Option<&str>,
        file: &UploadedFile,
    ) -> Result<String, MediaError> {
        let url = self.store(kind, file).await?;
        if let Some(old) = old_url {
            self.delete(old).await;
        }
        Ok(url)
    }

    /// Best-effort removal; non-existence is not an error and failures are
    /// logged, never surfaced
    pub async fn delete(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            warn!(url, "refusing to delete file outside the uploads root");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(url, error = %e, "failed to delete stored image"),
        }
    }

    /// Map a stored URL back to its on-disk path. Rejects anything outside
    /// the uploads prefix or containing path separators in the file name.
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(URL_PREFIX)?.strip_prefix('/')?;
        let (dir, name) = rest.split_once('/')?;

        let kind_ok = dir == OwnerKind::Categories.dir_name() || dir == OwnerKind::Products.dir_name();
        if !kind_ok || name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }

        Some(self.root.join(dir).join(name))
    }
}
