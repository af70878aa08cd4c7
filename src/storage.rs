use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Directory that commodity images are written to, shared across handlers.
#[derive(Clone)]
pub struct UploadDir(Arc<PathBuf>);

impl UploadDir {
    pub fn new(path: PathBuf) -> Self {
        UploadDir(Arc::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Extensions we accept for commodity images, keyed by multipart content type.
pub fn allowed_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Stores an uploaded image under a generated name and returns that name.
pub async fn save(dir: &Path, content_type: &str, data: &[u8]) -> Result<String, StorageError> {
    let extension = allowed_extension(content_type)
        .ok_or_else(|| StorageError::UnsupportedType(content_type.to_owned()))?;
    let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
    tokio::fs::write(dir.join(&file_name), data).await?;
    Ok(file_name)
}

/// Opens a stored image for streaming, together with its content type.
pub async fn open(dir: &Path, file_name: &str) -> std::io::Result<(tokio::fs::File, String)> {
    let path = dir.join(file_name);
    let file = tokio::fs::File::open(&path).await?;
    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_owned();
    Ok((file, content_type))
}

/// Best-effort removal; a missing file is only worth a warning.
pub async fn remove(dir: &Path, file_name: &str) {
    if let Err(err) = tokio::fs::remove_file(dir.join(file_name)).await {
        tracing::warn!(file_name, error = %err, "Failed to remove stored image");
    }
}

/// Image names are server-generated uuid hexes plus an extension; anything
/// else in a path segment is someone probing the filesystem.
pub fn is_clean_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}
