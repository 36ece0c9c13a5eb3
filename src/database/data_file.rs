use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::PrettyFormatter;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DataFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A JSON document holding one array, rewritten as a whole on every save.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::info!("Using data file {}", path.display());
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry. A file that does not exist yet is an empty collection.
    pub async fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, DataFileError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Data file {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let entries = serde_json::from_str(&contents)?;
        Ok(entries)
    }

    /// Serializes the whole collection and swaps it in with a rename, so a
    /// reader never sees a half-written file.
    pub async fn write_all<T: Serialize>(&self, entries: &[T]) -> Result<(), DataFileError> {
        let bytes = encode(entries)?;
        let tmp_path = self.tmp_path();

        if let Err(e) = tokio::fs::write(&tmp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// True when the file is absent or parses as a JSON array.
    pub async fn health_check(&self) -> Result<bool, DataFileError> {
        match self.read_all::<serde_json::Value>().await {
            Ok(_) => Ok(true),
            Err(DataFileError::Json(e)) => {
                tracing::warn!("Data file {} is not valid JSON: {}", self.path.display(), e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

/// Four-space indentation, non-ASCII left unescaped.
fn encode<T: Serialize>(entries: &[T]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut serializer)?;
    Ok(buf)
}
