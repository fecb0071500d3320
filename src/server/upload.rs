//! Multipart intake and staging of uploaded CSV files.
//!
//! An upload is staged as a temporary file in the configured upload
//! directory. The [`StagedUpload`] guard removes it when dropped, so every
//! exit path of a request releases the file.

use crate::error::AnalyzeError;
use actix_multipart::Multipart;
use futures::TryStreamExt;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Multipart field that carries the CSV.
pub const UPLOAD_FIELD: &str = "csvFile";

/// Where and how large uploads may be.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// A staged upload on disk, deleted on drop.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    temp: Option<TempPath>,
    original_name: Option<String>,
    size: usize,
}

impl StagedUpload {
    /// Write `bytes` to a fresh temporary file inside `dir`.
    pub async fn stage(
        dir: &Path,
        bytes: &[u8],
        original_name: Option<String>,
    ) -> Result<Self, AnalyzeError> {
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".csv")
            .tempfile_in(dir)
            .map_err(AnalyzeError::Stage)?
            .into_temp_path();

        let staged = Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
            original_name,
            size: bytes.len(),
        };

        tokio::fs::write(&staged.path, bytes)
            .await
            .map_err(AnalyzeError::Stage)?;

        debug!(
            "Staged upload {:?} ({} bytes) at {}",
            staged.original_name,
            staged.size,
            staged.path.display()
        );

        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name supplied by the client, if any.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            match temp.close() {
                Ok(()) => debug!("Removed staged upload {}", self.path.display()),
                Err(e) => warn!("Failed to delete temp file {}: {}", self.path.display(), e),
            }
        }
    }
}

fn multipart_error(e: actix_multipart::MultipartError) -> AnalyzeError {
    AnalyzeError::Multipart(e.to_string())
}

/// Read the first `csvFile` field of a multipart body and stage it.
///
/// Other fields are drained and ignored.
pub async fn receive_csv(
    mut payload: Multipart,
    settings: &UploadSettings,
) -> Result<StagedUpload, AnalyzeError> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            while field.try_next().await.map_err(multipart_error)?.is_some() {}
            continue;
        }

        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(String::from);

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > settings.max_bytes {
                return Err(AnalyzeError::TooLarge {
                    limit: settings.max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        return StagedUpload::stage(&settings.dir, &bytes, original_name).await;
    }

    Err(AnalyzeError::MissingUpload(UPLOAD_FIELD))
}
