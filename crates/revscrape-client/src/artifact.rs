//! Downloaded spreadsheets and their staged on-disk copies.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

/// MIME type sent with uploads when the backend did not declare one.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The binary spreadsheet produced by a successful scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Reads a spreadsheet from disk, e.g. to upload a previous download.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| "reviews.xlsx".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            filename,
            content_type: None,
            bytes,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn upload_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(XLSX_CONTENT_TYPE)
    }
}

/// An artifact held in a temporary file until it is saved or superseded.
///
/// Only the file keeps the bytes; [`StagedArtifact::load`] reads them back
/// for an upload. Clones share the file, which is removed when the last clone
/// is dropped, so replacing a form's staged artifact releases the previous
/// one.
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    filename: String,
    content_type: Option<String>,
    size: usize,
    file: Arc<NamedTempFile>,
}

impl StagedArtifact {
    /// Stages `artifact` in the system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the temporary file cannot be written.
    pub fn stage(artifact: Artifact) -> std::io::Result<Self> {
        Self::stage_in(artifact, &std::env::temp_dir())
    }

    /// Stages `artifact` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the temporary file cannot be written.
    pub fn stage_in(artifact: Artifact, dir: &Path) -> std::io::Result<Self> {
        let suffix = format!("-{}", artifact.filename);
        let mut file = tempfile::Builder::new()
            .prefix("revscrape-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(&artifact.bytes)?;
        file.flush()?;
        tracing::debug!(
            path = %file.path().display(),
            bytes = artifact.len(),
            "staged artifact"
        );
        Ok(Self {
            size: artifact.len(),
            filename: artifact.filename,
            content_type: artifact.content_type,
            file: Arc::new(file),
        })
    }

    /// [`StagedArtifact::stage_in`] on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the temporary file cannot be written.
    pub async fn stage_in_background(artifact: Artifact, dir: PathBuf) -> std::io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::stage_in(artifact, &dir))
            .await
            .map_err(std::io::Error::other)?
    }

    /// Reads the staged bytes back into an [`Artifact`].
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the staged file cannot be read.
    pub async fn load(&self) -> std::io::Result<Artifact> {
        let staged = self.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(staged.path())?;
            Ok(Artifact {
                filename: staged.filename.clone(),
                content_type: staged.content_type.clone(),
                bytes,
            })
        })
        .await
        .map_err(std::io::Error::other)?
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Location of the staged copy. Valid only while a clone is alive.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Copies the staged file out. If `dest` is an existing directory the
    /// artifact's filename is appended.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the copy fails.
    pub fn save_to(&self, dest: &Path) -> std::io::Result<PathBuf> {
        let target = if dest.is_dir() {
            dest.join(&self.filename)
        } else {
            dest.to_path_buf()
        };
        std::fs::copy(self.file.path(), &target)?;
        Ok(target)
    }
}
