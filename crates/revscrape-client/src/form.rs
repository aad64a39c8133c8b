//! Per-form submission state.
//!
//! A [`ScrapeForm`] serves one platform form: it allows one submission at a
//! time, stages the artifact of the latest successful submission, and
//! remembers the latest failure. Starting a new submission releases the
//! previously staged artifact.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use revscrape_core::{JobRequest, Platform, ValidationError};

use crate::artifact::StagedArtifact;
use crate::auth::AuthCoordinator;
use crate::client::ScrapeClient;
use crate::error::{FailureKind, JobError, UploadError};

#[derive(Debug, Default)]
enum FormPhase {
    #[default]
    Idle,
    Submitting,
    Ready(StagedArtifact),
    Failed(Failure),
}

/// A failed submission as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&JobError> for Failure {
    fn from(err: &JobError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The staged artifact offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub size: usize,
    pub staged_path: PathBuf,
}

/// Snapshot of a form for rendering.
///
/// `download` is `Some` only when an artifact is ready; the download and
/// upload controls are shown only then.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormView {
    pub submitting: bool,
    pub error: Option<Failure>,
    pub download: Option<Download>,
}

/// One platform form and its submission lifecycle.
pub struct ScrapeForm {
    platform: Platform,
    client: Arc<ScrapeClient>,
    staging_dir: PathBuf,
    phase: Mutex<FormPhase>,
}

impl ScrapeForm {
    #[must_use]
    pub fn new(platform: Platform, client: Arc<ScrapeClient>) -> Self {
        Self::with_staging_dir(platform, client, std::env::temp_dir())
    }

    #[must_use]
    pub fn with_staging_dir(
        platform: Platform,
        client: Arc<ScrapeClient>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            platform,
            client,
            staging_dir,
            phase: Mutex::new(FormPhase::Idle),
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Submits `request` and stages the resulting artifact.
    ///
    /// A second call while one is outstanding is rejected with
    /// [`FailureKind::Validation`] and leaves the running submission alone.
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] that the form now displays.
    pub async fn submit(&self, request: &JobRequest) -> Result<Download, Failure> {
        if request.platform != self.platform {
            let err = JobError::Validation(ValidationError::PlatformMismatch {
                form: self.platform,
                request: request.platform,
            });
            return Err(Failure::from(&err));
        }

        {
            let mut phase = self.lock();
            if matches!(*phase, FormPhase::Submitting) {
                tracing::debug!(platform = %self.platform, "submission already in flight");
                return Err(Failure::from(&JobError::Busy));
            }
            // Replacing the phase drops any staged artifact from the last run.
            *phase = FormPhase::Submitting;
        }
        let mut in_flight = InFlight {
            form: self,
            armed: true,
        };

        let result = match self.client.submit(request).await {
            Ok(artifact) => {
                StagedArtifact::stage_in_background(artifact, self.staging_dir.clone())
                    .await
                    .map_err(JobError::Staging)
            }
            Err(err) => Err(err),
        };

        in_flight.armed = false;
        let mut phase = self.lock();
        match result {
            Ok(staged) => {
                let download = download_of(&staged);
                *phase = FormPhase::Ready(staged);
                Ok(download)
            }
            Err(err) => {
                let failure = Failure::from(&err);
                *phase = FormPhase::Failed(failure.clone());
                Err(failure)
            }
        }
    }

    #[must_use]
    pub fn view(&self) -> FormView {
        match &*self.lock() {
            FormPhase::Idle => FormView::default(),
            FormPhase::Submitting => FormView {
                submitting: true,
                ..FormView::default()
            },
            FormPhase::Ready(staged) => FormView {
                download: Some(download_of(staged)),
                ..FormView::default()
            },
            FormPhase::Failed(failure) => FormView {
                error: Some(failure.clone()),
                ..FormView::default()
            },
        }
    }

    /// Copies the ready artifact to `dest`, returning the written path.
    ///
    /// Returns `Ok(None)` when no artifact is ready.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the copy fails.
    pub fn save_download(&self, dest: &Path) -> std::io::Result<Option<PathBuf>> {
        match &*self.lock() {
            FormPhase::Ready(staged) => staged.save_to(dest).map(Some),
            _ => Ok(None),
        }
    }

    /// Uploads the ready artifact through `auth`.
    ///
    /// # Errors
    ///
    /// - [`UploadError::NoArtifact`] when nothing is ready to upload.
    /// - [`UploadError::AuthRequired`] when not signed in.
    /// - [`UploadError::StagedFile`] if the staged copy cannot be read back.
    /// - Any other [`UploadError`] from the backend.
    pub async fn upload(&self, auth: &AuthCoordinator) -> Result<String, UploadError> {
        let staged = match &*self.lock() {
            FormPhase::Ready(staged) => staged.clone(),
            _ => return Err(UploadError::NoArtifact),
        };
        if !auth.is_authenticated() {
            return Err(UploadError::AuthRequired);
        }
        let artifact = staged.load().await.map_err(UploadError::StagedFile)?;
        auth.upload(&artifact).await
    }

    /// Drops the staged artifact and any error, returning to idle.
    pub fn reset(&self) {
        let mut phase = self.lock();
        if !matches!(*phase, FormPhase::Submitting) {
            *phase = FormPhase::Idle;
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns an abandoned submission (its future dropped mid-flight) to idle,
/// so the form does not stay locked.
struct InFlight<'a> {
    form: &'a ScrapeForm,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut phase = self.form.lock();
            if matches!(*phase, FormPhase::Submitting) {
                *phase = FormPhase::Idle;
            }
        }
    }
}

fn download_of(staged: &StagedArtifact) -> Download {
    Download {
        filename: staged.filename().to_string(),
        size: staged.len(),
        staged_path: staged.path().to_path_buf(),
    }
}
