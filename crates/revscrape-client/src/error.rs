use revscrape_core::ValidationError;
use thiserror::Error;

/// Shown when the backend ran the job but nothing matched.
pub const NO_RESULTS_MESSAGE: &str = "No matching reviews found. Try different keywords or ratings.";

/// Shown for every transport-level failure, whatever the cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Shown when the backend answered with a payload we cannot interpret.
pub const UNEXPECTED_PAYLOAD_MESSAGE: &str = "Unexpected error. Please try again.";

/// Shown when the auth window could not be opened.
pub const POPUP_BLOCKED_MESSAGE: &str =
    "Popup blocked! Allow popups (or set a default browser) and try signing in again.";

/// Coarse classification of a failed job, used to decide how it is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected locally before any request was sent.
    Validation,
    /// The backend ran the job and found nothing matching.
    NotFound,
    /// The backend answered with an error or a payload we cannot interpret.
    Server,
    /// Network failure, timeout, or a bare non-2xx status.
    Transport,
    /// The artifact arrived but could not be stored locally.
    Local,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "validation"),
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::Server => write!(f, "server"),
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Local => write!(f, "local"),
        }
    }
}

/// Why a scrape job did not produce an artifact.
///
/// `Display` is the user-facing message; the classification is available
/// through [`JobError::kind`].
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("a scrape is already running for this form")]
    Busy,

    /// The backend sent a JSON body with an `error` field.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// HTTP 404 without a JSON body.
    #[error("{}", NO_RESULTS_MESSAGE)]
    NoResults,

    #[error("{}", UNEXPECTED_PAYLOAD_MESSAGE)]
    MalformedPayload { status: u16, detail: String },

    #[error("{}", GENERIC_FAILURE_MESSAGE)]
    UnexpectedStatus { status: u16 },

    #[error("{}", GENERIC_FAILURE_MESSAGE)]
    Transport(#[source] reqwest::Error),

    #[error("could not store the downloaded file: {0}")]
    Staging(#[source] std::io::Error),
}

impl JobError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            JobError::Validation(_) | JobError::Busy => FailureKind::Validation,
            JobError::Backend { status, .. } => {
                if (200..300).contains(status) || *status == 404 {
                    FailureKind::NotFound
                } else {
                    FailureKind::Server
                }
            }
            JobError::NoResults => FailureKind::NotFound,
            JobError::MalformedPayload { .. } => FailureKind::Server,
            JobError::UnexpectedStatus { .. } | JobError::Transport(_) => FailureKind::Transport,
            JobError::Staging(_) => FailureKind::Local,
        }
    }
}

/// Outcome of one scrape submission.
pub type JobResult = Result<crate::Artifact, JobError>;

/// Failures from the backend's auxiliary JSON endpoints.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("backend returned an unusable auth URL '{url}': {reason}")]
    InvalidAuthUrl { url: String, reason: String },
}

/// Failures of the Google Drive upload action.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("not signed in with Google; sign in and try the upload again")]
    AuthRequired,

    #[error("no spreadsheet to upload; run a scrape first")]
    NoArtifact,

    #[error("could not read the staged spreadsheet: {0}")]
    StagedFile(#[source] std::io::Error),

    #[error("upload failed: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Failures starting the OAuth side-channel.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", POPUP_BLOCKED_MESSAGE)]
    PopupBlocked {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("a sign-in window is already open")]
    AlreadyPending,

    #[error(transparent)]
    Client(#[from] ClientError),
}
