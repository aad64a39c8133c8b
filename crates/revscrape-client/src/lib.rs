pub mod artifact;
pub mod auth;
pub mod client;
pub mod error;
pub mod form;
mod response;
mod types;

pub use artifact::{Artifact, StagedArtifact, XLSX_CONTENT_TYPE};
pub use auth::{
    AuthCoordinator, AuthMessage, AuthSettings, PopupHandle, PopupLauncher, PopupWindow,
    UploadState,
};
pub use client::ScrapeClient;
pub use error::{
    AuthError, ClientError, FailureKind, JobError, JobResult, UploadError,
    GENERIC_FAILURE_MESSAGE, NO_RESULTS_MESSAGE, POPUP_BLOCKED_MESSAGE,
    UNEXPECTED_PAYLOAD_MESSAGE,
};
pub use form::{Download, Failure, FormView, ScrapeForm};
