//! Wire shapes of the backend's JSON payloads.

use serde::{Deserialize, Serialize};

/// Error envelope the scrape and upload endpoints send instead of a file.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// `GET /google-login`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginUrlResponse {
    pub auth_url: String,
}

/// `GET /auth-status`
#[derive(Debug, Deserialize)]
pub(crate) struct AuthStatusResponse {
    pub authenticated: bool,
}

/// `POST /google/upload`
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub message: String,
}

/// `POST /api/openai`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AskRequest<'a> {
    pub user_prompt: &'a str,
    pub output_file: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AskResponse {
    pub message: String,
}
