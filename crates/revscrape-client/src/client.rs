//! HTTP client for the review-scraping backend.
//!
//! Wraps `reqwest` with the backend's multipart job contract, a long
//! per-request timeout for scrapes, and typed decoding of the auxiliary JSON
//! endpoints (OAuth login URL, auth status, upload, prompt).

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use revscrape_core::{AppConfig, EndpointStyle, JobRequest, Platform};

use crate::artifact::Artifact;
use crate::error::{ClientError, JobError, JobResult, UploadError};
use crate::response;
use crate::types::{
    AskRequest, AskResponse, AuthStatusResponse, ErrorBody, LoginUrlResponse, UploadResponse,
};

const DEFAULT_USER_AGENT: &str = "revscrape/0.1";

/// Client for the scraping backend.
///
/// Use [`ScrapeClient::from_config`] in the application or
/// [`ScrapeClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ScrapeClient {
    client: Client,
    base_url: Url,
    endpoint_style: EndpointStyle,
    scrape_timeout: Duration,
    request_timeout: Duration,
}

impl ScrapeClient {
    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if the
    /// configured URL cannot serve as a base.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self {
            client,
            base_url: normalise_base_url(config.api_url.as_str())?,
            endpoint_style: config.endpoint_style,
            scrape_timeout: Duration::from_secs(config.scrape_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Creates a client with a custom base URL and per-platform endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        base_url: &str,
        scrape_timeout_secs: u64,
        request_timeout_secs: u64,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(DEFAULT_USER_AGENT)?,
            base_url: normalise_base_url(base_url)?,
            endpoint_style: EndpointStyle::PerPlatform,
            scrape_timeout: Duration::from_secs(scrape_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    #[must_use]
    pub fn with_endpoint_style(mut self, style: EndpointStyle) -> Self {
        self.endpoint_style = style;
        self
    }

    #[must_use]
    pub fn endpoint_style(&self) -> EndpointStyle {
        self.endpoint_style
    }

    /// Submits a scraping job and waits for the backend to finish it.
    ///
    /// Validation runs first; an invalid request never reaches the network.
    /// The response is classified by [`response::classify`]: a spreadsheet
    /// becomes an [`Artifact`], anything else a [`JobError`].
    ///
    /// # Errors
    ///
    /// - [`JobError::Validation`] if the request is incomplete.
    /// - [`JobError::Backend`] if the backend sent a JSON `error`.
    /// - [`JobError::NoResults`] on a bare 404.
    /// - [`JobError::MalformedPayload`] if the payload cannot be interpreted.
    /// - [`JobError::UnexpectedStatus`] on any other bare non-2xx status.
    /// - [`JobError::Transport`] on network failure or timeout.
    pub async fn submit(&self, request: &JobRequest) -> JobResult {
        request.validate()?;

        let url = self.scrape_url(request.platform);
        let form = request
            .form_fields(self.endpoint_style)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        tracing::info!(
            platform = %request.platform,
            url = %url,
            timeout_secs = self.scrape_timeout.as_secs(),
            "submitting scrape job"
        );

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .timeout(self.scrape_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "scrape request failed");
                JobError::Transport(e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "failed to read scrape response body");
            JobError::Transport(e)
        })?;

        let result = response::classify(request.platform, status, &headers, &body);
        match &result {
            Ok(artifact) => tracing::info!(
                filename = %artifact.filename,
                bytes = artifact.len(),
                "scrape produced artifact"
            ),
            Err(e) => tracing::warn!(
                status = status.as_u16(),
                kind = %e.kind(),
                error = %e,
                "scrape did not produce an artifact"
            ),
        }
        result
    }

    /// Asks the backend for a Google OAuth URL that redirects back to `page`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not `{ auth_url }`.
    /// - [`ClientError::InvalidAuthUrl`] if `auth_url` is not an absolute URL.
    pub async fn login_url(&self, page: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint("google-login");
        url.query_pairs_mut().append_pair("page", page);

        let body: LoginUrlResponse = self.get_json(&url, "google-login").await?;
        Url::parse(&body.auth_url).map_err(|e| ClientError::InvalidAuthUrl {
            url: body.auth_url.clone(),
            reason: e.to_string(),
        })
    }

    /// One-shot check of whether the backend holds a Google session.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not `{ authenticated }`.
    pub async fn auth_status(&self) -> Result<bool, ClientError> {
        let url = self.endpoint("auth-status");
        let body: AuthStatusResponse = self.get_json(&url, "auth-status").await?;
        Ok(body.authenticated)
    }

    /// Uploads a spreadsheet to Google Drive through the backend.
    ///
    /// Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// - [`UploadError::AuthRequired`] if the backend answers 401.
    /// - [`UploadError::Rejected`] on any other non-2xx status.
    /// - [`UploadError::Client`] on network failure or an unreadable body.
    pub async fn upload(&self, artifact: &Artifact) -> Result<String, UploadError> {
        let url = self.endpoint("google/upload");
        let part = Part::bytes(artifact.bytes.clone())
            .file_name(artifact.filename.clone())
            .mime_str(artifact.upload_content_type())
            .map_err(ClientError::from)?;
        let form = Form::new().part("file", part);

        tracing::info!(filename = %artifact.filename, bytes = artifact.len(), "uploading artifact");

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(UploadError::AuthRequired);
        }

        let text = response.text().await.map_err(ClientError::from)?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse =
            serde_json::from_str(&text).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(body.message)
    }

    /// Sends a free-form prompt about a generated spreadsheet and returns
    /// the model's answer.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not `{ message }`.
    pub async fn ask(&self, prompt: &str, output_file: &str) -> Result<String, ClientError> {
        let url = self.endpoint("api/openai");
        let payload = AskRequest {
            user_prompt: prompt,
            output_file,
        };
        let response = self
            .client
            .post(url.clone())
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let body: AskResponse =
            serde_json::from_str(&text).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        Ok(body.message)
    }

    /// Scrape endpoint for `platform` under the configured endpoint style.
    pub(crate) fn scrape_url(&self, platform: Platform) -> Url {
        match self.endpoint_style {
            EndpointStyle::PerPlatform => self.endpoint(platform.endpoint_path()),
            EndpointStyle::Unified => self.endpoint("process/"),
        }
    }

    /// Resolves `path` against the base URL.
    ///
    /// The base always ends in a slash, so joining a relative path appends
    /// to it instead of replacing the last segment.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}/{path}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url
    }

    /// Sends a GET request, asserts a 2xx HTTP status, and parses the body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, ClientError> {
        tracing::debug!(url = %url, "backend request");
        let response = self
            .client
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

fn build_http_client(user_agent: &str) -> Result<Client, ClientError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Ensures the base URL ends with exactly one slash.
fn normalise_base_url(base_url: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
