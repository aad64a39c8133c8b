use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Review source a scraping job runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Google,
    Trustpilot,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Google, Platform::Trustpilot];

    /// Lowercase wire name, used for the `platform` form field and URL paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Google => "google",
            Platform::Trustpilot => "trustpilot",
        }
    }

    /// Path of the platform-specific scrape endpoint.
    #[must_use]
    pub fn endpoint_path(self) -> &'static str {
        self.as_str()
    }

    /// Filename used for the artifact when the backend does not suggest one.
    #[must_use]
    pub fn default_filename(self) -> &'static str {
        match self {
            Platform::Google => "google_reviews.xlsx",
            Platform::Trustpilot => "trustpilot_reviews.xlsx",
        }
    }

    /// Page key sent to `/google-login` so the backend redirects back to the
    /// form that started the OAuth flow.
    #[must_use]
    pub fn login_page(self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "google-maps" | "maps" => Ok(Platform::Google),
            "trustpilot" => Ok(Platform::Trustpilot),
            _ => Err(ValidationError::UnknownPlatform(s.to_string())),
        }
    }
}
