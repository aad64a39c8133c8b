//! Scraping job requests and their multipart wire representation.
//!
//! A [`JobRequest`] is validated locally with [`JobRequest::validate`] before
//! anything is sent. [`JobRequest::form_fields`] yields exactly the fields the
//! backend expects: fields the user never filled are left out entirely rather
//! than sent as empty strings.

use crate::app_config::EndpointStyle;
use crate::{Platform, ValidationError};

/// What a job scrapes. Which variants are accepted depends on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Trustpilot review page URL.
    CompanyUrl(String),
    /// Google business looked up by name, optionally narrowed by address.
    Business {
        name: String,
        address: Option<String>,
    },
    /// Google Maps URL of the business.
    MapsUrl(String),
    /// Google place identifier.
    PlaceId(String),
}

impl Target {
    fn kind(&self) -> &'static str {
        match self {
            Target::CompanyUrl(_) => "company URL",
            Target::Business { .. } => "business name",
            Target::MapsUrl(_) => "Google Maps URL",
            Target::PlaceId(_) => "place ID",
        }
    }

    fn accepted_by(&self, platform: Platform) -> bool {
        match platform {
            Platform::Trustpilot => matches!(self, Target::CompanyUrl(_)),
            Platform::Google => !matches!(self, Target::CompanyUrl(_)),
        }
    }

    /// The wire field carrying the identifier, paired with its trimmed value.
    fn primary_field(&self) -> (&'static str, &str) {
        match self {
            Target::CompanyUrl(url) => ("company_url", url.trim()),
            Target::Business { name, .. } => ("business_name", name.trim()),
            Target::MapsUrl(url) => ("google_maps_url", url.trim()),
            Target::PlaceId(id) => ("place_id", id.trim()),
        }
    }
}

/// Optional review filters, interpreted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub keywords: Vec<String>,
    pub ratings: Vec<u8>,
}

impl Filters {
    /// Parses comma-separated keyword and rating lists as typed by a user.
    ///
    /// Blank entries (`"a,,b"`, trailing commas) are dropped. Duplicate
    /// ratings collapse to one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRating`] if a rating is not a whole
    /// number from 1 to 5.
    pub fn parse(keywords: Option<&str>, ratings: Option<&str>) -> Result<Self, ValidationError> {
        let keywords = keywords
            .map(|raw| split_list(raw).map(str::to_string).collect())
            .unwrap_or_default();

        let mut parsed_ratings: Vec<u8> = Vec::new();
        for value in ratings.map(split_list).into_iter().flatten() {
            let rating = value
                .parse::<u8>()
                .ok()
                .filter(|r| (1..=5).contains(r))
                .ok_or_else(|| ValidationError::InvalidRating {
                    value: value.to_string(),
                })?;
            if !parsed_ratings.contains(&rating) {
                parsed_ratings.push(rating);
            }
        }

        Ok(Self {
            keywords,
            ratings: parsed_ratings,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.ratings.is_empty()
    }

    fn keywords_field(&self) -> Option<String> {
        (!self.keywords.is_empty()).then(|| self.keywords.join(","))
    }

    fn ratings_field(&self) -> Option<String> {
        (!self.ratings.is_empty()).then(|| {
            self.ratings
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// One scraping job as submitted from a platform form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub platform: Platform,
    pub target: Target,
    pub filters: Filters,
}

impl JobRequest {
    #[must_use]
    pub fn new(platform: Platform, target: Target) -> Self {
        Self {
            platform,
            target,
            filters: Filters::default(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Checks the request can be submitted.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::TargetMismatch`] if the target kind is not scraped
    ///   on this platform.
    /// - [`ValidationError::MissingField`] if the identifying field is blank.
    /// - [`ValidationError::InvalidRating`] if a rating lies outside 1–5.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.target.accepted_by(self.platform) {
            return Err(ValidationError::TargetMismatch {
                platform: self.platform,
                target: self.target.kind(),
            });
        }

        let (field, value) = self.target.primary_field();
        if value.is_empty() {
            return Err(ValidationError::MissingField { field });
        }

        if let Some(bad) = self.filters.ratings.iter().find(|r| !(1..=5).contains(*r)) {
            return Err(ValidationError::InvalidRating {
                value: bad.to_string(),
            });
        }

        Ok(())
    }

    /// Multipart fields for this request, in send order.
    ///
    /// Only populated fields appear. The `platform` field is added for the
    /// unified `/process/` endpoint, which serves every platform.
    #[must_use]
    pub fn form_fields(&self, style: EndpointStyle) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(5);

        if style == EndpointStyle::Unified {
            fields.push(("platform", self.platform.as_str().to_string()));
        }

        let (name, value) = self.target.primary_field();
        fields.push((name, value.to_string()));

        if let Target::Business {
            address: Some(address),
            ..
        } = &self.target
        {
            let address = address.trim();
            if !address.is_empty() {
                fields.push(("address", address.to_string()));
            }
        }

        if let Some(keywords) = self.filters.keywords_field() {
            fields.push(("keywords", keywords));
        }
        if let Some(ratings) = self.filters.ratings_field() {
            fields.push(("include_ratings", ratings));
        }

        fields
    }
}

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;
