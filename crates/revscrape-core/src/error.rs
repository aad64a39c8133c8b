use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// A job request that must not be sent to the backend.
///
/// Detected locally, before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{platform} jobs cannot target a {target}")]
    TargetMismatch {
        platform: crate::Platform,
        target: &'static str,
    },

    #[error("this form submits {form} jobs, not {request}")]
    PlatformMismatch {
        form: crate::Platform,
        request: crate::Platform,
    },

    #[error("invalid rating \"{value}\": ratings must be whole numbers from 1 to 5")]
    InvalidRating { value: String },

    #[error("unknown platform \"{0}\": expected google or trustpilot")]
    UnknownPlatform(String),
}
