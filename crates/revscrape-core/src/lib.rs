pub mod app_config;
pub mod config;
pub mod error;
pub mod platform;
pub mod request;

pub use app_config::{AppConfig, EndpointStyle, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ValidationError};
pub use platform::Platform;
pub use request::{Filters, JobRequest, Target};
