//! Error handling for bosprobe
//!
//! Two error universes live here. [`AppError`] covers the few conditions that
//! stop the process (bad configuration, missing credentials, an unusable
//! runtime). Everything the diagnostic pipeline finds is expressed as a
//! taxonomy [`Code`] instead, so that it flows to the final report rather than
//! aborting the run.

pub mod codes;
pub mod suggestions;

pub use codes::{ClientCode, Code, LocalCode};
pub use suggestions::SuggestionEngine;

use thiserror::Error;

/// Process-level errors for bosprobe
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// DNS resolution errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Credential errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Endpoint cache store errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::DnsResolution(_) => "DNS",
            Self::HttpRequest(_) => "HTTP",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Auth(_) => "AUTH",
            Self::Cache(_) => "CACHE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 2,
            Self::Network(_) | Self::DnsResolution(_) | Self::HttpRequest(_) => 3,
            Self::Auth(_) => 4,
            Self::Io(_) | Self::Cache(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) | Self::DnsResolution(_) | Self::HttpRequest(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Auth(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Cache(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_request() || error.is_timeout() {
            Self::network(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert_eq!(config_error.exit_code(), 2);

        let auth_error = AppError::auth("no credentials");
        assert_eq!(auth_error.category(), "AUTH");
        assert_eq!(auth_error.exit_code(), 4);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::cache("store unreadable");
        let display = error.to_string();
        assert!(display.contains("Cache error"));
        assert!(display.contains("store unreadable"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 2);
        assert_eq!(AppError::network("test").exit_code(), 3);
        assert_eq!(AppError::auth("test").exit_code(), 4);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::cache("test").exit_code(), 5);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<i64>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let url_error = url::Url::parse("not-a-valid-url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert!(app_error.to_string().contains("URL parse error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }

    #[test]
    fn test_error_context_trait() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found"
        ));

        let error = result.with_context(|| "While reading cache store".to_string()).unwrap_err();
        assert_eq!(error.category(), "INTERNAL");
        assert!(error.to_string().contains("While reading cache store"));
        assert!(error.to_string().contains("File not found"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::auth("missing access key");
        let plain = error.format_for_console(false);
        let colored = error.format_for_console(true);

        assert!(plain.starts_with("[AUTH]"));
        assert!(plain.contains("missing access key"));
        assert!(colored.contains("AUTH"));
        assert!(colored.contains("missing access key"));
    }
}
