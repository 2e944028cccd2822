use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("credential store error: {0}")]
    Persistence(String),

    #[error("no stored credentials")]
    NoCredentials,

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("credential extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("login timed out after {0:?}")]
    LoginTimeout(Duration),

    #[error("invalid period range: {0}")]
    InvalidPeriod(String),

    #[error("not authenticated - session missing or expired, run a browser login first")]
    NotAuthenticated,

    #[error("fetch failed for {period}: {reason}")]
    Fetch { period: String, reason: String },

    #[error("http client error: {0}")]
    Http(String),

    #[error("webdriver error: {0}")]
    WebDriver(String),
}

impl From<fantoccini::error::CmdError> for CollectorError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        CollectorError::WebDriver(err.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for CollectorError {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        CollectorError::LaunchFailed(err.to_string())
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        CollectorError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        CollectorError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        CollectorError::Persistence(err.to_string())
    }
}
