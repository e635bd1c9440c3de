use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout occurred during {operation}")]
    Timeout { operation: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid target format: {0}")]
    InvalidTarget(String),

    #[error("Invalid authentication format: {0} (expected user:pass)")]
    InvalidCredentials(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Probe {module} failed: {message}")]
    Probe { module: String, message: String },

    #[error("Web scanning error: {0}")]
    WebScan(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Reporting error: {0}")]
    Reporting(String),
}

impl ScanError {
    /// Errors raised before any request is sent: bad URL, bad credentials, bad config file.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScanError::Config(_) | ScanError::InvalidTarget(_) | ScanError::InvalidCredentials(_)
        )
    }
}
