//! Error handling for the WAN monitor

use thiserror::Error;

/// Custom error types for the WAN monitor
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Ping invocation errors (spawn failure, non-zero exit)
    #[error("Ping error: {0}")]
    Ping(String),

    /// Speedtest protocol errors (no servers, no usable server, ...)
    #[error("Speedtest error: {0}")]
    Speedtest(String),

    /// Parsing errors (ping output, JSON, URLs, ...)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Metrics registry and exposition errors
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

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

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new ping error
    pub fn ping<S: Into<String>>(message: S) -> Self {
        Self::Ping(message.into())
    }

    /// Create a new speedtest error
    pub fn speedtest<S: Into<String>>(message: S) -> Self {
        Self::Speedtest(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new metrics error
    pub fn metrics<S: Into<String>>(message: S) -> Self {
        Self::Metrics(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
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
            Self::HttpRequest(_) => "HTTP",
            Self::Ping(_) => "PING",
            Self::Speedtest(_) => "SPEEDTEST",
            Self::Parse(_) => "PARSE",
            Self::Metrics(_) => "METRICS",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is transient, i.e. the next scheduled run may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::HttpRequest(_) | Self::Ping(_) | Self::Speedtest(_) => true,
            Self::Config(_) | Self::Parse(_) | Self::Metrics(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::HttpRequest(_) | Self::Ping(_) | Self::Speedtest(_) => 2,
            Self::Metrics(_) => 3,
            Self::Io(_) => 5,
            Self::Internal(_) => 99,
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
        if error.is_timeout() {
            Self::network(format!("Request timed out: {}", error))
        } else if error.is_connect() {
            Self::network(format!("Connection failed: {}", error))
        } else if error.is_decode() {
            Self::parse(format!("Response decode error: {}", error))
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<prometheus::Error> for AppError {
    fn from(error: prometheus::Error) -> Self {
        Self::metrics(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Extension trait for adding context to foreign errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().prefixed(&f()))
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

impl AppError {
    /// Prefix the message with context, keeping the error category
    pub fn prefixed(self, context: &str) -> Self {
        let wrap = |message: String| format!("{}: {}", context, message);
        match self {
            Self::Config(m) => Self::Config(wrap(m)),
            Self::Network(m) => Self::Network(wrap(m)),
            Self::HttpRequest(m) => Self::HttpRequest(wrap(m)),
            Self::Ping(m) => Self::Ping(wrap(m)),
            Self::Speedtest(m) => Self::Speedtest(wrap(m)),
            Self::Parse(m) => Self::Parse(wrap(m)),
            Self::Metrics(m) => Self::Metrics(wrap(m)),
            Self::Io(m) => Self::Io(wrap(m)),
            Self::Internal(m) => Self::Internal(wrap(m)),
        }
    }
}
