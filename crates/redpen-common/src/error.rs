//! Error types for redpen.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error, Diagnostic)]
pub enum RedpenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    #[diagnostic(code(redpen::host_format))]
    HostFormat(#[from] redpen_core::HostFormatError),

    #[error("io error: {0}")]
    #[diagnostic(code(redpen::io))]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {message}")]
    #[diagnostic(
        code(redpen::config::url_parse),
        help("the server URL needs a scheme, e.g. http://localhost:11434")
    )]
    UrlParse { url: String, message: String },

    #[error("invalid value for {var}: {message}")]
    #[diagnostic(code(redpen::config::invalid_env))]
    InvalidEnv { var: &'static str, message: String },

    #[error("unsupported config file format: {path}")]
    #[diagnostic(
        code(redpen::config::format),
        help("use a .json or .toml file")
    )]
    UnsupportedFormat { path: String },

    #[error("failed to read config file {path}: {message}")]
    #[diagnostic(code(redpen::config::read))]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(code(redpen::config::parse))]
    Parse { path: String, message: String },

    #[error("failed to write config file {path}: {message}")]
    #[diagnostic(code(redpen::config::write))]
    Write { path: String, message: String },
}

/// Failures talking to the correction oracle.
#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error("authentication failed")]
    #[diagnostic(
        code(redpen::oracle::unauthorized),
        help("check the API token (REDPEN_TOKEN or --token)")
    )]
    Unauthorized,

    #[error("could not reach {url}: {message}")]
    #[diagnostic(
        code(redpen::oracle::unreachable),
        help("check the URL and ensure the server is running")
    )]
    Unreachable { url: String, message: String },

    #[error("server returned {status}: {body}")]
    #[diagnostic(code(redpen::oracle::status))]
    Status { status: u16, body: String },

    #[error("invalid response from server: {0}")]
    #[diagnostic(code(redpen::oracle::response))]
    InvalidResponse(String),

    #[error("no model selected")]
    #[diagnostic(
        code(redpen::oracle::no_model),
        help("pass --model or set REDPEN_MODEL; `redpen models` lists what the server offers")
    )]
    NoModel,

    #[error("request failed: {0}")]
    #[diagnostic(code(redpen::oracle::request))]
    Request(String),
}

impl OracleError {
    /// Map a transport error from reqwest.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Self::Unauthorized;
            }
            return Self::Status {
                status: status.as_u16(),
                body: err.to_string(),
            };
        }
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }

    /// One-line explanation for the connection status line.
    pub fn user_message(&self) -> String {
        let summary = match self {
            Self::Unauthorized => "Authentication failed. Please check your API token.",
            Self::Unreachable { .. } => {
                "Could not reach the server. Please check the URL and ensure the server is running."
            }
            _ => "Connection failed",
        };
        format!("{summary} ({self})")
    }

    /// Whether trying again might help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable { .. } | Self::Request(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Unauthorized | Self::InvalidResponse(_) | Self::NoModel => false,
        }
    }
}
