//! Shared plumbing for redpen hosts: configuration, errors, tracing, and the
//! correction oracle.

pub mod analysis;
pub mod config;
pub mod error;
pub mod oracle;
pub mod prompts;
pub mod telemetry;

pub use analysis::{AnalyzeOutcome, Analyzer};
pub use config::{ConnectionConfig, FileStore, RetryPolicy, default_config_path};
pub use error::{ConfigError, OracleError, RedpenError};
pub use oracle::{
    ConnectionStatus, CorrectionOracle, LocalCorrectionOracle, OllamaClient, check_connection,
    connect, first_model,
};
