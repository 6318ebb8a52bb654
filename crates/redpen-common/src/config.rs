//! Connection configuration.
//!
//! Values are layered: defaults, then a config file, then environment
//! variables, then whatever the caller sets explicitly (CLI flags).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Where and how to reach the correction oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub base_url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub retry: RetryPolicy,
}

impl ConnectionConfig {
    /// Default Ollama endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";

    pub const ENV_BASE_URL: &'static str = "REDPEN_BASE_URL";
    pub const ENV_TOKEN: &'static str = "REDPEN_TOKEN";
    pub const ENV_MODEL: &'static str = "REDPEN_MODEL";
    pub const ENV_RETRIES: &'static str = "REDPEN_RETRIES";

    pub fn parse_url(url: &str) -> Result<Url, ConfigError> {
        Url::parse(url).map_err(|e| ConfigError::UrlParse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Overlay environment variables.
    ///
    /// Optional env vars:
    /// - `REDPEN_BASE_URL`: server URL (default: http://localhost:11434)
    /// - `REDPEN_TOKEN`: bearer token
    /// - `REDPEN_MODEL`: model name
    /// - `REDPEN_RETRIES`: total connection attempts
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from an arbitrary variable source.
    pub fn apply_vars(
        mut self,
        var: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = var(Self::ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = Self::parse_url(&url)?;
        }
        if let Some(token) = var(Self::ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(model) = var(Self::ENV_MODEL).filter(|v| !v.is_empty()) {
            self.model = Some(model);
        }
        if let Some(retries) = var(Self::ENV_RETRIES).filter(|v| !v.is_empty()) {
            self.retry.max_attempts =
                retries.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
                    var: Self::ENV_RETRIES,
                    message: e.to_string(),
                })?;
        }
        Ok(self)
    }

    /// Defaults, then the file at `path` if it exists, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => FileStore::new(path).load()?,
            _ => Self::default(),
        };
        config.apply_env()
    }

    /// Endpoint under the base URL, e.g. `api/tags`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(Self::DEFAULT_BASE_URL).expect("default base URL is valid"),
            token: None,
            model: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Default config file location in the user's config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("redpen").join("config.toml"))
}

/// Reads and writes a [`ConnectionConfig`] file.
///
/// The format follows the file extension: `.json` or `.toml`.
pub struct FileStore {
    path: PathBuf,
}

enum Format {
    Json,
    Toml,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    fn format(&self) -> Result<Format, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.display(),
            }),
        }
    }

    pub fn load(&self) -> Result<ConnectionConfig, ConfigError> {
        let format = self.format()?;
        let contents = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Read {
            path: self.display(),
            message: e.to_string(),
        })?;
        let parse_err = |message: String| ConfigError::Parse {
            path: self.display(),
            message,
        };
        let config = match format {
            Format::Json => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            Format::Toml => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };
        tracing::debug!(path = %self.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self, config: &ConnectionConfig) -> Result<(), ConfigError> {
        let format = self.format()?;
        let write_err = |message: String| ConfigError::Write {
            path: self.display(),
            message,
        };
        let contents = match format {
            Format::Json => {
                serde_json::to_string_pretty(config).map_err(|e| write_err(e.to_string()))?
            }
            Format::Toml => toml::to_string_pretty(config).map_err(|e| write_err(e.to_string()))?,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&self.path, contents).map_err(|e| write_err(e.to_string()))?;
        tracing::debug!(path = %self.display(), "saved config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.base_url.as_str(), "http://localhost:11434/");
        assert_eq!(config.token, None);
        assert_eq!(config.model, None);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.endpoint("api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn test_env_overlay() {
        let config = ConnectionConfig::default()
            .apply_vars(vars(&[
                ("REDPEN_BASE_URL", "https://ollama.example.com/"),
                ("REDPEN_TOKEN", "secret"),
                ("REDPEN_MODEL", "llama3"),
                ("REDPEN_RETRIES", "5"),
            ]))
            .unwrap();
        assert_eq!(config.endpoint("api/generate"), "https://ollama.example.com/api/generate");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.model.as_deref(), Some("llama3"));
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = ConnectionConfig::default()
            .apply_vars(vars(&[("REDPEN_TOKEN", "")]))
            .unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_bad_env_values() {
        let err = ConnectionConfig::default()
            .apply_vars(vars(&[("REDPEN_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UrlParse { .. }));

        let err = ConnectionConfig::default()
            .apply_vars(vars(&[("REDPEN_RETRIES", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "REDPEN_RETRIES", .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("redpen-config-{}", std::process::id()));
        let config = ConnectionConfig {
            token: Some("t0k3n".into()),
            model: Some("mistral".into()),
            retry: RetryPolicy {
                max_attempts: 2,
                delay: Duration::from_millis(250),
            },
            ..Default::default()
        };

        for name in ["config.json", "config.toml"] {
            let store = FileStore::new(dir.join(name));
            store.save(&config).unwrap();
            assert_eq!(store.load().unwrap(), config);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ConnectionConfig = toml::from_str(r#"model = "phi3""#).unwrap();
        assert_eq!(config.model.as_deref(), Some("phi3"));
        assert_eq!(config.base_url.as_str(), "http://localhost:11434/");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_unsupported_format() {
        let store = FileStore::new("config.yaml");
        assert!(matches!(
            store.load(),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}
