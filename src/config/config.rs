// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::utils::{validate_http_url, validate_ws_url};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "STREAMMON_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {} (expected pretty or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// WebSocket endpoint of the server pushing stream events
    pub server_url: String,

    /// Base URL of the server REST API
    pub api_base_url: String,

    /// Server instance whose streams are monitored
    pub instance: String,

    /// Optional bearer token for the server
    pub api_key: Option<String>,

    /// Local API bind address (e.g., "127.0.0.1:8080")
    pub local_api_bind: SocketAddr,

    /// Populate the snapshot from the archive stream list before subscribing
    pub seed_from_archive: bool,

    /// Capacity of the event channel between feed and synchronizer
    pub event_buffer: usize,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as `load`, reading variables through `env`
    pub fn load_with<F>(env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = env(CONFIG_PATH_VAR).unwrap_or_else(|| "config.toml".to_string());

        let mut config: Config = if Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path))?;
            toml::from_str(&contents).with_context(|| format!("Failed to parse {}", config_path))?
        } else {
            Config::default()
        };

        if let Some(val) = env("STREAMMON_SERVER_URL") {
            config.server_url = val;
        }
        if let Some(val) = env("STREAMMON_API_BASE_URL") {
            config.api_base_url = val;
        }
        if let Some(val) = env("STREAMMON_INSTANCE") {
            config.instance = val;
        }
        if let Some(val) = env("STREAMMON_API_KEY") {
            config.api_key = Some(val);
        }
        if let Some(val) = env("STREAMMON_LOCAL_API_BIND") {
            config.local_api_bind = SocketAddr::from_str(&val)?;
        }
        if let Some(val) = env("STREAMMON_SEED_FROM_ARCHIVE") {
            config.seed_from_archive = val.parse()?;
        }
        if let Some(val) = env("STREAMMON_EVENT_BUFFER") {
            config.event_buffer = val.parse()?;
        }
        if let Some(val) = env("STREAMMON_LOG_LEVEL") {
            config.log_level = val;
        }
        if let Some(val) = env("STREAMMON_LOG_FORMAT") {
            config.log_format = val.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        validate_ws_url(&self.server_url).context("Invalid server_url")?;
        validate_http_url(&self.api_base_url).context("Invalid api_base_url")?;

        if self.instance.trim().is_empty() {
            return Err(anyhow::anyhow!("instance must not be empty"));
        }
        if self.event_buffer == 0 {
            return Err(anyhow::anyhow!("event_buffer must be greater than zero"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: String::from("ws://localhost:8090/api/websocket"),
            api_base_url: String::from("http://localhost:8090"),
            instance: String::from("simulator"),
            api_key: None,
            local_api_bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            seed_from_archive: true,
            event_buffer: 1024,
            log_level: String::from("info"),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::NamedTempFile;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn missing_file_env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let mut all = vec![(CONFIG_PATH_VAR, "/nonexistent/stream-monitor/config.toml")];
        all.extend_from_slice(pairs);
        env_from(&all)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, "ws://localhost:8090/api/websocket");
        assert_eq!(config.api_base_url, "http://localhost:8090");
        assert_eq!(config.instance, "simulator");
        assert_eq!(config.api_key, None);
        assert_eq!(config.local_api_bind, SocketAddr::from_str("127.0.0.1:8080").unwrap());
        assert!(config.seed_from_archive);
        assert_eq!(config.event_buffer, 1024);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_config_file() {
        let config = Config::load_with(missing_file_env(&[])).unwrap();
        assert_eq!(config.server_url, "ws://localhost:8090/api/websocket");
        assert_eq!(config.instance, "simulator");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
server_url = "wss://ops.example.com/api/websocket"
api_base_url = "https://ops.example.com"
instance = "flight"
api_key = "test-key-123"
local_api_bind = "0.0.0.0:9000"
seed_from_archive = false
event_buffer = 64
log_level = "debug"
log_format = "json"
"#;
        fs::write(temp_file.path(), config_content).unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let config = Config::load_with(env_from(&[(CONFIG_PATH_VAR, path.as_str())])).unwrap();
        assert_eq!(config.server_url, "wss://ops.example.com/api/websocket");
        assert_eq!(config.api_base_url, "https://ops.example.com");
        assert_eq!(config.instance, "flight");
        assert_eq!(config.api_key, Some("test-key-123".to_string()));
        assert_eq!(config.local_api_bind, SocketAddr::from_str("0.0.0.0:9000").unwrap());
        assert!(!config.seed_from_archive);
        assert_eq!(config.event_buffer, 64);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "instance = \"flight\"\n").unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let config = Config::load_with(env_from(&[(CONFIG_PATH_VAR, path.as_str())])).unwrap();
        assert_eq!(config.instance, "flight");
        assert_eq!(config.server_url, "ws://localhost:8090/api/websocket");
        assert_eq!(config.event_buffer, 1024);
    }

    #[test]
    fn test_env_overrides_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "instance = \"flight\"\nlog_level = \"debug\"\n").unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let config = Config::load_with(env_from(&[
            (CONFIG_PATH_VAR, path.as_str()),
            ("STREAMMON_INSTANCE", "ground"),
        ]))
        .unwrap();
        assert_eq!(config.instance, "ground");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_var_overrides() {
        let config = Config::load_with(missing_file_env(&[
            ("STREAMMON_SERVER_URL", "ws://10.0.0.5:8090/api/websocket"),
            ("STREAMMON_API_BASE_URL", "http://10.0.0.5:8090"),
            ("STREAMMON_API_KEY", "env-key-456"),
            ("STREAMMON_LOCAL_API_BIND", "192.168.1.1:9090"),
            ("STREAMMON_SEED_FROM_ARCHIVE", "false"),
            ("STREAMMON_EVENT_BUFFER", "8"),
            ("STREAMMON_LOG_LEVEL", "trace"),
            ("STREAMMON_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.server_url, "ws://10.0.0.5:8090/api/websocket");
        assert_eq!(config.api_base_url, "http://10.0.0.5:8090");
        assert_eq!(config.api_key, Some("env-key-456".to_string()));
        assert_eq!(config.local_api_bind, SocketAddr::from_str("192.168.1.1:9090").unwrap());
        assert!(!config.seed_from_archive);
        assert_eq!(config.event_buffer, 8);
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_env_values_are_errors() {
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_LOCAL_API_BIND", "nope")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_EVENT_BUFFER", "-1")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_SEED_FROM_ARCHIVE", "maybe")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_validation_failures() {
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_SERVER_URL", "http://localhost/ws")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_API_BASE_URL", "ftp://localhost")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_INSTANCE", "  ")])).is_err());
        assert!(Config::load_with(missing_file_env(&[("STREAMMON_EVENT_BUFFER", "0")])).is_err());
    }

    #[test]
    fn test_helper_config_is_valid() {
        assert!(crate::test_helpers::create_test_config().validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "event_buffer = \"lots\"\n").unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        assert!(Config::load_with(env_from(&[(CONFIG_PATH_VAR, path.as_str())])).is_err());
    }
}
