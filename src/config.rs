use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{DashArgs, ListArgs, ServeArgs};

pub const DEFAULT_CONFIG_PATH: &str = "roster.toml";
pub const DEFAULT_DB_PATH: &str = "db/roster.sqlite";
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Optional `roster.toml`. Every key is a fallback for the matching flag or
/// environment variable.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DashboardSection {
    pub server_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    pub db_path: PathBuf,
    pub bind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashSettings {
    pub client: ClientSettings,
    pub poll_interval: Duration,
}

impl FileConfig {
    /// Reads `path` when given; otherwise reads `roster.toml` if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|err| ConfigError::Read {
            path: path.clone(),
            source: err,
        })?;
        let config = Self::from_toml(&raw)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn serve_settings(&self, db: Option<PathBuf>, args: &ServeArgs) -> ServeSettings {
        ServeSettings {
            db_path: db
                .or_else(|| self.server.db_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            bind: args
                .bind
                .clone()
                .or_else(|| self.server.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        }
    }

    pub fn client_settings(&self, server_url: Option<&str>) -> ClientSettings {
        ClientSettings {
            server_url: server_url
                .map(str::to_string)
                .or_else(|| self.dashboard.server_url.clone())
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            timeout: Duration::from_millis(
                self.dashboard.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
        }
    }

    pub fn list_settings(&self, args: &ListArgs) -> ClientSettings {
        self.client_settings(args.server_url.as_deref())
    }

    pub fn dash_settings(&self, args: &DashArgs) -> Result<DashSettings, ConfigError> {
        let poll_ms = args
            .poll_interval_ms
            .or(self.dashboard.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(DashSettings {
            client: self.client_settings(args.server_url.as_deref()),
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FileConfig, DEFAULT_BIND, DEFAULT_DB_PATH, DEFAULT_SERVER_URL};
    use crate::cli::{DashArgs, ServeArgs};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = FileConfig::default();
        let serve = config.serve_settings(None, &ServeArgs { bind: None });
        assert_eq!(serve.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(serve.bind, DEFAULT_BIND);

        let dash = config
            .dash_settings(&DashArgs {
                server_url: None,
                poll_interval_ms: None,
            })
            .expect("defaults should be valid");
        assert_eq!(dash.client.server_url, DEFAULT_SERVER_URL);
        assert_eq!(dash.poll_interval, Duration::from_secs(3));
        assert_eq!(dash.client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn flags_beat_file_values() {
        let config = FileConfig::from_toml(
            r#"
[server]
bind = "127.0.0.1:7000"
db_path = "/tmp/file.sqlite"

[dashboard]
server_url = "http://file:7000"
poll_interval_ms = 500
timeout_ms = 250
"#,
        )
        .expect("config should parse");

        let serve = config.serve_settings(
            Some(PathBuf::from("/tmp/flag.sqlite")),
            &ServeArgs { bind: None },
        );
        assert_eq!(serve.db_path, PathBuf::from("/tmp/flag.sqlite"));
        assert_eq!(serve.bind, "127.0.0.1:7000");

        let dash = config
            .dash_settings(&DashArgs {
                server_url: Some("http://flag:9000".to_string()),
                poll_interval_ms: None,
            })
            .expect("settings should resolve");
        assert_eq!(dash.client.server_url, "http://flag:9000");
        assert_eq!(dash.poll_interval, Duration::from_millis(500));
        assert_eq!(dash.client.timeout, Duration::from_millis(250));
    }

    #[test]
    fn unknown_keys_and_zero_interval_are_rejected() {
        let err = FileConfig::from_toml("[server]\nport = 1\n").expect_err("unknown key");
        assert!(matches!(err, ConfigError::Toml(_)));

        let err = FileConfig::default()
            .dash_settings(&DashArgs {
                server_url: None,
                poll_interval_ms: Some(0),
            })
            .expect_err("zero interval should fail");
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = FileConfig::load(Some(Path::new("/definitely/not/here/roster.toml")))
            .expect_err("explicit path must exist");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
