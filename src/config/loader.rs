//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Toml(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML parse error: {}", e),
            ConfigError::Toml(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Parse, normalise and validate configuration text.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<ProxyConfig, ConfigError> {
    let mut config: ProxyConfig = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(ConfigError::Yaml)?,
        ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::Toml)?,
    };
    config.apply_defaults();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a YAML or TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, ConfigFormat::from_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_yaml_with_defaults() {
        let yaml = r#"
backends:
  - url: http://10.0.0.1:8080
  - url: http://10.0.0.2:8080
"#;
        let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.port, 80);
        assert_eq!(config.interval, 3);
        assert_eq!(config.health, "/health");
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].url, "http://10.0.0.2:8080");
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn parses_full_yaml() {
        let yaml = r#"
port: 8080
interval: 10
health: /status
bearer_token: s3cret
dial_timeout: 2
response_header_timeout: 7
failure_window: 30
backends:
  - url: https://api.internal
observability:
  log_level: debug
"#;
        let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.interval(), Duration::from_secs(10));
        assert_eq!(config.health, "/status");
        assert_eq!(config.bearer_token.as_deref(), Some("s3cret"));
        assert_eq!(config.dial_timeout, Some(2));
        assert_eq!(config.response_header_timeout, Some(7));
        assert_eq!(config.failure_window(), Duration::from_secs(30));
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn parses_toml() {
        let toml = r#"
port = 9000
[[backends]]
url = "http://127.0.0.1:3000"
"#;
        let config = parse_config(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.backends.len(), 1);
    }

    #[test]
    fn zero_port_means_default() {
        let yaml = "port: 0\ninterval: 0\nbackends:\n  - url: http://a\n";
        let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.port, 80);
        assert_eq!(config.interval, 3);
    }

    #[test]
    fn validation_failure_is_reported() {
        let err = parse_config("port: 81\n", ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("no backends configured"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("proxy.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("backend.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("backend")), ConfigFormat::Yaml);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
