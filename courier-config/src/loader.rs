// Config file formats

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Format of a settings file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Json,
    /// `KEY=value` lines; values stay strings
    Env,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            Some("env") => Ok(FileFormat::Env),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parse `content` into a JSON value; the error is the parser's message.
    pub(crate) fn parse(self, content: &str) -> std::result::Result<Value, String> {
        match self {
            FileFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            FileFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
            FileFormat::Env => Ok(Value::Object(parse_env_lines(content))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Toml => "TOML",
            FileFormat::Json => "JSON",
            FileFormat::Env => ".env",
        })
    }
}

fn parse_env_lines(content: &str) -> Map<String, Value> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_lowercase(), Value::String(value.to_string()))
        })
        .collect()
}

/// Read and parse one settings file.
pub fn read_file(path: &Path) -> Result<Value> {
    let format = FileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    format.parse(&content).map_err(|message| ConfigError::Malformed {
        format,
        path: path.to_path_buf(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_keeps_types() {
        let value = FileFormat::Toml
            .parse("target_service = \"orders\"\nserver_port = 42")
            .unwrap();

        assert_eq!(value["target_service"], "orders");
        assert_eq!(value["server_port"], 42);
    }

    #[test]
    fn test_json_keeps_types() {
        let value = FileFormat::Json
            .parse(r#"{"target_service": "orders", "server_port": 42}"#)
            .unwrap();
        assert_eq!(value["server_port"], 42);
    }

    #[test]
    fn test_env_values_stay_strings() {
        let value = FileFormat::Env
            .parse(
                r#"
                TARGET_QUERY=name=nacos
                SERVER_PORT=42
                # Comment
                REGISTRY_NAMESPACE="20240101"
                "#,
            )
            .unwrap();

        assert_eq!(value["target_query"], "name=nacos");
        assert_eq!(value["server_port"], "42");
        assert_eq!(value["registry_namespace"], "20240101");
    }

    #[test]
    fn test_malformed_toml() {
        assert!(FileFormat::Toml.parse("this is = = not toml").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.TOML")).unwrap(), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new(".env.env")).unwrap(), FileFormat::Env);
        assert!(matches!(
            FileFormat::from_path(Path::new("courier")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            read_file(Path::new("/nonexistent/courier.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
