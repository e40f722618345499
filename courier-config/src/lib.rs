// Layered settings for Courier
//
// Values land in one flat key/value map. Later layers override earlier ones:
// serialized defaults, then a settings file, then `.env`, then the process
// environment. String values from files and the environment take the JSON type
// of the default they override, so `COURIER_SERVER_PORT=9000` is a number while
// `COURIER_REGISTRY_NAMESPACE=20240101` stays a string.

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use error::{ConfigError, Result};
pub use loader::FileFormat;
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

pub struct ConfigManager {
    values: RwLock<Map<String, Value>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(Map::new()),
            env_prefix: None,
        }
    }

    /// Only `{prefix}_*` variables take part in the environment layer.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            values: RwLock::new(Map::new()),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Seed every field of `defaults`; these also fix the type of each key.
    pub fn load_defaults<T: Serialize>(&self, defaults: &T) -> Result<()> {
        match serde_json::to_value(defaults).map_err(|e| ConfigError::Schema(e.to_string()))? {
            Value::Object(map) => {
                self.values.write().extend(map);
                Ok(())
            }
            other => Err(ConfigError::Schema(format!(
                "defaults must serialize to a table, got {}",
                other
            ))),
        }
    }

    /// Layer a TOML, JSON or `.env` file on top.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match loader::read_file(path)? {
            Value::Object(map) => {
                self.merge(map);
                Ok(())
            }
            _ => Err(ConfigError::Malformed {
                format: FileFormat::from_path(path)?,
                path: path.to_path_buf(),
                message: "expected a table of settings".to_string(),
            }),
        }
    }

    /// Export `.env` into the process environment, then apply the environment layer.
    ///
    /// Without `path`, a missing `.env` in the working directory is not an error.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path)?;
            }
            None => match dotenvy::dotenv() {
                Ok(_) => {}
                Err(e) if e.not_found() => {}
                Err(e) => return Err(e.into()),
            },
        }
        self.load_env();
        Ok(())
    }

    /// Apply the process environment.
    pub fn load_env(&self) {
        self.load_vars(std::env::vars());
    }

    /// Apply an explicit set of variables as the environment layer.
    pub fn load_vars<I>(&self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars = match &self.env_prefix {
            Some(prefix) => env::prefixed(prefix, vars),
            None => vars
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        };
        self.merge(vars.into_iter().map(|(k, v)| (k, Value::String(v))));
    }

    fn merge(&self, layer: impl IntoIterator<Item = (String, Value)>) {
        let mut values = self.values.write();
        for (key, value) in layer {
            let value = match value {
                Value::String(raw) => env::coerce(values.get(&key), raw),
                typed => typed,
            };
            values.insert(key, value);
        }
    }

    /// Deserialize the merged map into `T` and validate it.
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let merged = Value::Object(self.values.read().clone());
        let settings: T =
            serde_json::from_value(merged).map_err(|e| ConfigError::Schema(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
