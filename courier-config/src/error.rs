// Errors raised while assembling settings

use crate::loader::FileFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config file {}: expected .toml, .json or .env", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("malformed {format} in {}: {message}", path.display())]
    Malformed {
        format: FileFormat,
        path: PathBuf,
        message: String,
    },

    #[error("cannot load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("settings do not fit their schema: {0}")]
    Schema(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
