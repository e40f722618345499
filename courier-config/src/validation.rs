// Validation rules

use crate::{ConfigError, Result};

/// Checked once every layer has been applied.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Reject empty or whitespace-only strings
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    /// Reject zero (ports, durations)
    pub fn non_zero(value: impl Into<u64>, field: &str) -> Result<()> {
        if value.into() == 0 {
            return Err(ConfigError::Invalid(format!("{} must be greater than 0", field)));
        }
        Ok(())
    }

    /// Require a leading `/`
    pub fn is_path(value: &str, field: &str) -> Result<()> {
        if !value.starts_with('/') {
            return Err(ConfigError::Invalid(format!("{} must start with '/'", field)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty() {
        assert!(ConfigValidator::not_empty("value", "field").is_ok());
        assert!(ConfigValidator::not_empty("", "field").is_err());
        assert!(ConfigValidator::not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_non_zero() {
        assert!(ConfigValidator::non_zero(8080u16, "server_port").is_ok());
        assert!(ConfigValidator::non_zero(1500u64, "request_timeout_ms").is_ok());

        let err = ConfigValidator::non_zero(0u16, "server_port").unwrap_err();
        assert!(err.to_string().contains("server_port"));
    }

    #[test]
    fn test_is_path() {
        assert!(ConfigValidator::is_path("/echo", "field").is_ok());
        assert!(ConfigValidator::is_path("echo", "field").is_err());
    }
}
