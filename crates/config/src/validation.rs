//! Configuration validation
//!
//! Runs after parsing so bad values fail at startup instead of at first use.

use crate::error::{ConfigError, Result};
use crate::{Config, LicenseConfig};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_license(&config.license)?;
    Ok(())
}

fn validate_license(license: &LicenseConfig) -> Result<()> {
    if let Some(key) = &license.key
        && key.trim().is_empty()
    {
        return Err(ConfigError::invalid_value(
            "license",
            "key",
            "must not be blank (remove it to run the free tier)",
        ));
    }

    if let Some(path) = &license.key_file
        && path.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid_value("license", "key_file", "must not be empty"));
    }

    if let Some(host) = &license.host {
        validate_host(host)?;
    }

    Ok(())
}

/// A bare host name without scheme or path.
fn validate_host(host: &str) -> Result<()> {
    let invalid = |message: &str| Err(ConfigError::invalid_value("license", "host", message));

    if host.trim().is_empty() {
        return invalid("must not be blank");
    }
    if host.contains("://") {
        return invalid("must be a host name, not a URL");
    }
    if host.contains('/') {
        return invalid("must not contain a path");
    }
    if host.chars().any(char::is_whitespace) {
        return invalid("must not contain whitespace");
    }

    Ok(())
}
