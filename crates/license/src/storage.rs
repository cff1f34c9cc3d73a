//! License key storage.
//!
//! Keys are looked up, in order of precedence, in:
//! 1. Environment variable `APEX_LICENSE_KEY`
//! 2. An inline key from the `[license]` config section
//! 3. An explicit key file (`[license] key_file`)
//! 4. `~/.apex/license`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LicenseError;

/// Environment variable for license key.
pub const LICENSE_ENV_VAR: &str = "APEX_LICENSE_KEY";

/// Where a license key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Config,
    File(PathBuf),
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment ({LICENSE_ENV_VAR})"),
            Self::Config => write!(f, "config file"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A key together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedKey {
    pub key: String,
    pub source: KeySource,
}

/// Get the default license file path.
pub fn default_license_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".apex")
        .join("license")
}

/// Load license key from all sources (in order of precedence).
///
/// Returns `None` if no license key is found (free tier).
pub fn load_license_key(inline: Option<&str>, explicit_path: Option<&Path>) -> Option<LoadedKey> {
    let env_value = std::env::var(LICENSE_ENV_VAR).ok();
    resolve_key(
        env_value.as_deref(),
        inline,
        explicit_path,
        &default_license_path(),
    )
}

fn resolve_key(
    env_value: Option<&str>,
    inline: Option<&str>,
    explicit_path: Option<&Path>,
    default_path: &Path,
) -> Option<LoadedKey> {
    if let Some(key) = non_empty(env_value) {
        debug!("license key loaded from {}", LICENSE_ENV_VAR);
        return Some(LoadedKey {
            key,
            source: KeySource::Environment,
        });
    }

    if let Some(key) = non_empty(inline) {
        debug!("license key loaded from config");
        return Some(LoadedKey {
            key,
            source: KeySource::Config,
        });
    }

    for path in explicit_path.into_iter().chain([default_path]) {
        if let Some(key) = read_key_file(path) {
            debug!(path = %path.display(), "license key loaded from file");
            return Some(LoadedKey {
                key,
                source: KeySource::File(path.to_path_buf()),
            });
        }
    }

    None
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Read license key from a file.
fn read_key_file(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(content) => non_empty(Some(&content)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable license file");
            None
        }
    }
}

/// Save license key to the default location.
pub fn save_license_key(key: &str) -> Result<PathBuf, LicenseError> {
    let path = default_license_path();
    save_license_key_to(&path, key)?;
    Ok(path)
}

/// Save license key to `path`, creating parent directories.
pub fn save_license_key_to(path: &Path, key: &str) -> Result<(), LicenseError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, key.trim())?;

    Ok(())
}

/// Remove the saved license key.
pub fn remove_license_key() -> Result<bool, LicenseError> {
    remove_license_key_at(&default_license_path())
}

/// Remove the key file at `path`. Returns whether a file was removed.
pub fn remove_license_key_at(path: &Path) -> Result<bool, LicenseError> {
    if !path.exists() {
        return Ok(false);
    }

    std::fs::remove_file(path)?;
    Ok(true)
}
