//! License configuration
//!
//! Where the license key comes from and which host it is checked against.
//! The `APEX_LICENSE_KEY` environment variable still overrides `key`.

use std::path::PathBuf;

use serde::Deserialize;

/// License configuration
///
/// # Example
///
/// ```toml
/// [license]
/// key_file = "/etc/apex/license"
/// host = "shop.example.com"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Inline license key
    pub key: Option<String>,

    /// File holding the license key
    pub key_file: Option<PathBuf>,

    /// Public host name of the shop, used for domain-locked keys
    pub host: Option<String>,
}
