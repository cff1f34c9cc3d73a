//! Apex Commerce license validation.
//!
//! This crate issues and validates product keys and maps the active edition
//! to the features and limits the rest of the back-office enforces.
//!
//! # License Model
//!
//! | Code | Edition | Products | Admins | Orders/month |
//! |------|---------|----------|--------|--------------|
//! | `F` | Free (no key) | 25 | 1 | 100 |
//! | `S` | Standard | 500 | 3 | 2 000 |
//! | `P` | Professional | 5 000 | 10 | unlimited |
//! | `E` | Enterprise | unlimited | unlimited | unlimited |
//! | `D` | Developer | unlimited | unlimited | unlimited |
//! | `U` | Unlimited | unlimited | unlimited | unlimited |
//!
//! # Key Format
//!
//! ```text
//! APX-EEEEE-DDDDD-RRRRR-CCCCC
//! ```
//!
//! - `EEEEE`: edition letter followed by random padding
//! - `DDDDD`: `XXXXX` for any domain, or an HMAC token of the shop's domain
//! - `RRRRR`: random padding
//! - `CCCCC`: HMAC-SHA256 checksum of everything before it
//!
//! # Validation
//!
//! Keys are validated offline with a secret compiled into the binary. There
//! is no expiry and no revocation: a wildcard key stays valid everywhere, a
//! domain-locked key only on its domain (with or without `www.`).
//!
//! Failures never surface as `Err`. They are reported in the
//! [`ValidationResult`] and lookups fall back to the standard edition.
//!
//! # Usage
//!
//! ```rust,no_run
//! use apex_license::{Limit, load_validator};
//!
//! // Load the key from APEX_LICENSE_KEY or ~/.apex/license
//! let validator = load_validator(None, None, Some("shop.example.com"));
//!
//! if !validator.is_valid() {
//!     eprintln!("Invalid license, running with standard edition limits");
//! }
//!
//! if !validator.can_add_product(312) {
//!     println!(
//!         "Product limit reached ({} left)",
//!         validator.remaining(Limit::MaxProducts, 312)
//!     );
//! }
//! ```

mod catalog;
mod codec;
mod error;
mod keys;
mod storage;
mod types;
mod validator;

pub use catalog::{Edition, EditionFeatures, Feature, Limit, Quota, Remaining};
pub use codec::{KeyCodec, fold_checksum_char, fold_domain_byte, normalize_domain};
pub use error::{LicenseError, ValidationFailure};
pub use keys::{KEY_PREFIX, WILDCARD_DOMAIN};
pub use storage::{
    KeySource, LICENSE_ENV_VAR, LoadedKey, default_license_path, load_license_key,
    remove_license_key, save_license_key,
};
pub use types::{LicenseKey, ValidationResult};
pub use validator::LicenseValidator;

use std::path::{Path, PathBuf};

/// Build a validator from all key sources.
///
/// See [`load_license_key`] for the lookup order. No key means free tier.
pub fn load_validator(
    inline: Option<&str>,
    explicit_path: Option<&Path>,
    host: Option<&str>,
) -> LicenseValidator {
    let key = load_license_key(inline, explicit_path).map(|loaded| loaded.key);
    let validator = LicenseValidator::new(key);

    match host {
        Some(host) => validator.with_host(host),
        None => validator,
    }
}

/// Activate a license key.
///
/// Validates the key against `host` and saves it to the default location if
/// valid. Returns the validation result and where the key was written.
pub fn activate_license(
    key: &str,
    host: Option<&str>,
) -> Result<(ValidationResult, PathBuf), LicenseError> {
    let path = default_license_path();
    let result = activate_license_at(&path, key, host)?;
    Ok((result, path))
}

fn activate_license_at(
    path: &Path,
    key: &str,
    host: Option<&str>,
) -> Result<ValidationResult, LicenseError> {
    let result = LicenseValidator::default().validate_key_for_host(key, host);

    if let Some(failure) = result.failure.clone() {
        return Err(LicenseError::Rejected(failure));
    }

    // Store the canonical form so later reads need no normalization
    let canonical = result.key.as_deref().unwrap_or(key);
    storage::save_license_key_to(path, canonical)?;

    Ok(result)
}

/// Deactivate the current license.
///
/// Removes the saved license key. Returns whether a key file existed.
pub fn deactivate_license() -> Result<bool, LicenseError> {
    remove_license_key()
}
