//! License key and validation result types.

use std::str::FromStr;

use serde::Serialize;

use crate::catalog::{Edition, EditionFeatures};
use crate::error::ValidationFailure;
use crate::keys::{GROUP_COUNT, GROUP_LEN, KEY_LEN, KEY_PREFIX, WILDCARD_DOMAIN};

/// A structurally valid license key in canonical (uppercase) form.
///
/// ```text
/// APX-EEEEE-DDDDD-RRRRR-CCCCC
///     |     |     |     checksum
///     |     |     random padding
///     |     domain token (or XXXXX)
///     edition letter + padding
/// ```
///
/// Parsing only checks the shape. Checksum and domain binding are checked by
/// [`LicenseValidator`](crate::LicenseValidator).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LicenseKey {
    raw: String,
}

impl LicenseKey {
    /// Wrap a string already known to be canonical.
    pub(crate) fn from_canonical(raw: String) -> Self {
        debug_assert!(is_well_formed(&raw), "not a canonical key: {raw}");
        Self { raw }
    }

    /// Group `index` (0-based) after the prefix.
    fn group(&self, index: usize) -> &str {
        let start = KEY_PREFIX.len() + 1 + index * (GROUP_LEN + 1);
        &self.raw[start..start + GROUP_LEN]
    }

    /// Canonical key text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Edition letter (may be a code outside the catalog).
    pub fn edition_code(&self) -> char {
        self.raw.as_bytes()[KEY_PREFIX.len() + 1] as char
    }

    /// Domain token: [`WILDCARD_DOMAIN`] or a domain hash.
    pub fn domain_token(&self) -> &str {
        self.group(1)
    }

    /// Random padding group.
    pub fn padding(&self) -> &str {
        self.group(2)
    }

    /// Checksum group.
    pub fn checksum(&self) -> &str {
        self.group(3)
    }

    /// Everything the checksum covers: `APX-<g1>-<g2>-<g3>`.
    pub fn signed_payload(&self) -> &str {
        &self.raw[..KEY_LEN - GROUP_LEN - 1]
    }

    /// Whether the key is bound to one domain.
    pub fn is_domain_locked(&self) -> bool {
        self.domain_token() != WILDCARD_DOMAIN
    }
}

impl FromStr for LicenseKey {
    type Err = ValidationFailure;

    /// Canonicalize (trim, uppercase) and check the grouped shape.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_ascii_uppercase();
        if !is_well_formed(&canonical) {
            return Err(ValidationFailure::InvalidFormat);
        }
        Ok(Self { raw: canonical })
    }
}

impl std::fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_well_formed(key: &str) -> bool {
    if key.len() != KEY_LEN {
        return false;
    }
    let Some(rest) = key.strip_prefix(KEY_PREFIX) else {
        return false;
    };

    let groups: Vec<&str> = rest.split('-').collect();
    groups.len() == GROUP_COUNT + 1
        && groups[0].is_empty()
        && groups[1..].iter().all(|g| {
            g.len() == GROUP_LEN
                && g.bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
}

/// Outcome of validating a key (or of having none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether the key may be trusted
    pub valid: bool,

    /// Resolved edition (`None` when invalid)
    pub edition: Option<Edition>,

    /// Edition letter as found in the key (`None` when invalid)
    pub edition_code: Option<char>,

    /// Whether the key is bound to a domain
    pub domain_locked: bool,

    /// Canonical key text, if one was supplied and well-formed
    pub key: Option<String>,

    /// Set only when no key is configured
    pub free_tier: bool,

    /// Why validation failed
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ValidationFailure>,
}

impl ValidationResult {
    /// Result for a deployment without a key.
    pub fn free_tier() -> Self {
        Self {
            valid: true,
            edition: Some(Edition::Free),
            edition_code: Some(Edition::Free.code()),
            domain_locked: false,
            key: None,
            free_tier: true,
            failure: None,
        }
    }

    /// Result for a key that passed every check.
    pub fn licensed(key: &LicenseKey) -> Self {
        let code = key.edition_code();
        Self {
            valid: true,
            edition: Some(Edition::from_code_or_default(code)),
            edition_code: Some(code),
            domain_locked: key.is_domain_locked(),
            key: Some(key.to_string()),
            free_tier: false,
            failure: None,
        }
    }

    /// Result for a key that parsed but failed a later check.
    pub fn rejected(key: &LicenseKey, failure: ValidationFailure) -> Self {
        Self {
            domain_locked: key.is_domain_locked(),
            key: Some(key.to_string()),
            ..Self::invalid(failure)
        }
    }

    /// Result for a rejected key.
    pub fn invalid(failure: ValidationFailure) -> Self {
        Self {
            valid: false,
            edition: None,
            edition_code: None,
            domain_locked: false,
            key: None,
            free_tier: false,
            failure: Some(failure),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Edition letter, `S` when unavailable.
    pub fn edition_code(&self) -> char {
        self.edition_code.unwrap_or(Edition::Standard.code())
    }

    /// Effective edition, standard when unavailable.
    pub fn edition(&self) -> Edition {
        self.edition.unwrap_or_default()
    }

    /// Edition name, `standard` when unavailable.
    pub fn edition_name(&self) -> &'static str {
        self.edition().name()
    }

    /// Feature record for the effective edition.
    pub fn features(&self) -> &'static EditionFeatures {
        Edition::from_code_or_default(self.edition_code()).features()
    }

    /// Machine-readable failure code.
    pub fn reason_code(&self) -> Option<&'static str> {
        self.failure.as_ref().map(ValidationFailure::code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WILDCARD_PRO: &str = "APX-PH7KQ-XXXXX-M4ZT8-7F7D7";

    #[test]
    fn test_parse_canonicalizes() {
        let key: LicenseKey = "  apx-ph7kq-xxxxx-m4zt8-7f7d7\n".parse().unwrap();
        assert_eq!(key.as_str(), WILDCARD_PRO);
        assert_eq!(key.to_string(), WILDCARD_PRO);
    }

    #[test]
    fn test_groups() {
        let key: LicenseKey = WILDCARD_PRO.parse().unwrap();
        assert_eq!(key.edition_code(), 'P');
        assert_eq!(key.domain_token(), "XXXXX");
        assert_eq!(key.padding(), "M4ZT8");
        assert_eq!(key.checksum(), "7F7D7");
        assert_eq!(key.signed_payload(), "APX-PH7KQ-XXXXX-M4ZT8");
        assert!(!key.is_domain_locked());
    }

    #[test]
    fn test_rejects_malformed() {
        for input in [
            "",
            "garbage",
            "APX-1234-56789-ABCDE-FGHIJ",
            "XYZ-AAAAA-AAAAA-AAAAA-AAAAA",
            "APX-AAAAA-AAAAA-AAAAA",
            "APX-AAAAA-AAAAA-AAAAA-AAAAA-AAAAA",
            "APX-AAAA_-AAAAA-AAAAA-AAAAA",
            "APXAAAAAA-AAAAA-AAAAA-AAAAA",
            "APX-AAAAA-AAAAA-AAAAA-AAAAÄ",
        ] {
            let result: Result<LicenseKey, _> = input.parse();
            assert_eq!(result, Err(ValidationFailure::InvalidFormat), "{input:?}");
        }
    }

    #[test]
    fn test_domain_locked_key() {
        let key: LicenseKey = "APX-EA2B3-9CA3G-ZZ9Y8-D6666".parse().unwrap();
        assert!(key.is_domain_locked());
        assert_eq!(key.domain_token(), "9CA3G");
    }

    #[test]
    fn test_free_tier_result() {
        let result = ValidationResult::free_tier();
        assert!(result.is_valid());
        assert!(result.free_tier);
        assert_eq!(result.edition_code(), 'F');
        assert_eq!(result.edition_name(), "free");
        assert!(!result.domain_locked);
        assert_eq!(result.features(), Edition::Free.features());
    }

    #[test]
    fn test_invalid_result_defaults_to_standard() {
        let result = ValidationResult::invalid(ValidationFailure::InvalidChecksum);
        assert!(!result.is_valid());
        assert_eq!(result.edition_code(), 'S');
        assert_eq!(result.edition_name(), "standard");
        assert_eq!(result.reason_code(), Some("INVALID_CHECKSUM"));
        assert_eq!(result.features(), Edition::Standard.features());
    }

    #[test]
    fn test_rejected_keeps_canonical_key() {
        let key: LicenseKey = "apx-ea2b3-9ca3g-zz9y8-aaaaa".parse().unwrap();
        let result = ValidationResult::rejected(&key, ValidationFailure::InvalidChecksum);
        assert!(!result.is_valid());
        assert_eq!(result.key.as_deref(), Some("APX-EA2B3-9CA3G-ZZ9Y8-AAAAA"));
        assert!(result.domain_locked);
        assert_eq!(result.edition, None);
        assert_eq!(result.edition_name(), "standard");
    }

    #[test]
    fn test_licensed_unknown_code() {
        let key: LicenseKey = "APX-QW3RT-XXXXX-K8J7H-A457C".parse().unwrap();
        let result = ValidationResult::licensed(&key);
        assert_eq!(result.edition_code(), 'Q');
        assert_eq!(result.edition(), Edition::Standard);
        assert_eq!(result.features(), Edition::Standard.features());
    }

    #[test]
    fn test_result_json() {
        let json = serde_json::to_value(ValidationResult::invalid(
            ValidationFailure::InvalidFormat,
        ))
        .unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "INVALID_FORMAT");

        let json = serde_json::to_value(ValidationResult::free_tier()).unwrap();
        assert_eq!(json["edition"], "free");
        assert_eq!(json["edition_code"], "F");
        assert!(json.get("reason").is_none());
    }
}
