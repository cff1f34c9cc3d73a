//! License key validation and edition lookups.
//!
//! A [`LicenseValidator`] owns the configured key, the host it serves and a
//! lazily populated cache of the validation result. Share one instance per
//! process (behind an `Arc`) instead of validating on every request.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::catalog::{Edition, EditionFeatures, Feature, Limit, Quota, Remaining};
use crate::codec::KeyCodec;
use crate::error::ValidationFailure;
use crate::types::{LicenseKey, ValidationResult};

/// Validates license keys and answers feature and limit questions.
///
/// # Example
///
/// ```
/// use apex_license::{Edition, Feature, LicenseValidator};
///
/// // No key configured: free tier
/// let validator = LicenseValidator::new(None);
/// assert!(validator.is_valid());
/// assert_eq!(validator.edition_code(), 'F');
/// assert!(!validator.has_feature(Feature::ApiAccess));
///
/// // Issue a key bound to a shop and validate it there
/// let key = validator.generate(Edition::Professional, Some("shop.example.com"));
/// let validator = LicenseValidator::new(Some(key.to_string())).with_host("www.shop.example.com");
/// assert!(validator.has_feature(Feature::ApiAccess));
/// ```
pub struct LicenseValidator {
    codec: KeyCodec,
    configured_key: Option<String>,
    host: Option<String>,
    cache: RwLock<Option<Arc<ValidationResult>>>,
}

impl std::fmt::Debug for LicenseValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseValidator")
            .field("has_key", &self.configured_key.is_some())
            .field("host", &self.host)
            .field("cached", &self.cache.read().is_some())
            .finish()
    }
}

impl Default for LicenseValidator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LicenseValidator {
    /// Create a validator for the given configured key.
    ///
    /// Blank keys are treated as absent.
    pub fn new(configured_key: Option<String>) -> Self {
        let configured_key = configured_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            codec: KeyCodec::default(),
            configured_key,
            host: None,
            cache: RwLock::new(None),
        }
    }

    /// Use a different codec (another product build's secret).
    pub fn with_codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self.cache = RwLock::new(None);
        self
    }

    /// Set the host name domain-locked keys are checked against.
    ///
    /// Stored trimmed; [`KeyCodec::domain_hash`] normalizes it at check time.
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        let host = host.as_ref().trim();
        self.host = (!host.is_empty()).then(|| host.to_string());
        self.cache = RwLock::new(None);
        self
    }

    /// The codec used for checksums and domain tokens.
    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// Configured host, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Validate the configured key, caching the result.
    ///
    /// Without a configured key this is the free tier, which is valid.
    pub fn validate(&self) -> Arc<ValidationResult> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Arc::clone(cached);
        }

        let mut cache = self.cache.write();
        // Another caller may have filled it between the two locks
        if let Some(cached) = cache.as_ref() {
            return Arc::clone(cached);
        }

        let result = match &self.configured_key {
            None => {
                info!("no license key configured, running free tier");
                ValidationResult::free_tier()
            }
            Some(key) => {
                let result = self.validate_key(key);
                if result.valid {
                    info!(
                        edition = result.edition_name(),
                        domain_locked = result.domain_locked,
                        "license key validated"
                    );
                } else {
                    warn!(
                        reason = result.reason_code().unwrap_or_default(),
                        "license key rejected, falling back to standard edition limits"
                    );
                }
                result
            }
        };

        let result = Arc::new(result);
        *cache = Some(Arc::clone(&result));
        result
    }

    /// Drop the cached result so the next [`validate`](Self::validate) recomputes it.
    pub fn clear_cache(&self) {
        *self.cache.write() = None;
    }

    /// Validate a key against the configured host.
    pub fn validate_key(&self, key: &str) -> ValidationResult {
        self.validate_key_for_host(key, self.host.as_deref())
    }

    /// Validate a key against an explicit host.
    ///
    /// Checks run in order and stop at the first failure: format, checksum,
    /// then domain binding. The checksum covers the domain token, so a key
    /// cannot be rebound to another domain without breaking it.
    pub fn validate_key_for_host(&self, key: &str, host: Option<&str>) -> ValidationResult {
        let key: LicenseKey = match key.parse() {
            Ok(key) => key,
            Err(failure) => {
                debug!(reason = failure.code(), "license key validation failed");
                return ValidationResult::invalid(failure);
            }
        };

        match self.check(&key, host) {
            Ok(()) => {
                if Edition::from_code(key.edition_code()).is_none() {
                    warn!(
                        code = %key.edition_code(),
                        "unknown edition code, using standard edition"
                    );
                }
                ValidationResult::licensed(&key)
            }
            Err(failure) => {
                debug!(reason = failure.code(), %key, "license key validation failed");
                ValidationResult::rejected(&key, failure)
            }
        }
    }

    fn check(&self, key: &LicenseKey, host: Option<&str>) -> Result<(), ValidationFailure> {
        if !self
            .codec
            .verify_checksum(key.signed_payload(), key.checksum())
        {
            return Err(ValidationFailure::InvalidChecksum);
        }

        if key.is_domain_locked() {
            let actual = match host {
                Some(host) => self.codec.domain_hash(host),
                None => {
                    warn!("domain-locked license key but no host configured");
                    String::new()
                }
            };
            if actual != key.domain_token() {
                return Err(ValidationFailure::DomainMismatch {
                    expected: key.domain_token().to_string(),
                    actual,
                });
            }
        }

        Ok(())
    }

    /// Issue a new key for `edition`, optionally bound to `domain`.
    pub fn generate(&self, edition: Edition, domain: Option<&str>) -> LicenseKey {
        self.generate_with_rng(edition, domain, &mut rand::rng())
    }

    /// Issue a new key using the given random source.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        edition: Edition,
        domain: Option<&str>,
        rng: &mut R,
    ) -> LicenseKey {
        let domain = domain.map(str::trim).filter(|d| !d.is_empty());
        self.codec.issue(edition, domain, rng)
    }

    /// Whether the configured key is usable (always true for the free tier).
    pub fn is_valid(&self) -> bool {
        self.validate().valid
    }

    /// Active edition code, `S` if validation produced none.
    pub fn edition_code(&self) -> char {
        self.validate().edition_code()
    }

    /// Active edition, standard if validation produced none.
    pub fn edition(&self) -> Edition {
        self.validate().edition()
    }

    /// Feature record for the active edition.
    pub fn features(&self) -> &'static EditionFeatures {
        self.validate().features()
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features().has(feature)
    }

    /// Look a feature up by name; unknown names are not granted.
    pub fn has_feature_named(&self, name: &str) -> bool {
        Feature::parse(name).is_some_and(|f| self.has_feature(f))
    }

    pub fn limit(&self, limit: Limit) -> Quota {
        self.features().limit(limit)
    }

    /// Look a limit up by name.
    pub fn limit_named(&self, name: &str) -> Option<Quota> {
        Limit::parse(name).map(|l| self.limit(l))
    }

    /// Whether one more item fits when `current` are in use.
    pub fn within_limit(&self, limit: Limit, current: u64) -> bool {
        self.limit(limit).allows(current)
    }

    pub fn can_add_product(&self, current: u64) -> bool {
        self.within_limit(Limit::MaxProducts, current)
    }

    pub fn can_add_admin_user(&self, current: u64) -> bool {
        self.within_limit(Limit::MaxAdminUsers, current)
    }

    /// Remaining capacity under `limit`.
    pub fn remaining(&self, limit: Limit, current: u64) -> Remaining {
        self.limit(limit).remaining(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const WILDCARD_PRO: &str = "APX-PH7KQ-XXXXX-M4ZT8-7F7D7";
    const EXAMPLE_COM_ENTERPRISE: &str = "APX-EA2B3-9CA3G-ZZ9Y8-D6666";
    const UNKNOWN_EDITION: &str = "APX-QW3RT-XXXXX-K8J7H-A457C";

    #[test]
    fn test_known_wildcard_key() {
        let validator = LicenseValidator::default();
        let result = validator.validate_key(WILDCARD_PRO);

        assert!(result.valid, "{:?}", result);
        assert_eq!(result.edition, Some(Edition::Professional));
        assert_eq!(result.edition_code, Some('P'));
        assert!(!result.domain_locked);
        assert_eq!(result.key.as_deref(), Some(WILDCARD_PRO));
        assert!(!result.free_tier);
    }

    #[test]
    fn test_lowercase_input_accepted() {
        let validator = LicenseValidator::default();
        let result = validator.validate_key(" apx-ph7kq-xxxxx-m4zt8-7f7d7 ");
        assert!(result.valid);
        assert_eq!(result.key.as_deref(), Some(WILDCARD_PRO));
    }

    #[test]
    fn test_known_domain_key() {
        let validator = LicenseValidator::default();

        let ok = validator.validate_key_for_host(EXAMPLE_COM_ENTERPRISE, Some("www.example.com"));
        assert!(ok.valid);
        assert!(ok.domain_locked);
        assert_eq!(ok.edition, Some(Edition::Enterprise));

        let other = validator.validate_key_for_host(EXAMPLE_COM_ENTERPRISE, Some("other.com"));
        assert_eq!(
            other.failure,
            Some(ValidationFailure::DomainMismatch {
                expected: "9CA3G".to_string(),
                actual: "1G133".to_string(),
            })
        );
    }

    #[test]
    fn test_domain_key_without_host() {
        let validator = LicenseValidator::default();
        let result = validator.validate_key(EXAMPLE_COM_ENTERPRISE);
        assert_eq!(result.reason_code(), Some("DOMAIN_MISMATCH"));
    }

    #[test]
    fn test_checksum_checked_before_domain() {
        // Rebinding the domain token breaks the checksum
        let validator = LicenseValidator::default().with_host("other.com");
        let rebound = EXAMPLE_COM_ENTERPRISE.replace("9CA3G", "1G133");
        let result = validator.validate_key(&rebound);
        assert_eq!(result.failure, Some(ValidationFailure::InvalidChecksum));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let validator = LicenseValidator::default().with_codec(KeyCodec::new("another-build"));
        let result = validator.validate_key(WILDCARD_PRO);
        assert_eq!(result.failure, Some(ValidationFailure::InvalidChecksum));
    }

    #[test]
    fn test_unknown_edition_is_lenient() {
        let validator = LicenseValidator::new(Some(UNKNOWN_EDITION.to_string()));
        let result = validator.validate();
        assert!(result.valid);
        assert_eq!(result.edition_code, Some('Q'));
        assert_eq!(result.edition_name(), "standard");
        assert_eq!(validator.features(), Edition::Standard.features());
    }

    #[test]
    fn test_no_key_is_free_tier() {
        let validator = LicenseValidator::new(None);
        let result = validator.validate();
        assert!(result.valid);
        assert!(result.free_tier);
        assert_eq!(validator.edition_code(), 'F');
        assert_eq!(validator.features(), Edition::Free.features());
    }

    #[test]
    fn test_blank_key_is_free_tier() {
        let validator = LicenseValidator::new(Some("   ".to_string()));
        assert!(validator.validate().free_tier);
    }

    #[test]
    fn test_invalid_key_uses_standard_limits() {
        let validator = LicenseValidator::new(Some("garbage".to_string()));
        assert!(!validator.is_valid());
        assert_eq!(validator.edition_code(), 'S');
        assert_eq!(validator.limit(Limit::MaxProducts), Quota::Max(500));
    }

    #[test]
    fn test_validate_is_cached() {
        let validator = LicenseValidator::new(Some(WILDCARD_PRO.to_string()));
        let first = validator.validate();
        let second = validator.validate();
        assert!(Arc::ptr_eq(&first, &second));

        validator.clear_cache();
        let third = validator.validate();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_concurrent_validate_shares_result() {
        let validator = Arc::new(LicenseValidator::new(Some(WILDCARD_PRO.to_string())));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let validator = Arc::clone(&validator);
                std::thread::spawn(move || validator.validate())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
    }

    #[test]
    fn test_limits_and_remaining() {
        let validator = LicenseValidator::new(None);
        assert!(validator.can_add_product(24));
        assert!(!validator.can_add_product(25));
        assert!(!validator.can_add_admin_user(1));
        assert_eq!(validator.remaining(Limit::MaxProducts, 20), Remaining::Count(5));
        assert_eq!(validator.remaining(Limit::MaxProducts, 99), Remaining::Count(0));

        let pro = LicenseValidator::new(Some(WILDCARD_PRO.to_string()));
        assert_eq!(
            pro.remaining(Limit::MaxOrdersPerMonth, 1_000_000),
            Remaining::Unlimited
        );
    }

    #[test]
    fn test_named_lookups() {
        let pro = LicenseValidator::new(Some(WILDCARD_PRO.to_string()));
        assert!(pro.has_feature_named("api_access"));
        assert!(!pro.has_feature_named("white_label"));
        assert!(!pro.has_feature_named("time_travel"));
        assert_eq!(pro.limit_named("max_admin_users"), Some(Quota::Max(10)));
        assert_eq!(pro.limit_named("max_warehouses"), None);
    }

    #[test]
    fn test_generate_round_trip() {
        let validator = LicenseValidator::default().with_host("shop.example.com");
        let mut rng = StdRng::seed_from_u64(42);

        for edition in Edition::ALL {
            let key = validator.generate_with_rng(edition, Some("shop.example.com"), &mut rng);
            let result = validator.validate_key(key.as_str());
            assert!(result.valid, "{key}: {:?}", result.failure);
            assert_eq!(result.edition, Some(edition));
            assert!(result.domain_locked);
        }
    }

    #[test]
    fn test_generate_blank_domain_is_wildcard() {
        let validator = LicenseValidator::default();
        let key = validator.generate(Edition::Developer, Some("  "));
        assert!(!key.is_domain_locked());
    }

    #[test]
    fn test_with_host_matches_normalized_domain() {
        let validator = LicenseValidator::default().with_host("  WWW.Example.com ");
        assert_eq!(validator.host(), Some("WWW.Example.com"));
        assert!(validator.validate_key(EXAMPLE_COM_ENTERPRISE).valid);
    }

    #[test]
    fn test_with_host_normalizes_once() {
        let validator = LicenseValidator::default();
        let key = validator.generate(Edition::Professional, Some("www.www.example.com"));

        let cached = LicenseValidator::new(Some(key.to_string())).with_host("www.www.example.com");
        assert!(cached.validate().valid);
        assert!(
            validator
                .validate_key_for_host(key.as_str(), Some("www.www.example.com"))
                .valid
        );

        // One leading www. is stripped, not two
        let stripped = LicenseValidator::new(Some(key.to_string())).with_host("example.com");
        assert_eq!(stripped.validate().reason_code(), Some("DOMAIN_MISMATCH"));
    }

    #[test]
    fn test_rejected_result_echoes_key() {
        let validator = LicenseValidator::default().with_host("other.com");
        let result = validator.validate_key(&EXAMPLE_COM_ENTERPRISE.to_lowercase());
        assert_eq!(result.reason_code(), Some("DOMAIN_MISMATCH"));
        assert_eq!(result.key.as_deref(), Some(EXAMPLE_COM_ENTERPRISE));
        assert!(result.domain_locked);

        let result = validator.validate_key("APX-1234-ABCDE-FGHIJ-KLMNO");
        assert_eq!(result.key, None);
    }
}
