//! Editions and the features and limits each one grants.
//!
//! The catalog is static: every [`Edition`] maps to exactly one
//! [`EditionFeatures`] record, and unknown edition codes resolve to
//! [`Edition::Standard`].

use serde::{Deserialize, Serialize, Serializer};

/// Product editions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// No key configured
    Free,

    /// Fallback for unknown or missing edition data
    #[default]
    Standard,

    Professional,

    Enterprise,

    /// Development and staging installs
    Developer,

    Unlimited,
}

impl Edition {
    /// All editions, in catalog order.
    pub const ALL: [Edition; 6] = [
        Self::Free,
        Self::Standard,
        Self::Professional,
        Self::Enterprise,
        Self::Developer,
        Self::Unlimited,
    ];

    /// Single-letter code carried in the first key group.
    pub fn code(&self) -> char {
        match self {
            Self::Free => 'F',
            Self::Standard => 'S',
            Self::Professional => 'P',
            Self::Enterprise => 'E',
            Self::Developer => 'D',
            Self::Unlimited => 'U',
        }
    }

    /// Look up an edition by its code (case-insensitive).
    pub fn from_code(code: char) -> Option<Self> {
        let code = code.to_ascii_uppercase();
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Look up an edition by code, falling back to standard.
    pub fn from_code_or_default(code: char) -> Self {
        Self::from_code(code).unwrap_or_default()
    }

    /// Lowercase edition name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
            Self::Developer => "developer",
            Self::Unlimited => "unlimited",
        }
    }

    /// Get display name for the edition.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Apex Free",
            Self::Standard => "Apex Standard",
            Self::Professional => "Apex Professional",
            Self::Enterprise => "Apex Enterprise",
            Self::Developer => "Apex Developer",
            Self::Unlimited => "Apex Unlimited",
        }
    }

    /// Parse edition from a name or single-letter code.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            return Self::from_code(code);
        }

        let s = s.to_ascii_lowercase();
        Self::ALL.into_iter().find(|e| e.name() == s)
    }

    /// Features and limits granted by this edition.
    pub fn features(&self) -> &'static EditionFeatures {
        match self {
            Self::Free => &FREE,
            Self::Standard => &STANDARD,
            Self::Professional => &PROFESSIONAL,
            Self::Enterprise => &ENTERPRISE,
            Self::Developer => &DEVELOPER,
            Self::Unlimited => &UNLIMITED,
        }
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A numeric limit: a cap or unlimited.
///
/// Serializes as an integer with `-1` meaning unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Quota {
    Unlimited,
    Max(u32),
}

impl Quota {
    /// Integer form, `-1` for unlimited.
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Unlimited => -1,
            Self::Max(n) => i64::from(*n),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Whether one more item fits when `current` are already in use.
    pub fn allows(&self, current: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Max(max) => current < u64::from(*max),
        }
    }

    /// Remaining capacity when `current` are in use, never negative.
    pub fn remaining(&self, current: u64) -> Remaining {
        match self {
            Self::Unlimited => Remaining::Unlimited,
            Self::Max(max) => {
                let left = u64::from(*max).saturating_sub(current);
                // left <= max, so it fits back into u32
                Remaining::Count(left as u32)
            }
        }
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> Self {
        quota.as_i64()
    }
}

impl TryFrom<i64> for Quota {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unlimited),
            n => u32::try_from(n)
                .map(Self::Max)
                .map_err(|_| format!("invalid quota {n}: expected -1 or 0..={}", u32::MAX)),
        }
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Max(n) => write!(f, "{n}"),
        }
    }
}

/// Remaining capacity under a [`Quota`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unlimited,
    Count(u32),
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unlimited => serializer.serialize_str("unlimited"),
            Self::Count(n) => serializer.serialize_u32(*n),
        }
    }
}

/// Numeric limits enforced by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    MaxProducts,
    MaxAdminUsers,
    MaxOrdersPerMonth,
}

impl Limit {
    pub const ALL: [Limit; 3] = [Self::MaxProducts, Self::MaxAdminUsers, Self::MaxOrdersPerMonth];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxProducts => "max_products",
            Self::MaxAdminUsers => "max_admin_users",
            Self::MaxOrdersPerMonth => "max_orders_per_month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.name() == s)
    }
}

/// Boolean capabilities gated by edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ApiAccess,
    AdvancedAnalytics,
    BulkImportExport,
    AbandonedCartRecovery,
    MultiCurrency,
    PrioritySupport,
    CustomTheming,
    Coupons,
    Newsletter,
    /// Hide "powered by" branding
    WhiteLabel,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Self::ApiAccess,
        Self::AdvancedAnalytics,
        Self::BulkImportExport,
        Self::AbandonedCartRecovery,
        Self::MultiCurrency,
        Self::PrioritySupport,
        Self::CustomTheming,
        Self::Coupons,
        Self::Newsletter,
        Self::WhiteLabel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiAccess => "api_access",
            Self::AdvancedAnalytics => "advanced_analytics",
            Self::BulkImportExport => "bulk_import_export",
            Self::AbandonedCartRecovery => "abandoned_cart_recovery",
            Self::MultiCurrency => "multi_currency",
            Self::PrioritySupport => "priority_support",
            Self::CustomTheming => "custom_theming",
            Self::Coupons => "coupons",
            Self::Newsletter => "newsletter",
            Self::WhiteLabel => "white_label",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == s)
    }
}

/// Features and limits for one edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditionFeatures {
    pub max_products: Quota,
    pub max_admin_users: Quota,
    pub max_orders_per_month: Quota,
    pub api_access: bool,
    pub advanced_analytics: bool,
    pub bulk_import_export: bool,
    pub abandoned_cart_recovery: bool,
    pub multi_currency: bool,
    pub priority_support: bool,
    pub custom_theming: bool,
    pub coupons: bool,
    pub newsletter: bool,
    pub white_label: bool,
}

impl EditionFeatures {
    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::ApiAccess => self.api_access,
            Feature::AdvancedAnalytics => self.advanced_analytics,
            Feature::BulkImportExport => self.bulk_import_export,
            Feature::AbandonedCartRecovery => self.abandoned_cart_recovery,
            Feature::MultiCurrency => self.multi_currency,
            Feature::PrioritySupport => self.priority_support,
            Feature::CustomTheming => self.custom_theming,
            Feature::Coupons => self.coupons,
            Feature::Newsletter => self.newsletter,
            Feature::WhiteLabel => self.white_label,
        }
    }

    pub fn limit(&self, limit: Limit) -> Quota {
        match limit {
            Limit::MaxProducts => self.max_products,
            Limit::MaxAdminUsers => self.max_admin_users,
            Limit::MaxOrdersPerMonth => self.max_orders_per_month,
        }
    }
}

const FREE: EditionFeatures = EditionFeatures {
    max_products: Quota::Max(25),
    max_admin_users: Quota::Max(1),
    max_orders_per_month: Quota::Max(100),
    api_access: false,
    advanced_analytics: false,
    bulk_import_export: false,
    abandoned_cart_recovery: false,
    multi_currency: false,
    priority_support: false,
    custom_theming: false,
    coupons: true,
    newsletter: false,
    white_label: false,
};

const STANDARD: EditionFeatures = EditionFeatures {
    max_products: Quota::Max(500),
    max_admin_users: Quota::Max(3),
    max_orders_per_month: Quota::Max(2_000),
    api_access: false,
    advanced_analytics: false,
    bulk_import_export: true,
    abandoned_cart_recovery: false,
    multi_currency: false,
    priority_support: false,
    custom_theming: true,
    coupons: true,
    newsletter: true,
    white_label: false,
};

const PROFESSIONAL: EditionFeatures = EditionFeatures {
    max_products: Quota::Max(5_000),
    max_admin_users: Quota::Max(10),
    max_orders_per_month: Quota::Unlimited,
    api_access: true,
    advanced_analytics: true,
    bulk_import_export: true,
    abandoned_cart_recovery: true,
    multi_currency: true,
    priority_support: false,
    custom_theming: true,
    coupons: true,
    newsletter: true,
    white_label: false,
};

const ENTERPRISE: EditionFeatures = EditionFeatures {
    max_products: Quota::Unlimited,
    max_admin_users: Quota::Unlimited,
    max_orders_per_month: Quota::Unlimited,
    api_access: true,
    advanced_analytics: true,
    bulk_import_export: true,
    abandoned_cart_recovery: true,
    multi_currency: true,
    priority_support: true,
    custom_theming: true,
    coupons: true,
    newsletter: true,
    white_label: true,
};

const DEVELOPER: EditionFeatures = EditionFeatures {
    priority_support: false,
    ..ENTERPRISE
};

const UNLIMITED: EditionFeatures = ENTERPRISE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_unique_and_round_trip() {
        for edition in Edition::ALL {
            assert_eq!(Edition::from_code(edition.code()), Some(edition));
            assert_eq!(Edition::from_code(edition.code().to_ascii_lowercase()), Some(edition));
        }
        let codes: std::collections::HashSet<char> = Edition::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), Edition::ALL.len());
    }

    #[test]
    fn test_unknown_code_defaults_to_standard() {
        assert_eq!(Edition::from_code('Q'), None);
        assert_eq!(Edition::from_code_or_default('Q'), Edition::Standard);
        assert_eq!(Edition::from_code_or_default('P'), Edition::Professional);
    }

    #[test]
    fn test_parse_name_or_code() {
        assert_eq!(Edition::parse("enterprise"), Some(Edition::Enterprise));
        assert_eq!(Edition::parse("Developer"), Some(Edition::Developer));
        assert_eq!(Edition::parse("u"), Some(Edition::Unlimited));
        assert_eq!(Edition::parse("platinum"), None);
        assert_eq!(Edition::parse(""), None);
    }

    #[test]
    fn test_edition_display() {
        assert_eq!(Edition::Free.display_name(), "Apex Free");
        assert_eq!(Edition::Professional.to_string(), "Apex Professional");
    }

    #[test]
    fn test_free_record() {
        let free = Edition::Free.features();
        assert_eq!(free.max_products, Quota::Max(25));
        assert_eq!(free.max_admin_users, Quota::Max(1));
        assert!(free.coupons);
        assert!(!free.api_access);
        assert!(!free.white_label);
    }

    #[test]
    fn test_top_editions_unlimited() {
        for edition in [Edition::Enterprise, Edition::Developer, Edition::Unlimited] {
            for limit in Limit::ALL {
                assert!(edition.features().limit(limit).is_unlimited());
            }
        }
        assert!(!Edition::Developer.features().priority_support);
        assert!(Edition::Unlimited.features().priority_support);
        assert_eq!(Edition::Unlimited.features(), Edition::Enterprise.features());
    }

    #[test]
    fn test_quota_allows() {
        assert!(Quota::Max(3).allows(2));
        assert!(!Quota::Max(3).allows(3));
        assert!(!Quota::Max(0).allows(0));
        assert!(Quota::Unlimited.allows(u64::MAX));
    }

    #[test]
    fn test_quota_remaining() {
        assert_eq!(Quota::Max(10).remaining(4), Remaining::Count(6));
        assert_eq!(Quota::Max(10).remaining(40), Remaining::Count(0));
        assert_eq!(Quota::Unlimited.remaining(40), Remaining::Unlimited);
        assert_eq!(Remaining::Unlimited.to_string(), "unlimited");
    }

    #[test]
    fn test_quota_serde() {
        assert_eq!(serde_json::to_string(&Quota::Unlimited).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Quota::Max(500)).unwrap(), "500");
        assert_eq!(serde_json::from_str::<Quota>("-1").unwrap(), Quota::Unlimited);
        assert!(serde_json::from_str::<Quota>("-7").is_err());
    }

    #[test]
    fn test_remaining_serializes() {
        assert_eq!(serde_json::to_string(&Remaining::Unlimited).unwrap(), r#""unlimited""#);
        assert_eq!(serde_json::to_string(&Remaining::Count(3)).unwrap(), "3");
    }

    #[test]
    fn test_feature_and_limit_names() {
        for feature in Feature::ALL {
            assert_eq!(Feature::parse(feature.name()), Some(feature));
        }
        for limit in Limit::ALL {
            assert_eq!(Limit::parse(limit.name()), Some(limit));
        }
        assert_eq!(Feature::parse("teleportation"), None);
        assert_eq!(Limit::parse("max_warehouses"), None);
    }

    #[test]
    fn test_record_lookup_matches_fields() {
        let pro = Edition::Professional.features();
        assert!(pro.has(Feature::ApiAccess));
        assert!(!pro.has(Feature::WhiteLabel));
        assert_eq!(pro.limit(Limit::MaxProducts), Quota::Max(5_000));
        assert_eq!(pro.limit(Limit::MaxOrdersPerMonth), Quota::Unlimited);
    }
}
