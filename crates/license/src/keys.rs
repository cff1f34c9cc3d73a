//! Embedded key material and key format constants.
//!
//! The shared secret is compiled into every build. Keys issued by one build
//! only validate on builds carrying the same secret, so changing any constant
//! here invalidates every key already in circulation.

/// Product prefix, the first group of every key.
pub const KEY_PREFIX: &str = "APX";

/// Width of each of the four groups following the prefix.
pub const GROUP_LEN: usize = 5;

/// Number of groups following the prefix.
pub const GROUP_COUNT: usize = 4;

/// Total length of a canonical key: `APX` plus four `-XXXXX` groups.
pub const KEY_LEN: usize = KEY_PREFIX.len() + GROUP_COUNT * (GROUP_LEN + 1);

/// Domain token meaning "valid on any host".
pub const WILDCARD_DOMAIN: &str = "XXXXX";

/// Alphabet for random padding.
///
/// Excludes `I`, `O`, `0` and `1` so keys survive being read aloud or retyped.
pub const SAFE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Shared HMAC secret for checksums and domain hashes.
///
/// IMPORTANT: Rotating this secret requires reissuing every key.
pub const LICENSE_SECRET: &[u8] = b"apx.commerce/license:4b7e91c2d05f3a68";

/// Salt appended to the secret when hashing domains.
///
/// Keeps domain tokens and checksums from being computed with the same key.
pub const DOMAIN_SALT: &[u8] = b":domain-binding";

/// Get the embedded secret.
pub fn secret_bytes() -> &'static [u8] {
    LICENSE_SECRET
}
