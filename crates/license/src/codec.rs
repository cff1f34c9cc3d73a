//! Checksum and domain-hash codec.
//!
//! Both digests are HMAC-SHA256 folded down to five key characters. The
//! folding functions are kept separate from the HMAC calls so they can be
//! checked on their own: any change to them invalidates every issued key.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::catalog::Edition;
use crate::keys::{DOMAIN_SALT, GROUP_LEN, KEY_PREFIX, SAFE_ALPHABET, WILDCARD_DOMAIN, secret_bytes};
use crate::types::LicenseKey;

type HmacSha256 = Hmac<Sha256>;

/// Keyed codec for checksums and domain tokens.
#[derive(Clone)]
pub struct KeyCodec {
    secret: Vec<u8>,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(secret_bytes())
    }
}

impl KeyCodec {
    /// Create a codec keyed with the given secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Checksum group for `data` (normally `APX-<g1>-<g2>-<g3>`).
    ///
    /// Uses the first character of each of the first five hex pairs of the
    /// digest, passed through [`fold_checksum_char`].
    pub fn checksum(&self, data: &str) -> String {
        let digest = hex::encode(hmac_sha256(&self.secret, data.as_bytes()));
        digest
            .as_bytes()
            .chunks(2)
            .take(GROUP_LEN)
            .map(|pair| fold_checksum_char(pair[0] as char))
            .collect()
    }

    /// Check a checksum group in constant time.
    pub fn verify_checksum(&self, data: &str, checksum: &str) -> bool {
        let expected = self.checksum(data);
        expected.as_bytes().ct_eq(checksum.as_bytes()).into()
    }

    /// Domain token for `domain`.
    ///
    /// The domain is normalized first, so `www.Example.com` and `example.com`
    /// share a token.
    pub fn domain_hash(&self, domain: &str) -> String {
        let mut key = Vec::with_capacity(self.secret.len() + DOMAIN_SALT.len());
        key.extend_from_slice(&self.secret);
        key.extend_from_slice(DOMAIN_SALT);

        let normalized = normalize_domain(domain);
        hmac_sha256(&key, normalized.as_bytes())
            .iter()
            .take(GROUP_LEN)
            .map(|&b| fold_domain_byte(b))
            .collect()
    }

    /// Issue a new key.
    ///
    /// `domain = None` produces a wildcard key valid on any host.
    pub fn issue<R: Rng + ?Sized>(
        &self,
        edition: Edition,
        domain: Option<&str>,
        rng: &mut R,
    ) -> LicenseKey {
        let edition_group = format!("{}{}", edition.code(), random_group(rng, GROUP_LEN - 1));
        let domain_group = match domain {
            Some(domain) => self.domain_hash(domain),
            None => WILDCARD_DOMAIN.to_string(),
        };
        let padding_group = random_group(rng, GROUP_LEN);

        let payload = format!("{KEY_PREFIX}-{edition_group}-{domain_group}-{padding_group}");
        let checksum = self.checksum(&payload);

        LicenseKey::from_canonical(format!("{payload}-{checksum}"))
    }
}

impl std::fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCodec")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Normalize a host name for domain binding.
///
/// Trims, lowercases and strips one leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().to_ascii_lowercase();
    match domain.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => domain,
    }
}

/// Map one digest hex character to a checksum character.
///
/// Alphanumeric characters are uppercased and kept; anything else folds
/// into `A..=Z` by its code point modulo 26.
pub fn fold_checksum_char(c: char) -> char {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
        upper
    } else {
        (b'A' + (u32::from(c) % 26) as u8) as char
    }
}

/// Map one digest byte to a domain-token character.
///
/// Even bytes become letters, odd bytes become digits.
pub fn fold_domain_byte(b: u8) -> char {
    if b % 2 == 0 {
        (b'A' + b % 26) as char
    } else {
        (b'0' + b % 10) as char
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);

    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn random_group<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| SAFE_ALPHABET[rng.random_range(0..SAFE_ALPHABET.len())] as char)
        .collect()
}
