use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{decode_secret, KeyBytes, OtpCode, OtpError};

type HmacSha1 = Hmac<Sha1>;

/// Size of an HMAC-SHA1 digest.
pub const DIGEST_LEN: usize = 20;

/// The [HMAC-based One-time Password Algorithm](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
/// (HOTP) over an already decoded key.
///
/// This is the building block of [`crate::Totp`]; counters are supplied
/// by the caller and never tracked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotp {
    key: KeyBytes,
}

impl Hotp {
    pub fn new(key: KeyBytes) -> Self {
        Self { key }
    }

    /// Creates the generator from an RFC4648 base32 encoded secret
    pub fn from_secret(secret: &str) -> Result<Self, OtpError> {
        decode_secret(secret).map(Self::new)
    }

    pub fn key(&self) -> &KeyBytes {
        &self.key
    }

    /// Generates the 6-digit code for the provided counter
    pub fn generate(&self, counter: u64) -> OtpCode {
        hotp(&self.key, counter)
    }
}

/// Computes the HOTP code of `key` at `counter` (RFC 4226 section 5.3).
pub fn hotp(key: &KeyBytes, counter: u64) -> OtpCode {
    let digest = calc_digest(key, counter);

    OtpCode::from_truncated(encode_digest_truncated(&digest))
}

/// Calculates HMAC-SHA1 of the big-endian counter.
///
/// # Panics
/// If the HMAC context cannot be constructed, which HMAC rules out for
/// keys of any length.
pub fn calc_digest(key: &KeyBytes, counter: u64) -> [u8; DIGEST_LEN] {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(&counter.to_be_bytes());

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Dynamic truncation: 31 bits read big-endian at the offset given by the
/// low nibble of the last byte.
pub fn encode_digest_truncated(digest: &[u8; DIGEST_LEN]) -> u32 {
    // offset <= 15, so offset + 3 <= 18 always lies inside the digest
    let offset = (digest[DIGEST_LEN - 1] & 0xf) as usize;

    let code_bytes = [
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];

    u32::from_be_bytes(code_bytes) & 0x7fff_ffff
}
