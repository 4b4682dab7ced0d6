use std::sync::OnceLock;

use data_encoding::{Encoding, BASE32, BASE32_NOPAD};
use zeroize::Zeroize;

use crate::{OtpError, SecretFormatError};

/// Raw HMAC key decoded from a shared secret.
///
/// Never empty: an empty HMAC key is accepted by the primitive but yields
/// codes anyone can compute, so both constructors refuse it. The bytes are
/// wiped when the value is dropped.
///
/// Equality runs in constant time over keys of the same length.
#[derive(Clone)]
pub struct KeyBytes(Vec<u8>);

impl KeyBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, OtpError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SecretFormatError::Empty.into());
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Unpadded RFC4648 base32 form, as authenticator apps expect it.
    pub fn to_base32(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyBytes([redacted; {}])", self.0.len())
    }
}

impl PartialEq for KeyBytes {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq::constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for KeyBytes {}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Padded RFC4648 base32 that ignores the unused low bits of the last
/// symbol, so `AB` decodes like `AA`. Authenticator apps accept such
/// secrets.
fn secret_encoding() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();

    ENCODING.get_or_init(|| {
        let mut spec = BASE32.specification();
        spec.check_trailing_bits = false;
        spec.encoding()
            .expect("relaxing trailing bits keeps the BASE32 specification valid")
    })
}

/// Uppercases, drops whitespace and pads with `=` to a whole number of
/// 8-symbol blocks.
pub fn normalize(secret: &str) -> String {
    let mut normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    let missing = (8 - normalized.len() % 8) % 8;
    normalized.extend(std::iter::repeat('=').take(missing));

    normalized
}

/// Decodes a secret (given as an RFC4648 base32-encoded ASCII string,
/// padded or not, any case, whitespace allowed) into key bytes.
///
/// Anything else is rejected: symbols outside `A-Z2-7`, malformed
/// padding and impossible lengths (1, 3 or 6 symbols in the last block).
pub fn decode_secret(secret: &str) -> Result<KeyBytes, OtpError> {
    let mut normalized = normalize(secret);
    let decoded = secret_encoding()
        .decode(normalized.as_bytes())
        .map_err(SecretFormatError::Decode);
    normalized.zeroize();

    KeyBytes::new(decoded?)
}
