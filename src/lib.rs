//! Time-based one-time passwords (RFC 6238) on top of HMAC-SHA1 based
//! one-time passwords (RFC 4226).
//!
//! Every operation is a pure function of its inputs. The time-dependent
//! ones take the instant explicitly; the `*_now` variants read the system
//! clock for you.
//!
//! ```
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let at = UNIX_EPOCH + Duration::from_secs(59);
//! let code = oxidetotp::generate(oxidetotp::DEMO_SECRET, at).unwrap();
//!
//! assert_eq!(code.to_string(), "996554");
//! assert!(oxidetotp::validate("996554", oxidetotp::DEMO_SECRET, 0, at));
//! ```

pub mod hotp;
pub mod secret;
pub mod totp;
pub(crate) mod uri_helper;

use core::num;
use std::{fmt::Display, time::SystemTime};

pub use hotp::{hotp, Hotp};
pub use secret::{decode_secret, KeyBytes};
pub use totp::{unix_seconds, Totp};

/// Length of one TOTP time step, in seconds. Generation and validation
/// both derive their counter from it.
pub const STEP_SIZE: u64 = 30;

/// Number of decimal digits in every generated code.
pub const DIGITS: u32 = 6;

/// Drift tolerance most callers want: one step before and after "now".
pub const DEFAULT_WINDOW_STEPS: u32 = 1;

/// The only supported HMAC hash, as spelled in `otpauth://` URIs.
pub const ALGORITHM: &str = "SHA1";

/// Well known demonstration secret ("Hello!" followed by `0xDEADBEEF`).
pub const DEMO_SECRET: &str = "JBSWY3DPEHPK3PXP";

/// RFC 4226 / RFC 6238 test key `12345678901234567890`.
#[cfg(test)]
pub(crate) const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

const CODE_MODULUS: u32 = 10u32.pow(DIGITS);

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("invalid secret")]
    InvalidSecretFormat(#[from] SecretFormatError),
    #[error("The provided URI is not a {1} URI, found {0}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(num::ParseIntError, String),
    #[error("Unsupported {0}, found {1}. Expected: {2}")]
    UnsupportedParameter(&'static str, String, String),
}

/// Why a secret was rejected. Only reachable through the source chain of
/// [`OtpError::InvalidSecretFormat`], whose own message stays generic.
#[derive(Debug, thiserror::Error)]
pub enum SecretFormatError {
    #[error("secret does not contain any base32 data")]
    Empty,
    #[error("secret is not valid base32")]
    Decode(#[source] data_encoding::DecodeError),
}

/// A 6-digit one-time password.
///
/// `Display` renders it left-padded with zeros, which is the form users
/// type and the form [`validate`] compares against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
}

impl OtpCode {
    pub(crate) fn from_truncated(truncated: u32) -> Self {
        Self {
            code: truncated % CODE_MODULUS,
        }
    }

    pub fn integer(&self) -> u32 {
        self.code
    }

    /// Exact comparison against a code as typed by a user.
    pub fn matches(&self, candidate: &str) -> bool {
        self.to_string() == candidate
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0padding$}", self.code, padding = DIGITS as usize)
    }
}

/// Generates the code for `secret` at the instant `at`.
pub fn generate(secret: &str, at: SystemTime) -> Result<OtpCode, OtpError> {
    let totp = Totp::from_secret(secret)?;

    Ok(totp.generate_at(at))
}

/// Generates the code for `secret` at the current system time.
pub fn generate_now(secret: &str) -> Result<OtpCode, OtpError> {
    generate(secret, SystemTime::now())
}

/// Checks `candidate` against every step in `[now - window_steps, now + window_steps]`.
///
/// A secret that fails to decode is reported as `false` like any other
/// mismatch, so callers cannot tell the two apart.
pub fn validate(candidate: &str, secret: &str, window_steps: u32, at: SystemTime) -> bool {
    match Totp::from_secret(secret) {
        Ok(totp) => totp.validate_at(candidate, at, window_steps),
        Err(err) => {
            tracing::debug!(error = %err, "secret rejected, reporting code as invalid");
            false
        }
    }
}

/// [`validate`] against the current system time.
pub fn validate_now(candidate: &str, secret: &str, window_steps: u32) -> bool {
    validate(candidate, secret, window_steps, SystemTime::now())
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        time::{Duration, UNIX_EPOCH},
    };

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{
        generate, validate, OtpCode, OtpError, SecretFormatError, DEFAULT_WINDOW_STEPS,
        DEMO_SECRET, RFC_SECRET, STEP_SIZE,
    };

    fn at(seconds: u64) -> std::time::SystemTime {
        UNIX_EPOCH + Duration::from_secs(seconds)
    }

    #[rstest]
    #[case(0, "000000")]
    #[case(7, "000007")]
    #[case(81804, "081804")]
    #[case(999999, "999999")]
    #[case(1_000_007, "000007")]
    fn code_display_is_zero_padded(#[case] truncated: u32, #[case] expected: &str) {
        let code = OtpCode::from_truncated(truncated);

        assert_eq!(expected, code.to_string());
        assert!(code.matches(expected));
    }

    #[test]
    fn code_match_is_exact() {
        let code = OtpCode::from_truncated(81804);

        assert!(!code.matches("81804"));
        assert!(!code.matches(" 081804"));
        assert!(!code.matches("0818040"));
    }

    #[rstest]
    #[case(DEMO_SECRET, "996554")]
    #[case(RFC_SECRET, "287082")]
    #[case("JBSWY3DPEHPK3PXPJBSWY3DPEH", "744635")]
    #[case("jbsw y3dp ehpk 3pxp jbsw y3dp eh", "744635")]
    #[case("AB", "812658")]
    fn codes_at_59(#[case] secret: &str, #[case] expected: &str) {
        assert_eq!(expected, generate(secret, at(59)).unwrap().to_string());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-base32!!!")]
    fn generate_rejects_bad_secrets(#[case] secret: &str) {
        let err = generate(secret, at(59)).unwrap_err();

        assert!(matches!(err, OtpError::InvalidSecretFormat(_)));
        assert_eq!("invalid secret", err.to_string());
    }

    #[test]
    fn empty_secret_reason_is_kept_as_source() {
        let err = generate("", at(0)).unwrap_err();
        let source = err
            .source()
            .and_then(|s| s.downcast_ref::<SecretFormatError>());

        assert!(matches!(source, Some(SecretFormatError::Empty)));
    }

    #[test]
    fn validate_never_fails_on_bad_secret() {
        assert!(!validate("000000", "not-base32!!!", 1, at(59)));
        assert!(!validate("000000", "", DEFAULT_WINDOW_STEPS, at(59)));
    }

    #[rstest]
    fn fresh_code_validates_with_zero_window(
        #[values(
            DEMO_SECRET,
            RFC_SECRET,
            "mzxw6===",
            "JBSWY3DPEHPK3PXPJBSWY3DPEH",
            "AB"
        )]
        secret: &str,
        #[values(0, 59, 1_111_111_109, 1_700_000_000, 20_000_000_000)] seconds: u64,
    ) {
        let code = generate(secret, at(seconds)).unwrap();

        assert!(validate(&code.to_string(), secret, 0, at(seconds)));
    }

    #[test]
    fn validate_accepts_lowercase_spaced_secret() {
        let code = generate(DEMO_SECRET, at(1_700_000_000)).unwrap();

        assert!(validate(
            &code.to_string(),
            "jbsw y3dp ehpk 3pxp",
            0,
            at(1_700_000_000)
        ));
    }

    // Codes of each secret are pairwise distinct across steps 56666663..=56666669
    #[rstest]
    fn window_boundary(
        #[values(
            DEMO_SECRET,
            RFC_SECRET,
            "mzxw6===",
            "JBSWY3DPEHPK3PXPJBSWY3DPEH",
            "AB"
        )]
        secret: &str,
        #[values(0, 1, 2)] window: u32,
    ) {
        let now = 1_700_000_000;
        let step = STEP_SIZE * u64::from(window);
        let code_at = |seconds| generate(secret, at(seconds)).unwrap().to_string();

        assert!(validate(&code_at(now + step), secret, window, at(now)));
        assert!(validate(&code_at(now - step), secret, window, at(now)));
        assert!(!validate(&code_at(now + step + STEP_SIZE), secret, window, at(now)));
        assert!(!validate(&code_at(now - step - STEP_SIZE), secret, window, at(now)));
    }
}
