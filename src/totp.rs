use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::{
    uri_helper::{otp_from_uri, otp_to_uri},
    Hotp, KeyBytes, OtpCode, OtpError, STEP_SIZE,
};

/// Whole seconds since the UNIX epoch. Instants before the epoch count as 0.
pub fn unix_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// The [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
/// (TOTP): SHA1, 6 digits, 30 second steps.
///
/// The secret is decoded once when the value is built and reused for
/// every code it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totp {
    hotp: Hotp,
}

impl Totp {
    pub fn new(key: KeyBytes) -> Self {
        Self {
            hotp: Hotp::new(key),
        }
    }

    /// Creates the generator from an RFC4648 base32 encoded secret
    pub fn from_secret(secret: &str) -> Result<Self, OtpError> {
        Hotp::from_secret(secret).map(|hotp| Self { hotp })
    }

    pub fn key(&self) -> &KeyBytes {
        self.hotp.key()
    }

    /// The HOTP counter for the step containing `seconds_since_epoch`
    pub fn counter_at(seconds_since_epoch: u64) -> u64 {
        seconds_since_epoch / STEP_SIZE
    }

    /// Seconds left before the step containing `seconds_since_epoch` ends, in `1..=30`
    pub fn remaining_seconds(seconds_since_epoch: u64) -> u64 {
        STEP_SIZE - seconds_since_epoch % STEP_SIZE
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    pub fn generate(&self, seconds_since_epoch: u64) -> OtpCode {
        self.hotp.generate(Self::counter_at(seconds_since_epoch))
    }

    pub fn generate_at(&self, at: SystemTime) -> OtpCode {
        self.generate(unix_seconds(at))
    }

    /// Validates a code in the given window
    /// Returning the counter it was found at, or None if the code is invalid
    ///
    /// Steps are probed from the oldest to the newest. Steps that would fall
    /// outside the `u64` counter range are skipped.
    pub fn validate_window(
        &self,
        otp_to_validate: &str,
        seconds_since_epoch: u64,
        window_steps: u32,
    ) -> Option<u64> {
        let current = Self::counter_at(seconds_since_epoch);
        let window = i64::from(window_steps);

        for offset in -window..=window {
            let Some(counter) = current.checked_add_signed(offset) else {
                trace!(offset, "step outside the counter range, skipping");
                continue;
            };

            if self.hotp.generate(counter).matches(otp_to_validate) {
                trace!(offset, "code matched");
                return Some(counter);
            }
        }

        None
    }

    pub fn validate_at(&self, otp_to_validate: &str, at: SystemTime, window_steps: u32) -> bool {
        self.validate_window(otp_to_validate, unix_seconds(at), window_steps)
            .is_some()
    }

    /// Renders an `otpauth://totp/` key URI for provisioning authenticator apps
    pub fn to_uri(&self, user: &str, issuer: Option<&str>) -> Result<String, OtpError> {
        otp_to_uri(self, user, issuer)
    }

    /// Parses an `otpauth://totp/` key URI. Parameters other than the
    /// defaults (SHA1, 6 digits, 30 seconds) are rejected.
    pub fn from_uri(uri: &str) -> Result<Self, OtpError> {
        otp_from_uri(uri)
    }
}
