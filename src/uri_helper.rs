use std::str::FromStr;

use crate::{OtpError, Totp, ALGORITHM, DIGITS, STEP_SIZE};

const URI_SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

pub fn otp_from_uri(uri: &str) -> Result<Totp, OtpError> {
    let uri = url::Url::parse(uri).map_err(OtpError::UriParseError)?;

    let domain = uri.domain();
    if uri.scheme() != URI_SCHEME || domain.is_none() || domain.is_some_and(|d| d != TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            format!("{}://{}", uri.scheme(), domain.unwrap_or("None")),
            format!("{URI_SCHEME}://{TOTP_TYPE}"),
        ));
    }

    let mut secret = String::new();

    for (key, value) in uri.query_pairs() {
        match key.as_ref() {
            URI_SECRET_QUERY => secret = value.into_owned(),
            URI_HASH_QUERY => {
                if !value.eq_ignore_ascii_case(ALGORITHM) {
                    return Err(OtpError::UnsupportedParameter(
                        URI_HASH_QUERY,
                        value.into_owned(),
                        ALGORITHM.into(),
                    ));
                }
            }
            URI_PERIOD_QUERY => {
                let period = u64::from_str(value.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?;
                if period != STEP_SIZE {
                    return Err(OtpError::UnsupportedParameter(
                        URI_PERIOD_QUERY,
                        period.to_string(),
                        STEP_SIZE.to_string(),
                    ));
                }
            }
            URI_DIGITS_QUERY => {
                let digits = u32::from_str(value.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?;
                if digits != DIGITS {
                    return Err(OtpError::UnsupportedParameter(
                        URI_DIGITS_QUERY,
                        digits.to_string(),
                        DIGITS.to_string(),
                    ));
                }
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }

    Totp::from_secret(&secret)
}

pub fn otp_to_uri(totp: &Totp, user: &str, issuer: Option<&str>) -> Result<String, OtpError> {
    let mut uri = url::Url::parse(&format!("{URI_SCHEME}://{TOTP_TYPE}/"))
        .map_err(OtpError::UriParseError)?;

    let issuer = issuer.filter(|i| !i.is_empty());

    match issuer {
        Some(issuer) => uri.set_path(&format!("{issuer}:{user}")),
        None => uri.set_path(user),
    }

    {
        let mut query_params = uri.query_pairs_mut();

        query_params.append_pair(URI_SECRET_QUERY, &totp.key().to_base32());

        if let Some(issuer) = issuer {
            query_params.append_pair(URI_ISSUER_QUERY, issuer);
        }

        query_params
            .append_pair(URI_HASH_QUERY, ALGORITHM)
            .append_pair(URI_DIGITS_QUERY, &DIGITS.to_string())
            .append_pair(URI_PERIOD_QUERY, &STEP_SIZE.to_string());
    }

    Ok(uri.to_string())
}
