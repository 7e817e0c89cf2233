//! Expiry extraction from issued access tokens.
//!
//! The provider only consumes tokens, it never validates them: the CaaS API
//! does that. The signature is therefore not checked here, only the `exp`
//! claim is read so the cache knows when to fetch a new token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AuthError, Result};

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// Returns `Ok(None)` if the token has no `exp` claim.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is not a decodable JWT or
/// the expiry is out of range.
pub fn token_expiry(token: &str) -> Result<Option<DateTime<Utc>>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    data.claims
        .exp
        .map(|exp| {
            DateTime::from_timestamp(exp, 0)
                .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".to_string()))
        })
        .transpose()
}
