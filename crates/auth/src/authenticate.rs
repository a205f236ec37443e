use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{JwtValidator, Principal, TokenValidationError};

/// Why a credential could not be turned into a [`Principal`].
///
/// Callers are expected to treat every variant as "unauthenticated"; the
/// variants exist for logging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingCredential,

    #[error("authorization header is not a bearer credential")]
    MalformedHeader,

    #[error("bearer token is empty")]
    EmptyToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenValidationError),
}

/// Strip the `Bearer ` scheme from an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}

/// Verify a bearer credential and produce the request principal.
pub fn authenticate(
    validator: &dyn JwtValidator,
    authorization: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Principal, AuthError> {
    let token = extract_bearer(authorization)?;
    let claims = validator.validate(token, now)?;
    Ok(claims.principal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hs256JwtIssuer, Hs256JwtValidator, Role};
    use dineout_core::UserId;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_bearer(None), Err(AuthError::MissingCredential));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(AuthError::MalformedHeader));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(AuthError::EmptyToken));
        assert_eq!(extract_bearer(Some("Bearer abc ")), Ok("abc"));
    }

    #[test]
    fn valid_token_yields_principal() {
        let secret = b"s3cret".to_vec();
        let issuer = Hs256JwtIssuer::new(secret.clone());
        let validator = Hs256JwtValidator::new(secret);
        let user_id = UserId::new();
        let now = Utc::now();
        let token = issuer.issue(user_id, Role::Diner, now).unwrap();

        let header = format!("Bearer {token}");
        let principal = authenticate(&validator, Some(&header), now).unwrap();
        assert_eq!(principal, crate::Principal::diner(user_id));
    }

    #[test]
    fn invalid_token_is_an_auth_error() {
        let validator = Hs256JwtValidator::new(b"s3cret".to_vec());
        let err = authenticate(&validator, Some("Bearer nope"), Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
