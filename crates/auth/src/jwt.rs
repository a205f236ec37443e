//! HS256 token signing and verification.
//!
//! Signature, algorithm and issuer checks are delegated to `jsonwebtoken`;
//! the time window is checked by [`validate_claims`] against an explicit
//! `now` so callers (and tests) control the clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use dineout_core::UserId;

use crate::{JwtClaims, Role, TokenValidationError, validate_claims};

/// Issuer string used when none is configured.
pub const DEFAULT_ISSUER: &str = "dineout";

/// Verifies a compact JWT and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Shared-secret (HS256) validator.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self::with_issuer(secret, DEFAULT_ISSUER)
    }

    pub fn with_issuer(secret: Vec<u8>, issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` with the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[issuer]);

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// Shared-secret (HS256) token issuer.
pub struct Hs256JwtIssuer {
    key: EncodingKey,
    issuer: String,
    ttl: Duration,
}

impl Hs256JwtIssuer {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            key: EncodingKey::from_secret(&secret),
            issuer: DEFAULT_ISSUER.to_string(),
            ttl: Duration::hours(24),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn claims_for(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: user_id,
            role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl,
        }
    }

    pub fn issue(
        &self,
        user_id: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.sign(&self.claims_for(user_id, role, now))
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_validates_to_same_subject_and_role() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec());
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let user_id = UserId::new();
        let now = Utc::now();

        let token = issuer.issue(user_id, Role::Merchant, now).unwrap();
        let claims = validator.validate(&token, now).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Merchant);
        assert_eq!(claims.iss, DEFAULT_ISSUER);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = Hs256JwtIssuer::new(b"other-secret".to_vec());
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let now = Utc::now();

        let token = issuer.issue(UserId::new(), Role::Diner, now).unwrap();
        assert!(matches!(
            validator.validate(&token, now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec()).with_issuer("someone-else");
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let now = Utc::now();

        let token = issuer.issue(UserId::new(), Role::Diner, now).unwrap();
        assert!(validator.validate(&token, now).is_err());
    }

    #[test]
    fn expiry_uses_the_supplied_clock() {
        let issuer = Hs256JwtIssuer::new(SECRET.to_vec()).with_ttl(Duration::minutes(5));
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        let now = Utc::now();

        let token = issuer.issue(UserId::new(), Role::Diner, now).unwrap();
        assert_eq!(
            validator.validate(&token, now + Duration::minutes(6)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let validator = Hs256JwtValidator::new(SECRET.to_vec());
        assert!(validator.validate("not.a.jwt", Utc::now()).is_err());
    }
}
