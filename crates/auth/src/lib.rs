//! `dineout-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies
//! bearer credentials into a typed [`Principal`] and answers access-policy
//! questions about that principal.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;

pub use authenticate::{AuthError, authenticate, extract_bearer};
pub use authorize::{
    AuthzError, DinerOwned, MerchantOwned, authorize, can_manage_venue, can_place_order,
    can_view_order_as_diner, can_view_order_as_merchant, require_role,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{DEFAULT_ISSUER, Hs256JwtIssuer, Hs256JwtValidator, JwtValidator};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
