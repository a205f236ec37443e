//! Access policy: role and ownership predicates gating every write path.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)
//!
//! Ownership facts (who owns a venue, which diner placed an order) are
//! supplied by the caller through [`MerchantOwned`] / [`DinerOwned`] or as a
//! resolved owner id.

use thiserror::Error;

use dineout_core::UserId;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthzError {
    fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// Something owned by a merchant account (e.g. a venue).
pub trait MerchantOwned {
    fn owner_merchant_id(&self) -> UserId;
}

/// Something placed by a diner account (e.g. an order).
pub trait DinerOwned {
    fn diner_id(&self) -> UserId;
}

/// Run a policy check for a possibly-absent principal.
///
/// An absent principal is `Unauthenticated` before any role or ownership
/// predicate is evaluated.
pub fn authorize<F>(principal: Option<&Principal>, check: F) -> Result<(), AuthzError>
where
    F: FnOnce(&Principal) -> Result<(), AuthzError>,
{
    let principal = principal.ok_or(AuthzError::Unauthenticated)?;
    check(principal)
}

pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthzError> {
    if principal.role == role {
        Ok(())
    } else {
        Err(AuthzError::forbidden(format!("requires role '{role}'")))
    }
}

pub fn can_place_order(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_diner() {
        Ok(())
    } else {
        Err(AuthzError::forbidden("only diners can place orders"))
    }
}

pub fn can_manage_venue<V: MerchantOwned + ?Sized>(
    principal: &Principal,
    venue: &V,
) -> Result<(), AuthzError> {
    if !principal.is_merchant() {
        return Err(AuthzError::forbidden("only merchants can manage venues"));
    }
    if venue.owner_merchant_id() != principal.user_id {
        return Err(AuthzError::forbidden("venue is owned by another merchant"));
    }
    Ok(())
}

/// `venue_owner_id` is the owner of the order's venue, resolved by the caller.
pub fn can_view_order_as_merchant(
    principal: &Principal,
    venue_owner_id: UserId,
) -> Result<(), AuthzError> {
    if !principal.is_merchant() {
        return Err(AuthzError::forbidden("only merchants can manage orders"));
    }
    if venue_owner_id != principal.user_id {
        return Err(AuthzError::forbidden("order belongs to another merchant's venue"));
    }
    Ok(())
}

pub fn can_view_order_as_diner<O: DinerOwned + ?Sized>(
    principal: &Principal,
    order: &O,
) -> Result<(), AuthzError> {
    if !principal.is_diner() {
        return Err(AuthzError::forbidden("only diners can view their orders"));
    }
    if order.diner_id() != principal.user_id {
        return Err(AuthzError::forbidden("order belongs to another diner"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Venue(UserId);

    impl MerchantOwned for Venue {
        fn owner_merchant_id(&self) -> UserId {
            self.0
        }
    }

    struct Order(UserId);

    impl DinerOwned for Order {
        fn diner_id(&self) -> UserId {
            self.0
        }
    }

    #[test]
    fn absent_principal_is_unauthenticated_before_role_checks() {
        let result = authorize(None, |_| panic!("predicate must not run"));
        assert_eq!(result, Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn only_diners_place_orders() {
        assert!(can_place_order(&Principal::diner(UserId::new())).is_ok());
        assert!(matches!(
            can_place_order(&Principal::merchant(UserId::new())),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn venue_management_requires_merchant_owner() {
        let owner = UserId::new();
        let venue = Venue(owner);

        assert!(can_manage_venue(&Principal::merchant(owner), &venue).is_ok());
        assert!(can_manage_venue(&Principal::merchant(UserId::new()), &venue).is_err());
        // Same id but diner role is still forbidden.
        assert!(can_manage_venue(&Principal::diner(owner), &venue).is_err());
    }

    #[test]
    fn merchant_order_view_is_ownership_scoped() {
        let owner = UserId::new();
        assert!(can_view_order_as_merchant(&Principal::merchant(owner), owner).is_ok());
        assert!(can_view_order_as_merchant(&Principal::merchant(UserId::new()), owner).is_err());
        assert!(can_view_order_as_merchant(&Principal::diner(owner), owner).is_err());
    }

    #[test]
    fn diner_order_view_is_own_orders_only() {
        let diner = UserId::new();
        let order = Order(diner);
        assert!(can_view_order_as_diner(&Principal::diner(diner), &order).is_ok());
        assert!(can_view_order_as_diner(&Principal::diner(UserId::new()), &order).is_err());
        assert!(can_view_order_as_diner(&Principal::merchant(diner), &order).is_err());
    }

    #[test]
    fn authorize_runs_predicate_for_present_principal() {
        let principal = Principal::merchant(UserId::new());
        assert!(authorize(Some(&principal), can_place_order).is_err());
        assert!(authorize(Some(&principal), |p| require_role(p, Role::Merchant)).is_ok());
    }
}
