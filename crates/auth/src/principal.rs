use serde::{Deserialize, Serialize};

use dineout_core::UserId;

use crate::Role;

/// Authenticated identity for a single request.
///
/// Produced by [`crate::authenticate`] and threaded explicitly from the
/// transport layer into every policy check. Never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn diner(user_id: UserId) -> Self {
        Self::new(user_id, Role::Diner)
    }

    pub fn merchant(user_id: UserId) -> Self {
        Self::new(user_id, Role::Merchant)
    }

    pub fn is_diner(&self) -> bool {
        self.role == Role::Diner
    }

    pub fn is_merchant(&self) -> bool {
        self.role == Role::Merchant
    }
}
