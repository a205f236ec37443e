use serde::{Deserialize, Serialize};

use dineout_core::UserId;

/// Public view of a diner account, joined into order responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinerProfile {
    pub id: UserId,
    pub email: String,
}
