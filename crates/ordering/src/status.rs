use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order status lifecycle.
///
/// ```text
/// Pending          -> Accepted | Rejected | Cancelled
/// Accepted         -> Preparing | Cancelled
/// Preparing        -> ReadyForDelivery | Cancelled
/// ReadyForDelivery -> Completed
/// ```
///
/// `Rejected`, `Cancelled` and `Completed` are terminal. New orders always
/// start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Preparing,
    ReadyForDelivery,
    Completed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid status value '{0}'")]
    Unknown(String),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
        OrderStatus::Preparing,
        OrderStatus::ReadyForDelivery,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::ReadyForDelivery => "ReadyForDelivery",
            OrderStatus::Completed => "Completed",
        }
    }

    /// Statuses reachable in one step from `self`.
    pub fn next_statuses(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Accepted, Rejected, Cancelled],
            Accepted => &[Preparing, Cancelled],
            Preparing => &[ReadyForDelivery, Cancelled],
            ReadyForDelivery => &[Completed],
            Rejected | Cancelled | Completed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Validate a single lifecycle step.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, StatusError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusError::InvalidTransition { from: self, to: next })
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusError;

    /// Exact, case-sensitive match on the seven literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn parses_all_seven_literals() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert_eq!(
            "pending".parse::<OrderStatus>(),
            Err(StatusError::Unknown("pending".to_string()))
        );
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serde_uses_the_same_literals() {
        let json = serde_json::to_string(&ReadyForDelivery).unwrap();
        assert_eq!(json, "\"ReadyForDelivery\"");
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        let allowed = [
            (Pending, Accepted),
            (Pending, Rejected),
            (Pending, Cancelled),
            (Accepted, Preparing),
            (Accepted, Cancelled),
            (Preparing, ReadyForDelivery),
            (Preparing, Cancelled),
            (ReadyForDelivery, Completed),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "allowed" } else { "rejected" }
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        assert!(Rejected.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!ReadyForDelivery.is_terminal());
    }

    #[test]
    fn self_transition_is_rejected() {
        assert_eq!(
            Pending.transition(Pending),
            Err(StatusError::InvalidTransition { from: Pending, to: Pending })
        );
    }

    #[test]
    fn ready_for_delivery_cannot_be_cancelled() {
        assert!(ReadyForDelivery.transition(Cancelled).is_err());
        assert_eq!(ReadyForDelivery.transition(Completed), Ok(Completed));
    }
}
