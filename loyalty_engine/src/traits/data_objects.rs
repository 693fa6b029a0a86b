use serde::Serialize;

use crate::db_types::Order;

/// The result of applying an accrual result to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusUpdate {
    /// The order was updated. The new order record is returned.
    Updated(Order),
    /// The order had already reached a terminal status, so the update was ignored. The unchanged record is returned.
    AlreadyTerminal(Order),
}

impl StatusUpdate {
    pub fn order(&self) -> &Order {
        match self {
            StatusUpdate::Updated(o) | StatusUpdate::AlreadyTerminal(o) => o,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, StatusUpdate::Updated(_))
    }
}
