use thiserror::Error;

use crate::db_types::Points;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualClientError {
    #[error("Could not initialize the accrual client. {0}")]
    Initialization(String),
    #[error("The request to the accrual service failed. {0}")]
    Request(String),
    #[error("The accrual service responded with an unexpected status {status}. {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Could not deserialize the accrual service response. {0}")]
    Json(String),
    #[error("Asked the accrual service about order {expected}, but it replied about order {actual}")]
    OrderMismatch { expected: String, actual: String },
    #[error("The accrual service reported a negative accrual of {accrual} for order {order}")]
    NegativeAccrual { order: String, accrual: Points },
}
