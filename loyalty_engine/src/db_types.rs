use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use loyalty_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn_valid;

//--------------------------------------     OrderNumber     ---------------------------------------------------------
/// The external order number. It can only be constructed from a string of digits that passes the Luhn checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("The order number is empty")]
    Empty,
    #[error("The order number '{0}' contains non-digit characters")]
    NotNumeric(String),
    #[error("The order number '{0}' fails the Luhn checksum")]
    ChecksumFailed(String),
}

impl OrderNumber {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, OrderNumberError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NotNumeric(value.to_string()));
        }
        if !luhn_valid(value) {
            return Err(OrderNumberError::ChecksumFailed(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        OrderNumber::parse(s).map_err(serde::de::Error::custom)
    }
}

//--------------------------------------       UserId        ---------------------------------------------------------
/// The identifier of the user that owns orders and withdrawals. Users themselves live outside the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual service has not been consulted yet.
    New,
    /// The accrual service is still evaluating the order.
    Processing,
    /// The accrual service rejected the order. No points will be awarded. Terminal.
    Invalid,
    /// The accrual service has finished evaluating the order and points have been awarded. Terminal.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Invalid | OrderStatusType::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   AccrualStatus     -----------------------------------------------------------
/// The status vocabulary used by the external accrual service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The order is known to the accrual service, but evaluation has not started.
    Registered,
    Invalid,
    Processing,
    Processed,
}

impl From<AccrualStatus> for OrderStatusType {
    fn from(value: AccrualStatus) -> Self {
        match value {
            AccrualStatus::Registered | AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccrualStatus::Registered => write!(f, "REGISTERED"),
            AccrualStatus::Invalid => write!(f, "INVALID"),
            AccrualStatus::Processing => write!(f, "PROCESSING"),
            AccrualStatus::Processed => write!(f, "PROCESSED"),
        }
    }
}

//--------------------------------------    AccrualRecord     ----------------------------------------------------------
/// The body returned by the accrual service for a known order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualRecord {
    /// The order number the service is reporting on. Kept as a raw string so that a malformed value from the
    /// service is reported as a mismatch rather than a deserialization error.
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl AccrualRecord {
    pub fn new(order: &OrderNumber, status: AccrualStatus, accrual: Option<Points>) -> Self {
        Self { order: order.as_str().to_string(), status, accrual }
    }

    /// The order status that this record translates to in the ledger.
    pub fn order_status(&self) -> OrderStatusType {
        self.status.into()
    }

    /// The accrual to store. Only a `PROCESSED` order carries an accrual. A processed order without an amount is
    /// credited with zero points.
    pub fn ledger_accrual(&self) -> Option<Points> {
        match self.order_status() {
            OrderStatusType::Processed => Some(self.accrual.unwrap_or_default()),
            _ => None,
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub number: OrderNumber,
    #[serde(skip)]
    pub user_id: UserId,
    pub status: OrderStatusType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Withdrawal     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub user_id: UserId,
    /// The order that the points were spent against
    #[serde(rename = "order")]
    pub order_number: OrderNumber,
    /// The number of points withdrawn
    #[serde(rename = "sum")]
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: UserId, order_number: OrderNumber, amount: Points) -> Self {
        Self { user_id, order_number, amount }
    }
}

//--------------------------------------     UserBalance     ---------------------------------------------------------
/// A user's balance, derived from processed orders and withdrawals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    /// Points accrued and not yet withdrawn
    pub current: Points,
    /// Total points withdrawn to date
    pub withdrawn: Points,
}

impl UserBalance {
    pub fn new(accrued: Points, withdrawn: Points) -> Self {
        Self { current: accrued - withdrawn, withdrawn }
    }

    pub fn accrued(&self) -> Points {
        self.current + self.withdrawn
    }
}
