//! # Accrual service client
//!
//! The accrual service is the external authority that decides whether an order earns loyalty points. It is queried
//! one order at a time with `GET {base_url}/api/orders/{number}`.
//!
//! [`AccrualLookup`] is the contract the reconciliation pool depends on. [`AccrualClient`] implements it over HTTP.
//! A lookup never retries and never fails outright. Every response, including transport failures, is translated into
//! a [`LookupOutcome`] that the caller can act on.
mod client;
mod errors;

use std::future::Future;

pub use client::AccrualClient;
pub use errors::AccrualClientError;

use crate::db_types::{AccrualRecord, OrderNumber};

/// What the accrual service said about an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The service gave a definitive answer for the order.
    Resolved(AccrualRecord),
    /// The service is overloaded (HTTP 429). The caller must back off.
    RateLimited,
    /// The service has no record of the order yet (HTTP 204). Ask again later.
    NotFound,
    /// The request failed, or the response could not be understood.
    TransportError(AccrualClientError),
}

pub trait AccrualLookup {
    /// Makes exactly one request to the accrual service for the given order.
    fn lookup(&self, number: &OrderNumber) -> impl Future<Output = LookupOutcome> + Send;
}
