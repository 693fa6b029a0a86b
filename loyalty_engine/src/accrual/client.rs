use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};

use crate::{
    accrual::{AccrualClientError, AccrualLookup, LookupOutcome},
    db_types::{AccrualRecord, OrderNumber, Points},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the accrual service.
///
/// Cloning is cheap. Every clone shares the same connection pool.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualClient ({})", self.base_url)
    }
}

impl AccrualClient {
    pub fn new(base_url: &str) -> Result<Self, AccrualClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AccrualClientError::Initialization(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    /// Uses the given `reqwest` client rather than building one.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, client: Arc::new(client) }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn order_url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number.as_str())
    }

    /// Queries the accrual service once for the given order.
    ///
    /// The rate-limited and not-found replies are regular outcomes. Anything else that is not a `200` with a body
    /// about the requested order is an error.
    async fn query(&self, number: &OrderNumber) -> Result<LookupOutcome, AccrualClientError> {
        let url = self.order_url(number);
        trace!("🧾️ Querying accrual service: {url}");
        let response = self.client.get(url).send().await.map_err(|e| AccrualClientError::Request(e.to_string()))?;
        let status = response.status();
        match status {
            StatusCode::OK => {
                let record =
                    response.json::<AccrualRecord>().await.map_err(|e| AccrualClientError::Json(e.to_string()))?;
                if record.order != number.as_str() {
                    return Err(AccrualClientError::OrderMismatch {
                        expected: number.as_str().to_string(),
                        actual: record.order,
                    });
                }
                if let Some(accrual) = record.accrual.filter(Points::is_negative) {
                    return Err(AccrualClientError::NegativeAccrual { order: record.order, accrual });
                }
                Ok(LookupOutcome::Resolved(record))
            },
            StatusCode::NO_CONTENT => Ok(LookupOutcome::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Ok(LookupOutcome::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(AccrualClientError::UnexpectedStatus { status: status.as_u16(), body })
            },
        }
    }
}

impl AccrualLookup for AccrualClient {
    async fn lookup(&self, number: &OrderNumber) -> LookupOutcome {
        let outcome = self.query(number).await.unwrap_or_else(LookupOutcome::TransportError);
        match &outcome {
            LookupOutcome::Resolved(record) => {
                debug!("🧾️ Accrual service reports order {number} as {}", record.status)
            },
            LookupOutcome::NotFound => debug!("🧾️ Accrual service does not know about order {number} yet"),
            LookupOutcome::RateLimited => {
                warn!("🧾️ Accrual service is rate limiting requests. Lookup for order {number} was refused")
            },
            LookupOutcome::TransportError(e) => warn!("🧾️ Accrual lookup for order {number} failed. {e}"),
        }
        outcome
    }
}
