use crate::error::ProviderError;
use crate::job::{JobId, PaymentStatus};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ProviderRef = Arc<dyn PaymentProvider>;

/// Request to open a payment demand for one job.
#[derive(Debug, Clone)]
pub struct DemandRequest {
    pub amount: Decimal,
    pub unit: String,
    pub job_id: JobId,
    pub requester_id: String,
}

/// Provider-supplied timing metadata, unix-epoch milliseconds. Passed
/// through to the caller verbatim; the engine never interprets these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandDeadlines {
    pub pay_by_time: i64,
    pub submit_result_time: i64,
    pub unlock_time: i64,
    pub external_dispute_unlock_time: i64,
}

/// Provider response to a successful demand creation.
#[derive(Debug, Clone)]
pub struct PaymentDemand {
    /// Provider's opaque identifier for the demand.
    pub reference: String,
    pub deadlines: DemandDeadlines,
}

/// Capability interface over the payment network. Watching a demand is the
/// engine's own concern (see `monitor`); the provider only needs to answer
/// point-in-time status queries.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_demand(&self, request: DemandRequest) -> Result<PaymentDemand, ProviderError>;

    async fn check_status(&self, reference: &str) -> Result<PaymentStatus, ProviderError>;

    /// Settle the demand by attaching the job's result payload to it.
    async fn fulfill(&self, reference: &str, result: &str) -> Result<(), ProviderError>;
}
