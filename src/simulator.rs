//! Stand-ins for the external collaborators, used by the standalone CLI
//! mode. The simulated provider confirms a demand after a fixed number of
//! status polls, which is enough to drive the whole lifecycle locally.

use crate::error::{ExecutionError, ProviderError};
use crate::executor::TaskExecutor;
use crate::job::PaymentStatus;
use crate::provider::{DemandDeadlines, DemandRequest, PaymentDemand, PaymentProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub struct SimulatedProvider {
    confirm_after: u32,
    next_demand: AtomicU32,
    polls: Mutex<HashMap<String, u32>>,
    fulfilled: Mutex<HashMap<String, String>>,
}

impl SimulatedProvider {
    pub fn new(confirm_after: u32) -> Self {
        Self {
            confirm_after,
            next_demand: AtomicU32::new(0),
            polls: Mutex::new(HashMap::new()),
            fulfilled: Mutex::new(HashMap::new()),
        }
    }

    pub fn fulfilled_payload(&self, reference: &str) -> Option<String> {
        self.fulfilled.lock().unwrap().get(reference).cloned()
    }

    fn deadlines() -> DemandDeadlines {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        let minutes = |m: i64| m * 60 * 1_000;
        DemandDeadlines {
            pay_by_time: now + minutes(15),
            submit_result_time: now + minutes(30),
            unlock_time: now + minutes(45),
            external_dispute_unlock_time: now + minutes(60),
        }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn create_demand(&self, _request: DemandRequest) -> Result<PaymentDemand, ProviderError> {
        let n = self.next_demand.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentDemand {
            reference: format!("sim_{n:03}"),
            deadlines: Self::deadlines(),
        })
    }

    async fn check_status(&self, reference: &str) -> Result<PaymentStatus, ProviderError> {
        if self.fulfilled.lock().unwrap().contains_key(reference) {
            return Ok(PaymentStatus::Completed);
        }
        let mut polls = self.polls.lock().unwrap();
        let seen = polls.entry(reference.to_string()).or_insert(0);
        *seen += 1;
        if *seen >= self.confirm_after {
            Ok(PaymentStatus::Confirmed)
        } else {
            Ok(PaymentStatus::Pending)
        }
    }

    async fn fulfill(&self, reference: &str, result: &str) -> Result<(), ProviderError> {
        self.fulfilled
            .lock()
            .unwrap()
            .insert(reference.to_string(), result.to_string());
        Ok(())
    }
}

/// Echoes the query back after a short delay, standing in for the real
/// query-answering pipeline.
pub struct EchoExecutor;

#[async_trait]
impl TaskExecutor for EchoExecutor {
    async fn execute(&self, query: &str) -> Result<String, ExecutionError> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(format!("echo: {query}"))
    }
}
