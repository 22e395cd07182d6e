use async_trait::async_trait;
use paygate::engine::{JobEngine, StatusView};
use paygate::error::{ExecutionError, ProviderError};
use paygate::executor::TaskExecutor;
use paygate::job::{JobId, PaymentStatus};
use paygate::provider::{DemandDeadlines, DemandRequest, PaymentDemand, PaymentProvider};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DEADLINES: DemandDeadlines = DemandDeadlines {
    pay_by_time: 1_700_000_600_000,
    submit_result_time: 1_700_001_200_000,
    unlock_time: 1_700_002_000_000,
    external_dispute_unlock_time: 1_700_003_000_000,
};

/// Scripted payment provider: demands get references `pay_001`, `pay_002`,
/// ... and stay `pending` until the test flips them with [`confirm`].
pub struct MockProvider {
    created: AtomicUsize,
    reject_create: bool,
    statuses: Mutex<HashMap<String, PaymentStatus>>,
    fulfilled: Mutex<Vec<(String, String)>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            created: AtomicUsize::new(0),
            reject_create: false,
            statuses: Mutex::new(HashMap::new()),
            fulfilled: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_create: true,
            ..Self::new()
        }
    }

    pub fn confirm(&self, reference: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(reference.to_string(), PaymentStatus::Confirmed);
    }

    pub fn created_demands(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn fulfillments(&self) -> Vec<(String, String)> {
        self.fulfilled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_demand(&self, _request: DemandRequest) -> Result<PaymentDemand, ProviderError> {
        if self.reject_create {
            return Err(ProviderError::Rejected(
                "insufficient agent balance".to_string(),
            ));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentDemand {
            reference: format!("pay_{n:03}"),
            deadlines: DEADLINES,
        })
    }

    async fn check_status(&self, reference: &str) -> Result<PaymentStatus, ProviderError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(reference)
            .copied()
            .unwrap_or(PaymentStatus::Pending))
    }

    async fn fulfill(&self, reference: &str, result: &str) -> Result<(), ProviderError> {
        self.fulfilled
            .lock()
            .unwrap()
            .push((reference.to_string(), result.to_string()));
        Ok(())
    }
}

pub enum Response {
    Fixed(String),
    Echo,
    Fail(String),
}

/// Executor that counts invocations and answers per the scripted response.
pub struct RecordingExecutor {
    calls: AtomicUsize,
    response: Response,
}

impl RecordingExecutor {
    pub fn answering(result: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Response::Fixed(result.to_string()),
        }
    }

    pub fn echoing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Response::Echo,
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Response::Fail(error.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for RecordingExecutor {
    async fn execute(&self, query: &str) -> Result<String, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        match &self.response {
            Response::Fixed(result) => Ok(result.clone()),
            Response::Echo => Ok(format!("answer: {query}")),
            Response::Fail(error) => Err(ExecutionError(error.clone())),
        }
    }
}

/// Poll the engine until the job settles, or fail the test after 2 seconds.
pub async fn wait_for_terminal(engine: &JobEngine, job_id: &JobId) -> StatusView {
    for _ in 0..200 {
        let view = engine.get_status(job_id).await.unwrap();
        if view.status.is_terminal() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}
