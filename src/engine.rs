use crate::config::EngineConfig;
use crate::error::JobError;
use crate::executor::ExecutorRef;
use crate::job::{Job, JobId, JobStatus, PaymentStatus};
use crate::monitor::{self, MonitorSet};
use crate::provider::{DemandDeadlines, DemandRequest, ProviderRef};
use crate::store::JobStoreRef;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What the caller gets back from a successful job creation. Deadlines are
/// the provider's own timing metadata, passed through verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct JobReceipt {
    pub job_id: JobId,
    pub payment_reference: String,
    pub deadlines: DemandDeadlines,
}

/// Merged job-plus-payment view returned on status inquiries. `result` is
/// populated only for completed jobs, `error` only for failed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Job> for StatusView {
    fn from(job: Job) -> Self {
        let (result, error) = match job.status {
            JobStatus::Completed => (job.result, None),
            JobStatus::Failed => (None, job.error),
            _ => (None, None),
        };
        Self {
            job_id: job.job_id,
            status: job.status,
            payment_status: job.payment_status,
            result,
            error,
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    store: JobStoreRef,
    provider: ProviderRef,
    executor: ExecutorRef,
    monitors: Arc<MonitorSet>,
}

/// The payment-gated job lifecycle controller.
///
/// Owns the job table and the active-monitor set. Each created job gets a
/// watcher task that polls the provider; confirmations arrive on a channel
/// consumed by a dispatcher task, which runs the confirmation handler in its
/// own task so jobs never serialize against each other.
pub struct JobEngine {
    inner: Arc<EngineInner>,
    confirmations: mpsc::UnboundedSender<JobId>,
}

impl JobEngine {
    pub fn new(
        config: EngineConfig,
        store: JobStoreRef,
        provider: ProviderRef,
        executor: ExecutorRef,
    ) -> Self {
        let (confirmations, mut rx) = mpsc::unbounded_channel::<JobId>();
        let inner = Arc::new(EngineInner {
            config,
            store,
            provider,
            executor,
            monitors: Arc::new(MonitorSet::new()),
        });

        // Dispatcher: drains the confirmation channel for the engine's
        // lifetime. Exits once the engine (the last sender) is dropped.
        let dispatcher = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(job_id) = rx.recv().await {
                let inner = Arc::clone(&dispatcher);
                tokio::spawn(inner.handle_confirmation(job_id));
            }
        });

        Self {
            inner,
            confirmations,
        }
    }

    /// Validate the query, open a payment demand, persist the record and
    /// start watching the payment. Provider failure leaves no partial state.
    pub async fn create_job(
        &self,
        requester_id: &str,
        input: &str,
    ) -> Result<JobReceipt, JobError> {
        let input = input.trim();
        let min = self.inner.config.min_input_len;
        if input.chars().count() < min {
            return Err(JobError::Validation(format!(
                "input text must contain at least {min} characters"
            )));
        }

        let job_id = JobId::new();
        let demand = self
            .inner
            .provider
            .create_demand(DemandRequest {
                amount: self.inner.config.price,
                unit: self.inner.config.unit.clone(),
                job_id: job_id.clone(),
                requester_id: requester_id.to_string(),
            })
            .await?;

        let job = Job::new(
            job_id.clone(),
            requester_id.to_string(),
            input.to_string(),
            demand.reference.clone(),
        );
        self.inner.store.insert(job).await?;

        let stop = self.inner.monitors.register(job_id.clone());
        monitor::spawn_watcher(
            job_id.clone(),
            demand.reference.clone(),
            Arc::clone(&self.inner.provider),
            Arc::clone(&self.inner.monitors),
            self.confirmations.clone(),
            stop,
            self.inner.config.poll_interval,
            self.inner.config.awaiting_payment_timeout,
        );

        info!(%job_id, reference = %demand.reference, "job created, awaiting payment");
        Ok(JobReceipt {
            job_id,
            payment_reference: demand.reference,
            deadlines: demand.deadlines,
        })
    }

    /// Status inquiry. While a monitor is active the payment axis is
    /// refreshed from the provider first; a failed refresh degrades the
    /// payment status instead of failing the inquiry.
    pub async fn get_status(&self, job_id: &JobId) -> Result<StatusView, JobError> {
        let job = self
            .inner
            .store
            .get(job_id)
            .await
            .ok_or_else(|| JobError::NotFound(job_id.clone()))?;

        if !self.inner.monitors.is_active(job_id) {
            return Ok(StatusView::from(job));
        }

        let observed = match self.inner.provider.check_status(&job.payment_reference).await {
            Ok(status) => status,
            Err(err) => {
                warn!(%job_id, %err, "payment status refresh failed");
                PaymentStatus::Unknown
            }
        };
        let refreshed = self
            .inner
            .store
            .update(
                job_id,
                Box::new(move |j| {
                    j.record_payment_status(observed);
                    true
                }),
            )
            .await
            .map(|(_, job)| job)
            .unwrap_or(job);
        Ok(StatusView::from(refreshed))
    }

    /// Stop watching the payment for an in-flight job. Returns whether a
    /// monitor was still active; calling it again (or on a settled job) is a
    /// no-op. The record itself is left untouched.
    pub async fn cancel_job(&self, job_id: &JobId) -> Result<bool, JobError> {
        if self.inner.store.get(job_id).await.is_none() {
            return Err(JobError::NotFound(job_id.clone()));
        }
        let stopped = self.inner.monitors.stop(job_id);
        if stopped {
            info!(%job_id, "payment monitor cancelled");
        }
        Ok(stopped)
    }

    /// Number of jobs currently being watched for payment.
    pub fn active_monitors(&self) -> usize {
        self.inner.monitors.len()
    }

    #[cfg(test)]
    fn inject_confirmation(&self, job_id: JobId) {
        self.confirmations.send(job_id).expect("dispatcher gone");
    }
}

impl EngineInner {
    async fn handle_confirmation(self: Arc<Self>, job_id: JobId) {
        self.run_confirmed(&job_id).await;
        // Whatever happened above, a job past confirmation must not keep a
        // live watcher.
        self.monitors.stop(&job_id);
    }

    async fn run_confirmed(&self, job_id: &JobId) {
        let Some((started, job)) = self
            .store
            .update(job_id, Box::new(|j| j.mark_running()))
            .await
        else {
            warn!(%job_id, "confirmation for unknown job");
            return;
        };
        if !started {
            warn!(%job_id, status = ?job.status, "stale confirmation ignored");
            return;
        }

        info!(%job_id, "payment confirmed, running task");
        let terminal = match self.executor.execute(&job.input).await {
            Ok(result) => match self.provider.fulfill(&job.payment_reference, &result).await {
                Ok(()) => {
                    self.store
                        .update(job_id, Box::new(move |j| j.mark_completed(result)))
                        .await
                }
                Err(err) => {
                    let error = format!("fulfillment failed: {err}");
                    self.store
                        .update(job_id, Box::new(move |j| j.mark_failed(error)))
                        .await
                }
            },
            Err(err) => {
                let error = err.to_string();
                self.store
                    .update(job_id, Box::new(move |j| j.mark_failed(error)))
                    .await
            }
        };

        match terminal {
            Some((_, job)) => info!(%job_id, status = ?job.status, "job settled"),
            None => warn!(%job_id, "job record vanished during execution"),
        }
    }
}
