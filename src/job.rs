use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque job identifier, generated once at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    AwaitingPayment,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Last-observed status of the payment demand, as reported by the provider.
/// Independent axis from [`JobStatus`]; merged opportunistically on inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Completed,
    Unknown,
    Error,
}

impl PaymentStatus {
    /// Whether the payment has cleared sufficiently to run the task.
    pub fn is_confirmed(self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Completed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Unknown => "unknown",
            PaymentStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// One caller-submitted query tracked from creation to a terminal outcome.
///
/// Transitions are monotonic: `awaiting_payment -> running -> {completed |
/// failed}`. The `mark_*` methods return whether the transition applied, so
/// stale or duplicate signals degrade to no-ops instead of corrupting state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub requester_id: String,
    pub input: String,
    pub status: JobStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: String,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(
        job_id: JobId,
        requester_id: String,
        input: String,
        payment_reference: String,
    ) -> Self {
        Self {
            job_id,
            requester_id,
            input,
            status: JobStatus::AwaitingPayment,
            payment_status: PaymentStatus::Pending,
            payment_reference,
            result: None,
            error: None,
        }
    }

    /// Payment confirmed; begin execution. Only valid from `awaiting_payment`.
    pub fn mark_running(&mut self) -> bool {
        if self.status != JobStatus::AwaitingPayment {
            return false;
        }
        self.status = JobStatus::Running;
        self.payment_status = PaymentStatus::Confirmed;
        true
    }

    /// Executor succeeded and the payment was fulfilled. Only valid from `running`.
    pub fn mark_completed(&mut self, result: String) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Completed;
        self.payment_status = PaymentStatus::Completed;
        self.result = Some(result);
        true
    }

    /// Executor or fulfillment failed. Only valid from `running`.
    pub fn mark_failed(&mut self, error: String) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Failed;
        // A failed job always carries a non-empty error string.
        self.error = Some(if error.is_empty() {
            "unspecified failure".to_string()
        } else {
            error
        });
        true
    }

    /// Best-effort refresh of the payment axis; never touches `status`.
    pub fn record_payment_status(&mut self, observed: PaymentStatus) {
        self.payment_status = observed;
    }
}
