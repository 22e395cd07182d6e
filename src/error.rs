use crate::job::JobId;
use thiserror::Error;

/// Failures reported by the payment provider adapter.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("payment demand rejected: {0}")]
    Rejected(String),
}

/// Failure reported by the task executor. Terminal for the job; retry
/// policy, if any, belongs to the executor itself.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ExecutionError(pub String);

#[derive(Error, Debug)]
pub enum JobError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("payment provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
}
