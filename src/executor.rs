use crate::error::ExecutionError;
use async_trait::async_trait;
use std::sync::Arc;

pub type ExecutorRef = Arc<dyn TaskExecutor>;

/// The delegated query-answering capability. May be an arbitrary multi-stage
/// pipeline behind the scenes; the engine only sees text in, text out.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<String, ExecutionError>;
}
