use async_trait::async_trait;
use crate::error::Result;
use crate::llm::prompts::ClassificationRequest;
use crate::models::OracleVerdict;

/// A remote classifier consulted per record. Never a hard dependency of the pipeline.
#[async_trait]
pub trait OracleProvider: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<OracleVerdict>;
    fn name(&self) -> &str;

    /// `None` on any failure; callers fall back to the heuristic classifier.
    async fn try_classify(&self, request: &ClassificationRequest) -> Option<OracleVerdict> {
        match self.classify(request).await {
            Ok(verdict) => Some(verdict),
            Err(e) if e.is_oracle_failure() => {
                tracing::info!("{} unavailable, using heuristic: {}", self.name(), e);
                None
            }
            Err(e) => {
                tracing::warn!("{} failed unexpectedly, using heuristic: {}", self.name(), e);
                None
            }
        }
    }
}
