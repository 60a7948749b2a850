use crate::error::AppError;
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use async_trait::async_trait;

/// One link of the post-capture chain. Channel-level problems are recorded on the context;
/// an `Err` stops the whole chain.
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError>;
    fn name(&self) -> &'static str;
}
