use async_trait::async_trait;

use crate::error::AppError;
use crate::pipeline::metrics::find_extrema;
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;

/// Turning points of the primary channel.
pub struct ExtremaStep;

#[async_trait]
impl ProcessingStep for ExtremaStep {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError> {
        let result = context.primary_series().map(|s| find_extrema(s.values()));
        match result {
            Some(Ok(extrema)) => context.extrema = Some(extrema),
            Some(Err(err)) => {
                let channel = format!("{}_extrema", context.protocol.channel.name);
                context.record_failure(channel, err);
            }
            None => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "extrema"
    }
}
