use async_trait::async_trait;

use crate::error::AppError;
use crate::pipeline::gesture::count_cycles;
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;

pub struct CycleCountStep;

#[async_trait]
impl ProcessingStep for CycleCountStep {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError> {
        let thresholds = context.protocol.thresholds;
        context.cycle_count = context
            .primary_series()
            .map(|series| count_cycles(series.values().iter().copied(), thresholds));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cycle_count"
    }
}
