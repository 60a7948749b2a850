use async_trait::async_trait;

use crate::error::AppError;
use crate::pipeline::metrics::{speed, MetricChannel, MetricExtractor};
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;

/// Extracts every configured channel, plus the time derivative of the protocol's
/// primary channel.
pub struct MetricExtractionStep {
    channels: Vec<MetricChannel>,
}

impl MetricExtractionStep {
    pub fn new(channels: Vec<MetricChannel>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl ProcessingStep for MetricExtractionStep {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError> {
        for channel in &self.channels {
            match MetricExtractor::new(channel.clone()).extract(&context.sequence) {
                Ok(series) => {
                    context.series.insert(channel.name.clone(), series);
                }
                Err(err) => context.record_failure(channel.name.clone(), err),
            }
        }

        let primary = context.protocol.channel.name.clone();
        let derivative = context.primary_series().map(speed);
        match derivative {
            Some(Ok(series)) => {
                context.series.insert(series.name().to_string(), series);
            }
            Some(Err(err)) => context.record_failure(format!("{primary}_speed"), err),
            None => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "metric_extraction"
    }
}
