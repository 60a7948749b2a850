use async_trait::async_trait;

use crate::error::AppError;
use crate::pipeline::normalize::compress_series;
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;
use crate::pipeline::types::MotionData;

/// Normalizes and resamples every extracted series into the fixed-length motion artifact.
pub struct CompressionStep {
    target_length: usize,
}

impl CompressionStep {
    pub fn new(target_length: usize) -> Self {
        Self { target_length }
    }
}

#[async_trait]
impl ProcessingStep for CompressionStep {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError> {
        let mut motion = MotionData::with_frames(self.target_length);
        let mut failures = Vec::new();
        for (name, series) in &context.series {
            match compress_series(std::slice::from_ref(series), self.target_length) {
                Ok(mut compressed) => {
                    if let Some(values) = compressed.channels.swap_remove(name) {
                        motion.insert(name.clone(), values);
                    }
                }
                Err(err) => failures.push((name.clone(), err)),
            }
        }
        for (name, err) in failures {
            context.record_failure(name, err);
        }
        context.motion = Some(motion);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "compression"
    }
}
