use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AnalysisError, AppError};
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;
use crate::pipeline::similarity::{compare_motion, shared_channels, DtwOptions};
use crate::pipeline::types::MotionData;

/// Scores the compressed capture against a reference artifact, channel by channel.
/// An empty channel list compares every channel both artifacts carry.
pub struct SimilarityStep {
    reference: Arc<MotionData>,
    channels: Vec<String>,
    options: DtwOptions,
}

impl SimilarityStep {
    pub fn new(reference: Arc<MotionData>, channels: Vec<String>, options: DtwOptions) -> Self {
        Self {
            reference,
            channels,
            options,
        }
    }
}

#[async_trait]
impl ProcessingStep for SimilarityStep {
    async fn process(&mut self, context: &mut AnalysisContext) -> Result<(), AppError> {
        let Some(motion) = context.motion.clone() else {
            return Err(AppError::Pipeline(
                "similarity needs the compressed motion artifact".to_string(),
            ));
        };
        let channels = if self.channels.is_empty() {
            shared_channels(&motion, &self.reference)
        } else {
            self.channels.clone()
        };
        match compare_motion(Arc::new(motion), self.reference.clone(), &channels, self.options)
            .await
        {
            Ok(report) => context.similarity = Some(report),
            Err(AnalysisError::Incomplete(failures)) => {
                for failure in failures {
                    context.record_failure(failure.channel, failure.reason);
                }
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "similarity"
    }
}
