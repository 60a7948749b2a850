use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::pipeline::orchestration::analysis_context::AnalysisContext;
use crate::pipeline::orchestration::processing_step::ProcessingStep;
use crate::pipeline::orchestration::step::{
    CompressionStep, CycleCountStep, ExtremaStep, MetricExtractionStep, SimilarityStep,
};
use crate::pipeline::session::{CompletedCapture, GestureProtocol};
use crate::pipeline::similarity::DtwOptions;
use crate::pipeline::types::{MotionData, SessionReport};

/// Post-capture chain: steps run in insertion order over one shared context.
pub struct AnalysisPipeline {
    steps: IndexMap<&'static str, Box<dyn ProcessingStep>>,
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self {
            steps: IndexMap::new(),
        }
    }

    /// Extraction, cycle count, extrema and compression for a protocol.
    pub fn standard(protocol: &GestureProtocol, target_length: usize) -> Self {
        Self::new()
            .add_step(Box::new(MetricExtractionStep::new(protocol.motion_channels())))
            .add_step(Box::new(CycleCountStep))
            .add_step(Box::new(ExtremaStep))
            .add_step(Box::new(CompressionStep::new(target_length)))
    }

    pub fn with_reference(
        self,
        reference: Arc<MotionData>,
        channels: Vec<String>,
        options: DtwOptions,
    ) -> Self {
        self.add_step(Box::new(SimilarityStep::new(reference, channels, options)))
    }

    /// A step with the same name replaces the earlier one in place.
    pub fn add_step(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.insert(step.name(), step);
        self
    }

    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.keys().copied()
    }

    #[instrument(skip(self, context), fields(session_id = %context.session_id))]
    pub async fn process(
        &mut self,
        mut context: AnalysisContext,
    ) -> Result<AnalysisContext, AppError> {
        let start = Instant::now();
        for (name, step) in &mut self.steps {
            let step_start = Instant::now();
            step.process(&mut context).await?;
            let elapsed = step_start.elapsed();
            context.step_durations.insert(*name, elapsed);
            debug!("Completed step '{}' in {}us", name, elapsed.as_micros());
        }
        debug!(
            "Analysis finished in {}us with {} failed channel(s)",
            start.elapsed().as_micros(),
            context.failures.len()
        );
        Ok(context)
    }

    pub async fn analyze(
        &mut self,
        capture: CompletedCapture,
        protocol: GestureProtocol,
    ) -> Result<SessionReport, AppError> {
        let context = self.process(AnalysisContext::new(capture, protocol)).await?;
        Ok(context.into_report()?)
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
