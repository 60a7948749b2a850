pub mod analysis_context;
pub mod processing_pipeline;
pub mod processing_step;
pub mod step;

pub use analysis_context::AnalysisContext;
pub use processing_pipeline::AnalysisPipeline;
pub use processing_step::ProcessingStep;
