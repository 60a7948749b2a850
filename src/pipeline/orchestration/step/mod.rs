mod compression;
mod cycle_count;
mod extrema;
mod metric_extraction;
mod similarity;

pub use compression::CompressionStep;
pub use cycle_count::CycleCountStep;
pub use extrema::ExtremaStep;
pub use metric_extraction::MetricExtractionStep;
pub use similarity::SimilarityStep;
