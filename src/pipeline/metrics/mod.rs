pub mod extractor;
pub mod extrema;
pub mod reduction;

pub use extractor::{speed, MetricExtractor};
pub use extrema::find_extrema;
pub use reduction::{Axis, MetricChannel, Reduction, MIN_REFERENCE_DISTANCE};
