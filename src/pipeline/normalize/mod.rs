pub mod compress;
pub mod resample;
pub mod spatial;

pub use compress::{compress_motion, compress_series, DEFAULT_TARGET_LENGTH};
pub use resample::{resample_temporal, resample_values};
pub use spatial::{normalize_series, normalize_spatial, normalize_unit_range};
