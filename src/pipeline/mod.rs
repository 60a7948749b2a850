pub mod gesture;
pub mod metrics;
pub mod normalize;
pub mod orchestration;
pub mod session;
pub mod similarity;
pub mod types;

pub use orchestration::AnalysisPipeline;
pub use session::{CaptureSession, GestureProtocol, ProtocolKind};
pub use types::{MotionData, SessionReport, SessionSummary};
