pub mod protocol;
pub mod recorder;
pub mod state;

pub use protocol::{GestureProtocol, ProtocolKind};
pub use recorder::{CaptureSession, CompletedCapture, SessionUpdate};
pub use state::{AbortReason, SessionPhase};
