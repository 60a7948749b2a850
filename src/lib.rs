pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod storage;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder, SessionEvent};
pub use error::AppError;
