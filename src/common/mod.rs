pub mod landmark;
pub mod skeleton;

pub use landmark::{
    Landmark, LandmarkFrame, LandmarkSequence, Observation, PersistedSequence, SequenceBuilder,
};
pub use skeleton::SkeletonLayout;
