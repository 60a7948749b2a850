pub mod classifier;
pub mod cycle_counter;
pub mod trigger;

pub use classifier::{classify, Thresholds};
pub use cycle_counter::{count_cycles, CycleCounter, GestureStateMachine, GestureUpdate};
pub use trigger::{
    ImmediateTrigger, OkGestureTrigger, OpenPalmTrigger, TriggerDetector, TriggerKind,
};
