use serde::Serialize;

use crate::pipeline::gesture::classifier::Thresholds;
use crate::pipeline::types::GestureState;

/// Counts confirmed Open -> Closed transitions. Undetermined samples never touch
/// `last_confirmed`, so flicker through the dead zone cannot fake a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleCounter {
    count: u32,
    last_confirmed: Option<GestureState>,
}

impl CycleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_confirmed(&self) -> Option<GestureState> {
        self.last_confirmed
    }

    /// Returns true when this sample completed a cycle.
    pub fn observe(&mut self, state: GestureState) -> bool {
        if !state.is_confirmed() {
            return false;
        }
        let completed =
            self.last_confirmed == Some(GestureState::Open) && state == GestureState::Closed;
        if completed {
            self.count += 1;
        }
        self.last_confirmed = Some(state);
        completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureUpdate {
    pub state: GestureState,
    pub cycle_count: u32,
    pub cycle_completed: bool,
}

/// Classifier plus counter, fed one sample at a time in time order.
#[derive(Debug, Clone)]
pub struct GestureStateMachine {
    thresholds: Thresholds,
    counter: CycleCounter,
}

impl GestureStateMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            counter: CycleCounter::new(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn counter(&self) -> &CycleCounter {
        &self.counter
    }

    pub fn cycle_count(&self) -> u32 {
        self.counter.count()
    }

    pub fn update(&mut self, value: f64) -> GestureUpdate {
        let state = self.thresholds.classify(value);
        let cycle_completed = self.counter.observe(state);
        GestureUpdate {
            state,
            cycle_count: self.counter.count(),
            cycle_completed,
        }
    }
}

/// Post-hoc tally: the live machine run over a whole series.
pub fn count_cycles(values: impl IntoIterator<Item = f64>, thresholds: Thresholds) -> u32 {
    let mut machine = GestureStateMachine::new(thresholds);
    for value in values {
        machine.update(value);
    }
    machine.cycle_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use crate::pipeline::types::GestureState::{Closed, Open, Undetermined};

    #[test]
    fn tapping_scenario_counts_one_cycle() {
        let thresholds = Thresholds::new(0.5, 0.8).unwrap();
        let mut machine = GestureStateMachine::new(thresholds);
        let states: Vec<GestureState> = [0.9, 0.9, 0.6, 0.1, 0.1, 0.9]
            .into_iter()
            .map(|v| machine.update(v).state)
            .collect();
        assert_eq!(states, vec![Open, Open, Undetermined, Closed, Closed, Open]);
        assert_eq!(machine.cycle_count(), 1);
    }

    #[test]
    fn no_confirmed_samples_means_zero() {
        let thresholds = Thresholds::finger_tapping();
        assert_eq!(count_cycles([0.6, 0.7, 0.65], thresholds), 0);
        assert_eq!(count_cycles(std::iter::empty(), thresholds), 0);
    }

    #[test]
    fn closed_first_does_not_count() {
        let thresholds = Thresholds::finger_tapping();
        assert_eq!(count_cycles([0.1, 0.9, 0.1, 0.1, 0.9, 0.2], thresholds), 2);
    }

    #[test]
    fn undetermined_insertions_do_not_change_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counter = CycleCounter::new();
        let mut padded = CycleCounter::new();
        for _ in 0..500 {
            let state = if rng.random_bool(0.5) { Open } else { Closed };
            counter.observe(state);
            padded.observe(state);
            for _ in 0..rng.random_range(0..4) {
                padded.observe(Undetermined);
            }
        }
        assert_eq!(counter.count(), padded.count());
        assert_eq!(counter.last_confirmed(), padded.last_confirmed());
    }

    #[test]
    fn undetermined_keeps_last_confirmed() {
        let mut counter = CycleCounter::new();
        counter.observe(Open);
        assert!(!counter.observe(Undetermined));
        assert_eq!(counter.last_confirmed(), Some(Open));
        assert!(counter.observe(Closed));
        assert_eq!(counter.count(), 1);
    }
}
