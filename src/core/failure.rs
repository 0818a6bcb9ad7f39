//! Synthetic failure injection.
//!
//! A task selected as failed gets a new random workload and still runs on its VM, competing for
//! the VM rate like any other task. Its result is reported as FAILED whatever its run looks like.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::task::Task;

/// Inclusive range of workload lengths.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct LengthRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FailureDecision {
    Healthy,
    Failed { replacement_length: u64 },
}

impl FailureDecision {
    pub fn is_failed(&self) -> bool {
        matches!(self, FailureDecision::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FailureInjector {
    probability: f64,
    length_range: LengthRange,
}

impl FailureInjector {
    pub fn new(probability: f64, length_range: LengthRange) -> Self {
        Self {
            probability,
            length_range,
        }
    }

    /// Injector that never fails a task.
    pub fn disabled() -> Self {
        Self::new(0.0, LengthRange { min: 0, max: 0 })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draws once from [0, 1) and fails the task if the draw is below the probability.
    /// The replacement length is drawn only for failed tasks.
    pub fn decide<R: Rng + ?Sized>(&self, _task: &Task, rng: &mut R) -> FailureDecision {
        let draw: f64 = rng.gen();
        if draw >= self.probability {
            return FailureDecision::Healthy;
        }
        FailureDecision::Failed {
            replacement_length: rng.gen_range(self.length_range.min..=self.length_range.max),
        }
    }
}
