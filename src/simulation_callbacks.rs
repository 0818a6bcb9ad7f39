//! Simulation callbacks interface and implementations to define how simulator should behave on
//! start, step, finish and when it should stop running.

use log::debug;

use crate::simulator::CloudSimulation;

pub trait SimulationCallbacks {
    /// Runs before starting a simulation run.
    fn on_simulation_start(&mut self, _sim: &mut CloudSimulation) {}

    /// Runs before each step of a simulation run, returns false if the simulation must be stopped.
    fn on_step(&mut self, _sim: &mut CloudSimulation) -> bool {
        true
    }

    /// Runs upon the completion of a simulation run.
    fn on_simulation_finish(&mut self, _sim: &mut CloudSimulation) {}
}

/// Returns true if all submitted tasks are terminated.
fn check_all_tasks_terminated(sim: &CloudSimulation) -> bool {
    let metrics = sim.metrics_collector.borrow();
    debug!(
        "Processed {} out of {} tasks",
        metrics.internal.terminated_tasks, metrics.total_tasks
    );
    metrics.all_tasks_terminated()
}

/// Stops as soon as every task reached a terminal state, checking every `check_period` steps.
pub struct RunUntilAllTasksAreFinishedCallbacks {
    check_period: u64,
    steps: u64,
}

impl RunUntilAllTasksAreFinishedCallbacks {
    pub fn new(check_period: u64) -> Self {
        Self {
            check_period: check_period.max(1),
            steps: 0,
        }
    }
}

impl Default for RunUntilAllTasksAreFinishedCallbacks {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SimulationCallbacks for RunUntilAllTasksAreFinishedCallbacks {
    fn on_step(&mut self, sim: &mut CloudSimulation) -> bool {
        self.steps += 1;
        if self.steps % self.check_period == 0 {
            return !check_all_tasks_terminated(sim);
        }
        true
    }

    fn on_simulation_finish(&mut self, sim: &mut CloudSimulation) {
        let metrics = sim.metrics_collector.borrow();
        assert_eq!(
            metrics.internal.terminated_tasks,
            metrics.tasks_succeeded + metrics.tasks_failed
        );
    }
}

/// Stops before processing the first event past `until_time`.
pub struct RunUntilTimeCallbacks {
    until_time: f64,
}

impl RunUntilTimeCallbacks {
    pub fn new(until_time: f64) -> Self {
        Self { until_time }
    }
}

impl SimulationCallbacks for RunUntilTimeCallbacks {
    fn on_step(&mut self, sim: &mut CloudSimulation) -> bool {
        match sim.next_event_time() {
            Some(time) => time <= self.until_time,
            None => true,
        }
    }
}
