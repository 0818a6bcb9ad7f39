//! Implements centralized storage for metrics. Any component may access this component to
//! report metrics about tasks, VMs, etc.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

#[derive(Debug, Default)]
pub struct EstimatorWrapper {
    estimator: Estimator,
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mean", &self.mean)
            .field("population_variance", &self.population_variance)
            .finish()
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
    }

    pub fn count(&self) -> u64 {
        self.estimator.mean.len()
    }

    pub fn min(&self) -> f64 {
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        self.estimator.population_variance()
    }
}

impl PartialEq for EstimatorWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.count() == other.count()
            && self.min() == other.min()
            && self.max() == other.max()
            && self.mean() == other.mean()
            && self.population_variance() == other.population_variance()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct InternalMetrics {
    /// The number of tasks that reached SUCCESS or FAILED. Increases with the progress of
    /// simulation.
    pub terminated_tasks: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct MetricsCollector {
    /// The number of tasks submitted to the broker. Known before simulation starts.
    pub total_tasks: u64,
    /// The number of VMs placed in the datacenter.
    pub vms_created: u64,
    /// The number of VMs destroyed at the end of the simulation.
    pub vms_destroyed: u64,
    /// The number of tasks which finished with success.
    pub tasks_succeeded: u64,
    /// The number of tasks which finished as failed.
    pub tasks_failed: u64,
    /// The number of tasks selected by the failure injector.
    pub injected_failures: u64,

    /// Cost of resources held by VMs.
    pub vm_cost: f64,
    /// Cost of task processing (execution time and bandwidth).
    pub processing_cost: f64,

    /// Estimations for the actual task execution time.
    pub task_execution_time_stats: EstimatorWrapper,

    pub internal: InternalMetrics,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn increment_task_execution_time(&mut self, value: f64) {
        self.task_execution_time_stats.add(value);
    }

    pub fn all_tasks_terminated(&self) -> bool {
        self.internal.terminated_tasks >= self.total_tasks
    }
}

#[cfg(test)]
mod tests {
    use super::EstimatorWrapper;

    #[test]
    fn test_estimator_stats() {
        let mut estimator = EstimatorWrapper::new();
        for value in [80.0, 80.0, 40.0, 120.0] {
            estimator.add(value);
        }
        assert_eq!(4, estimator.count());
        assert_eq!(40.0, estimator.min());
        assert_eq!(120.0, estimator.max());
        assert_eq!(80.0, estimator.mean());
        assert!((estimator.population_variance() - 800.0).abs() < 1e-9);
    }
}
