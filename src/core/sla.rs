//! Deadline accounting over finished tasks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::common::{TaskId, VmId};
use crate::core::error::SimulationError;
use crate::core::task::{Task, TaskStatus};

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Report {
    pub total_tasks: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub violation_count: u64,
    pub total_penalty: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TaskResultRow {
    pub id: TaskId,
    pub vm_id: VmId,
    pub status: TaskStatus,
    pub actual_execution_time: f64,
    pub deadline: f64,
    pub violated: bool,
}

/// A task violates its SLA only if it succeeded and ran longer than its deadline.
/// Failed tasks never completed, so they are not judged against a completion deadline.
pub fn is_violated(task: &Task, deadline: f64) -> bool {
    task.status() == TaskStatus::Success
        && task.actual_execution_time().unwrap_or(0.0) > deadline
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlaEvaluator {
    penalty_per_violation: f64,
}

impl SlaEvaluator {
    pub fn new(penalty_per_violation: f64) -> Self {
        Self {
            penalty_per_violation,
        }
    }

    pub fn penalty_per_violation(&self) -> f64 {
        self.penalty_per_violation
    }

    /// Aggregates counters over terminal tasks. Non-terminal tasks are ignored.
    pub fn evaluate(
        &self,
        finished: &[Task],
        deadlines: &BTreeMap<TaskId, f64>,
    ) -> Result<Report, SimulationError> {
        let mut report = Report::default();
        for task in finished.iter().filter(|task| task.status().is_terminal()) {
            report.total_tasks += 1;
            if task.status() == TaskStatus::Failed {
                report.failure_count += 1;
                continue;
            }
            report.success_count += 1;
            if is_violated(task, deadline_of(task.id(), deadlines)?) {
                report.violation_count += 1;
            }
        }
        report.total_penalty = report.violation_count as f64 * self.penalty_per_violation;
        Ok(report)
    }

    /// One row per terminal task, in the order of `finished`.
    pub fn result_rows(
        &self,
        finished: &[Task],
        deadlines: &BTreeMap<TaskId, f64>,
    ) -> Result<Vec<TaskResultRow>, SimulationError> {
        finished
            .iter()
            .filter(|task| task.status().is_terminal())
            .map(|task| {
                let deadline = deadline_of(task.id(), deadlines)?;
                Ok(TaskResultRow {
                    id: task.id(),
                    vm_id: task
                        .vm_id()
                        .ok_or(SimulationError::UnassignedTask { task_id: task.id() })?,
                    status: task.status(),
                    actual_execution_time: task.actual_execution_time().unwrap_or(0.0),
                    deadline,
                    violated: is_violated(task, deadline),
                })
            })
            .collect()
    }
}

fn deadline_of(task_id: TaskId, deadlines: &BTreeMap<TaskId, f64>) -> Result<f64, SimulationError> {
    deadlines
        .get(&task_id)
        .copied()
        .ok_or(SimulationError::MissingDeadline(task_id))
}
