//! Task (cloudlet) primitive and its lifecycle.

use serde::{Deserialize, Serialize};

use crate::core::common::{TaskId, VmId};
use crate::core::error::SimulationError;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Created,
    Submitted,
    Running,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

/// Description of a task handed to the broker before simulation start.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TaskSpec {
    pub id: TaskId,
    /// Workload in abstract instructions.
    pub length: u64,
    pub pes: u32,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
    /// Time at which the task arrives at the broker.
    #[serde(default)]
    pub submission_time: f64,
    /// Time budget for the execution, used only for SLA scoring.
    pub deadline: f64,
}

impl TaskSpec {
    pub fn new(id: TaskId, length: u64, deadline: f64) -> Self {
        Self {
            id,
            length,
            pes: 1,
            ram: 0,
            bw: 0,
            storage: 0,
            submission_time: 0.0,
            deadline,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Task {
    id: TaskId,
    length: u64,
    pes: u32,
    ram: u64,
    bw: u64,
    storage: u64,
    submission_time: f64,
    status: TaskStatus,
    vm_id: Option<VmId>,
    exec_start_time: Option<f64>,
    finish_time: Option<f64>,
    actual_execution_time: Option<f64>,
}

impl Task {
    pub fn new(spec: &TaskSpec) -> Self {
        Self {
            id: spec.id,
            length: spec.length,
            pes: spec.pes,
            ram: spec.ram,
            bw: spec.bw,
            storage: spec.storage,
            submission_time: spec.submission_time,
            status: TaskStatus::Created,
            vm_id: None,
            exec_start_time: None,
            finish_time: None,
            actual_execution_time: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn vm_id(&self) -> Option<VmId> {
        self.vm_id
    }

    pub fn pes(&self) -> u32 {
        self.pes
    }

    pub fn ram(&self) -> u64 {
        self.ram
    }

    pub fn bw(&self) -> u64 {
        self.bw
    }

    pub fn storage(&self) -> u64 {
        self.storage
    }

    pub fn submission_time(&self) -> f64 {
        self.submission_time
    }

    pub fn exec_start_time(&self) -> Option<f64> {
        self.exec_start_time
    }

    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    /// Time between start on the VM and the terminal transition. Set once, at that transition.
    pub fn actual_execution_time(&self) -> Option<f64> {
        self.actual_execution_time
    }

    /// Replaces the workload. Only possible before the task is handed to a VM.
    pub fn replace_length(&mut self, length: u64) -> Result<(), SimulationError> {
        if self.status != TaskStatus::Created && self.status != TaskStatus::Submitted {
            return Err(self.illegal(TaskStatus::Submitted));
        }
        self.length = length;
        Ok(())
    }

    pub fn mark_submitted(&mut self) -> Result<(), SimulationError> {
        self.transit(TaskStatus::Created, TaskStatus::Submitted)
    }

    pub fn mark_running(&mut self, vm_id: VmId, now: f64) -> Result<(), SimulationError> {
        self.transit(TaskStatus::Submitted, TaskStatus::Running)?;
        self.vm_id = Some(vm_id);
        self.exec_start_time = Some(now);
        Ok(())
    }

    /// Terminal transition to `Success` or `Failed`.
    pub fn finish(&mut self, status: TaskStatus, now: f64) -> Result<(), SimulationError> {
        if !status.is_terminal() {
            return Err(self.illegal(status));
        }
        self.transit(TaskStatus::Running, status)?;
        let started = self.exec_start_time.unwrap_or(now);
        self.finish_time = Some(now);
        self.actual_execution_time = Some(now - started);
        Ok(())
    }

    fn transit(&mut self, from: TaskStatus, to: TaskStatus) -> Result<(), SimulationError> {
        if self.status != from {
            return Err(self.illegal(to));
        }
        self.status = to;
        Ok(())
    }

    fn illegal(&self, to: TaskStatus) -> SimulationError {
        SimulationError::IllegalTransition {
            task_id: self.id,
            from: self.status,
            to,
        }
    }
}
