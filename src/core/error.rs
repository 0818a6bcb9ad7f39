//! Errors raised by the simulation engine.

use thiserror::Error;

use crate::core::common::{TaskId, VmId};
use crate::core::task::TaskStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// No host has enough free PE rate, RAM, bandwidth or storage for the VM.
    #[error("insufficient capacity: no host can place vm {vm_id}")]
    InsufficientCapacity { vm_id: VmId },

    /// The event loop was advanced with nothing pending.
    #[error("event queue is empty")]
    EmptyQueue,

    /// A task reached SUBMITTED but was never handed to a VM.
    #[error("task {task_id} was submitted but never assigned to a vm")]
    UnassignedTask { task_id: TaskId },

    /// An event was scheduled earlier than the current clock.
    #[error("cannot schedule event at {at} before current time {now}")]
    InvalidSchedule { at: f64, now: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("unknown vm {0}")]
    UnknownVm(VmId),

    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),

    #[error("duplicate vm id {0}")]
    DuplicateVm(VmId),

    #[error("no vms were submitted to the broker")]
    NoVmsAvailable,

    #[error("illegal transition of task {task_id} from {from:?} to {to:?}")]
    IllegalTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("no deadline registered for task {0}")]
    MissingDeadline(TaskId),
}
