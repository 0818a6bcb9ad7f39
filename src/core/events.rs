//! Events processed by the simulation loop. Each event is handled completely before the next one
//! is taken from the queue.

use serde::Serialize;

use crate::core::common::{EventId, TaskId, VmId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum EventData {
    /// Task arrives at the broker: failure injection runs, then the task is assigned to a VM.
    TaskArrival { task_id: TaskId },
    /// Task has processed its whole workload on the VM at its current share of the VM rate.
    /// Rescheduled (cancelled and re-emitted) whenever the share changes.
    TaskCompletion { task_id: TaskId, vm_id: VmId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub time: f64,
    pub data: EventData,
}
