use downcast_rs::{impl_downcast, Downcast};

use crate::core::common::TaskId;
use crate::core::error::SimulationError;
use crate::core::event_queue::EventQueue;

// Policy which shares the compute rate of one VM among the tasks running on it. Implementations
// keep the completion event of every running task in the queue up to date.
pub trait TaskScheduler: Downcast {
    // Total rate of the VM.
    fn capacity(&self) -> f64;

    // Starts a task with `length` instructions at the current queue time.
    fn submit(
        &mut self,
        task_id: TaskId,
        length: f64,
        queue: &mut EventQueue,
    ) -> Result<(), SimulationError>;

    // Removes a task whose completion event has fired.
    fn complete(&mut self, task_id: TaskId, queue: &mut EventQueue)
        -> Result<(), SimulationError>;

    fn running_count(&self) -> usize;

    // Rate currently given to the task, None if it is not running here.
    fn current_rate(&self, task_id: TaskId) -> Option<f64>;
}

impl_downcast!(TaskScheduler);
