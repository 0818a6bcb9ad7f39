//! Time-shared task scheduler: the VM rate is split evenly among all running tasks.
//!
//! Every task owns exactly one pending completion event. Each time a task starts or finishes,
//! progress of all running tasks is advanced to the current time with the old share, then the
//! stale completion events are canceled and new ones are emitted with the new share.

use std::collections::{BTreeMap, HashMap};

use log::trace;

use crate::core::common::{EventId, TaskId, VmId};
use crate::core::error::SimulationError;
use crate::core::event_queue::EventQueue;
use crate::core::events::EventData;
use crate::core::task_scheduler::interface::TaskScheduler;

#[derive(Clone, Debug, PartialEq)]
struct RunningTask {
    remaining: f64,
}

pub struct TimeSharedScheduler {
    vm_id: VmId,
    capacity: f64,
    running: BTreeMap<TaskId, RunningTask>,
    /// Pending completion event of every running task.
    completion_events: HashMap<TaskId, EventId>,
    last_update: f64,
}

impl TimeSharedScheduler {
    pub fn new(vm_id: VmId, capacity: f64) -> Self {
        Self {
            vm_id,
            capacity,
            running: Default::default(),
            completion_events: Default::default(),
            last_update: 0.0,
        }
    }

    fn share(&self) -> f64 {
        if self.running.is_empty() {
            return 0.0;
        }
        self.capacity / self.running.len() as f64
    }

    /// Instructions left for the task as of the last share change.
    pub fn remaining(&self, task_id: TaskId) -> Option<f64> {
        self.running.get(&task_id).map(|task| task.remaining)
    }

    pub fn completion_event(&self, task_id: TaskId) -> Option<EventId> {
        self.completion_events.get(&task_id).copied()
    }

    pub fn completion_event_count(&self) -> usize {
        self.completion_events.len()
    }

    fn update_progress(&mut self, now: f64) {
        let processed = self.share() * (now - self.last_update);
        for task in self.running.values_mut() {
            task.remaining = (task.remaining - processed).max(0.0);
        }
        self.last_update = now;
    }

    fn reschedule_completions(&mut self, queue: &mut EventQueue) -> Result<(), SimulationError> {
        let share = self.share();
        let now = queue.now();
        for (task_id, task) in self.running.iter() {
            if let Some(stale) = self.completion_events.remove(task_id) {
                queue.cancel(stale);
            }
            let finish_time = now + task.remaining / share;
            let event_id = queue.schedule(
                EventData::TaskCompletion {
                    task_id: *task_id,
                    vm_id: self.vm_id,
                },
                finish_time,
            )?;
            trace!(
                "[{:.3}] vm {}: task {} completes at {:.3} with rate {:.3}",
                now,
                self.vm_id,
                task_id,
                finish_time,
                share
            );
            self.completion_events.insert(*task_id, event_id);
        }
        Ok(())
    }
}

impl TaskScheduler for TimeSharedScheduler {
    fn capacity(&self) -> f64 {
        self.capacity
    }

    fn submit(
        &mut self,
        task_id: TaskId,
        length: f64,
        queue: &mut EventQueue,
    ) -> Result<(), SimulationError> {
        if self.running.contains_key(&task_id) {
            return Err(SimulationError::DuplicateTask(task_id));
        }
        self.update_progress(queue.now());
        self.running.insert(task_id, RunningTask { remaining: length });
        self.reschedule_completions(queue)
    }

    fn complete(
        &mut self,
        task_id: TaskId,
        queue: &mut EventQueue,
    ) -> Result<(), SimulationError> {
        if !self.running.contains_key(&task_id) {
            return Err(SimulationError::UnknownTask(task_id));
        }
        self.update_progress(queue.now());
        self.running.remove(&task_id);
        if let Some(event_id) = self.completion_events.remove(&task_id) {
            // the event that is being processed is already out of the queue
            queue.cancel(event_id);
        }
        self.reschedule_completions(queue)
    }

    fn running_count(&self) -> usize {
        self.running.len()
    }

    fn current_rate(&self, task_id: TaskId) -> Option<f64> {
        self.running.get(&task_id).map(|_| self.share())
    }
}

#[cfg(test)]
mod tests {
    use super::TimeSharedScheduler;
    use crate::core::event_queue::EventQueue;
    use crate::core::events::EventData;
    use crate::core::task_scheduler::interface::TaskScheduler;

    fn complete_next(scheduler: &mut TimeSharedScheduler, queue: &mut EventQueue) -> (u64, f64) {
        let event = queue.advance().unwrap();
        match event.data {
            EventData::TaskCompletion { task_id, .. } => {
                scheduler.complete(task_id, queue).unwrap();
                (task_id, event.time)
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_idle_scheduler_holds_no_events() {
        let scheduler = TimeSharedScheduler::new(0, 1000.0);
        assert_eq!(0, scheduler.running_count());
        assert_eq!(0, scheduler.completion_event_count());
    }

    #[test]
    fn test_single_task_uses_whole_capacity() {
        let mut queue = EventQueue::new();
        let mut scheduler = TimeSharedScheduler::new(0, 1000.0);
        scheduler.submit(1, 5000.0, &mut queue).unwrap();
        assert_eq!(Some(1000.0), scheduler.current_rate(1));
        assert_eq!((1, 5.0), complete_next(&mut scheduler, &mut queue));
        assert_eq!(0, scheduler.completion_event_count());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_departure_speeds_up_remaining_task() {
        let mut queue = EventQueue::new();
        let mut scheduler = TimeSharedScheduler::new(0, 1000.0);
        scheduler.submit(1, 1000.0, &mut queue).unwrap();
        scheduler.submit(2, 3000.0, &mut queue).unwrap();
        assert_eq!(Some(500.0), scheduler.current_rate(2));
        assert_eq!(2, queue.pending_count());

        assert_eq!((1, 2.0), complete_next(&mut scheduler, &mut queue));
        assert_eq!(Some(2000.0), scheduler.remaining(2));
        assert_eq!(Some(1000.0), scheduler.current_rate(2));
        assert_eq!((2, 4.0), complete_next(&mut scheduler, &mut queue));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_arrival_postpones_running_task() {
        let mut queue = EventQueue::new();
        let mut scheduler = TimeSharedScheduler::new(0, 100.0);
        scheduler.submit(1, 1000.0, &mut queue).unwrap();
        let first_event = scheduler.completion_event(1).unwrap();

        queue
            .schedule(EventData::TaskArrival { task_id: 2 }, 4.0)
            .unwrap();
        queue.advance().unwrap();
        scheduler.submit(2, 200.0, &mut queue).unwrap();

        // the completion at 10.0 is replaced
        assert!(!queue.is_pending(first_event));
        assert_eq!(Some(600.0), scheduler.remaining(1));
        assert_eq!(2, queue.pending_count());

        assert_eq!((2, 8.0), complete_next(&mut scheduler, &mut queue));
        assert_eq!((1, 12.0), complete_next(&mut scheduler, &mut queue));
    }

    #[test]
    fn test_complete_unknown_task() {
        let mut queue = EventQueue::new();
        let mut scheduler = TimeSharedScheduler::new(0, 100.0);
        assert!(scheduler.complete(42, &mut queue).is_err());
    }
}
