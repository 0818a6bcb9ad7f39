//! Broker owning the VMs and tasks of one user: submission, assignment of tasks to VMs and
//! collection of finished tasks.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use log::debug;
use rand::Rng;

use crate::core::assignment::TaskAssignmentPolicy;
use crate::core::common::{TaskId, VmId};
use crate::core::error::SimulationError;
use crate::core::event_queue::EventQueue;
use crate::core::failure::{FailureDecision, FailureInjector};
use crate::core::task::{Task, TaskSpec, TaskStatus};
use crate::core::vm::Vm;
use crate::metrics::collector::MetricsCollector;

pub struct Broker {
    vms: BTreeMap<VmId, Vm>,
    tasks: BTreeMap<TaskId, Task>,
    /// Deadline of every submitted task, fixed at submission.
    deadlines: BTreeMap<TaskId, f64>,
    /// Tasks selected by the failure injector.
    injected_failures: BTreeSet<TaskId>,
    /// Terminal tasks in the order their completion events fired.
    finished: Vec<TaskId>,

    assignment_policy: Box<dyn TaskAssignmentPolicy>,
    failure_injector: FailureInjector,

    metrics_collector: Rc<RefCell<MetricsCollector>>,
}

impl Broker {
    pub fn new(
        assignment_policy: Box<dyn TaskAssignmentPolicy>,
        failure_injector: FailureInjector,
        metrics_collector: Rc<RefCell<MetricsCollector>>,
    ) -> Self {
        Self {
            vms: Default::default(),
            tasks: Default::default(),
            deadlines: Default::default(),
            injected_failures: Default::default(),
            finished: Default::default(),
            assignment_policy,
            failure_injector,
            metrics_collector,
        }
    }

    /// Registers VMs that are already placed in the datacenter.
    pub fn submit_vms(&mut self, vms: Vec<Vm>) -> Result<(), SimulationError> {
        for vm in vms {
            if self.vms.contains_key(&vm.id()) {
                return Err(SimulationError::DuplicateVm(vm.id()));
            }
            self.vms.insert(vm.id(), vm);
        }
        Ok(())
    }

    /// Registers tasks in CREATED state together with their deadlines. The batch is checked as a
    /// whole, nothing is registered if any id is taken.
    pub fn submit_tasks(&mut self, specs: &[TaskSpec]) -> Result<(), SimulationError> {
        if self.vms.is_empty() {
            return Err(SimulationError::NoVmsAvailable);
        }
        let mut batch_ids = BTreeSet::new();
        for spec in specs {
            if self.tasks.contains_key(&spec.id) || !batch_ids.insert(spec.id) {
                return Err(SimulationError::DuplicateTask(spec.id));
            }
        }
        for spec in specs {
            self.tasks.insert(spec.id, Task::new(spec));
            self.deadlines.insert(spec.id, spec.deadline);
        }
        self.metrics_collector.borrow_mut().total_tasks += specs.len() as u64;
        Ok(())
    }

    /// Accepts an arriving task: CREATED -> SUBMITTED, then runs failure injection once.
    pub fn admit<R: Rng + ?Sized>(
        &mut self,
        task_id: TaskId,
        rng: &mut R,
    ) -> Result<FailureDecision, SimulationError> {
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(SimulationError::UnknownTask(task_id))?;
        task.mark_submitted()?;

        let decision = self.failure_injector.decide(task, rng);
        if let FailureDecision::Failed { replacement_length } = decision {
            debug!(
                "Task {} selected for failure, length {} -> {}",
                task_id,
                task.length(),
                replacement_length
            );
            task.replace_length(replacement_length)?;
            self.injected_failures.insert(task_id);
            self.metrics_collector.borrow_mut().injected_failures += 1;
        }
        Ok(decision)
    }

    /// Hands a SUBMITTED task to a VM chosen by the assignment policy and starts it there.
    pub fn assign(
        &mut self,
        task_id: TaskId,
        queue: &mut EventQueue,
    ) -> Result<VmId, SimulationError> {
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(SimulationError::UnknownTask(task_id))?;
        if task.status() != TaskStatus::Submitted {
            return Err(SimulationError::IllegalTransition {
                task_id,
                from: task.status(),
                to: TaskStatus::Running,
            });
        }
        let vm_id = self
            .assignment_policy
            .select_vm(task, &self.vms)
            .ok_or(SimulationError::NoVmsAvailable)?;
        let vm = self
            .vms
            .get_mut(&vm_id)
            .ok_or(SimulationError::UnknownVm(vm_id))?;

        task.mark_running(vm_id, queue.now())?;
        vm.scheduler_mut()
            .submit(task_id, task.length() as f64, queue)?;
        debug!(
            "[{:.3}] Task {} assigned to vm {} ({} running)",
            queue.now(),
            task_id,
            vm_id,
            vm.scheduler().running_count()
        );
        Ok(vm_id)
    }

    /// Handles the completion event of a task: removes it from its VM and makes it terminal.
    /// Tasks selected by the failure injector end FAILED, all others SUCCESS.
    pub fn complete(
        &mut self,
        task_id: TaskId,
        vm_id: VmId,
        queue: &mut EventQueue,
    ) -> Result<&Task, SimulationError> {
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(SimulationError::UnknownTask(task_id))?;
        if task.vm_id() != Some(vm_id) {
            return Err(SimulationError::UnknownVm(vm_id));
        }
        let vm = self
            .vms
            .get_mut(&vm_id)
            .ok_or(SimulationError::UnknownVm(vm_id))?;
        vm.scheduler_mut().complete(task_id, queue)?;

        let status = if self.injected_failures.contains(&task_id) {
            TaskStatus::Failed
        } else {
            TaskStatus::Success
        };
        task.finish(status, queue.now())?;
        self.finished.push(task_id);
        debug!(
            "[{:.3}] Task {} finished on vm {} with {:?}",
            queue.now(),
            task_id,
            vm_id,
            status
        );

        let mut metrics = self.metrics_collector.borrow_mut();
        match status {
            TaskStatus::Success => metrics.tasks_succeeded += 1,
            _ => metrics.tasks_failed += 1,
        }
        metrics.internal.terminated_tasks += 1;
        if let Some(execution_time) = task.actual_execution_time() {
            metrics.increment_task_execution_time(execution_time);
        }
        Ok(&*task)
    }

    /// Returns every terminal task in the order it finished.
    pub fn collect_finished(&self) -> Result<Vec<Task>, SimulationError> {
        if let Some(task) = self
            .tasks
            .values()
            .find(|task| task.status() == TaskStatus::Submitted && task.vm_id().is_none())
        {
            return Err(SimulationError::UnassignedTask { task_id: task.id() });
        }
        self.finished
            .iter()
            .map(|task_id| {
                self.tasks
                    .get(task_id)
                    .cloned()
                    .ok_or(SimulationError::UnknownTask(*task_id))
            })
            .collect()
    }

    /// Removes all VMs, returning them for destruction in the datacenter.
    pub fn take_vms(&mut self) -> Vec<Vm> {
        std::mem::take(&mut self.vms).into_values().collect()
    }

    pub fn get_task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    pub fn get_vm(&self, vm_id: VmId) -> Option<&Vm> {
        self.vms.get(&vm_id)
    }

    pub fn vms(&self) -> &BTreeMap<VmId, Vm> {
        &self.vms
    }

    pub fn tasks(&self) -> &BTreeMap<TaskId, Task> {
        &self.tasks
    }

    pub fn deadlines(&self) -> &BTreeMap<TaskId, f64> {
        &self.deadlines
    }

    pub fn injected_failures(&self) -> &BTreeSet<TaskId> {
        &self.injected_failures
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.len()
    }

    pub fn set_assignment_policy(&mut self, assignment_policy: Box<dyn TaskAssignmentPolicy>) {
        self.assignment_policy = assignment_policy;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::Broker;
    use crate::core::assignment::RoundRobin;
    use crate::core::error::SimulationError;
    use crate::core::event_queue::EventQueue;
    use crate::core::events::EventData;
    use crate::core::failure::{FailureInjector, LengthRange};
    use crate::core::task::{TaskSpec, TaskStatus};
    use crate::core::vm::{Vm, VmSpec};
    use crate::metrics::collector::MetricsCollector;

    fn broker(injector: FailureInjector) -> Broker {
        Broker::new(
            Box::new(RoundRobin::default()),
            injector,
            Rc::new(RefCell::new(MetricsCollector::new())),
        )
    }

    fn vm(id: u32) -> Vm {
        Vm::new(
            id,
            VmSpec {
                mips: 1000.0,
                pes: 1,
                ram: 1024,
                bw: 1000,
                storage: 1000,
            },
        )
    }

    #[test]
    fn test_tasks_need_vms() {
        let mut broker = broker(FailureInjector::disabled());
        assert_eq!(
            SimulationError::NoVmsAvailable,
            broker
                .submit_tasks(&[TaskSpec::new(0, 1000, 1.0)])
                .unwrap_err()
        );
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut broker = broker(FailureInjector::disabled());
        assert_eq!(
            SimulationError::DuplicateVm(0),
            broker.submit_vms(vec![vm(0), vm(0)]).unwrap_err()
        );
        assert_eq!(
            SimulationError::DuplicateTask(3),
            broker
                .submit_tasks(&[TaskSpec::new(3, 1, 1.0), TaskSpec::new(3, 1, 1.0)])
                .unwrap_err()
        );
    }

    #[test]
    fn test_lifecycle_through_broker() {
        let mut broker = broker(FailureInjector::disabled());
        let mut queue = EventQueue::new();
        let mut rng = Pcg64::seed_from_u64(0);
        broker.submit_vms(vec![vm(0)]).unwrap();
        broker
            .submit_tasks(&[TaskSpec::new(0, 2000, 1.0)])
            .unwrap();
        assert_eq!(TaskStatus::Created, broker.get_task(0).unwrap().status());

        assert!(!broker.admit(0, &mut rng).unwrap().is_failed());
        assert_eq!(TaskStatus::Submitted, broker.get_task(0).unwrap().status());
        // submitted but not yet handed to a vm
        assert_eq!(
            SimulationError::UnassignedTask { task_id: 0 },
            broker.collect_finished().unwrap_err()
        );

        assert_eq!(0, broker.assign(0, &mut queue).unwrap());
        assert_eq!(TaskStatus::Running, broker.get_task(0).unwrap().status());
        assert!(broker.collect_finished().unwrap().is_empty());

        let event = queue.advance().unwrap();
        assert_eq!(EventData::TaskCompletion { task_id: 0, vm_id: 0 }, event.data);
        let task = broker.complete(0, 0, &mut queue).unwrap();
        assert_eq!(TaskStatus::Success, task.status());
        assert_eq!(Some(2.0), task.actual_execution_time());
        assert_eq!(1, broker.collect_finished().unwrap().len());
    }

    #[test]
    fn test_injected_failure_ends_failed_with_replaced_length() {
        let mut broker = broker(FailureInjector::new(1.0, LengthRange { min: 500, max: 500 }));
        let mut queue = EventQueue::new();
        let mut rng = Pcg64::seed_from_u64(0);
        broker.submit_vms(vec![vm(0)]).unwrap();
        broker
            .submit_tasks(&[TaskSpec::new(0, 40000, 1000.0)])
            .unwrap();

        assert!(broker.admit(0, &mut rng).unwrap().is_failed());
        assert_eq!(500, broker.get_task(0).unwrap().length());
        broker.assign(0, &mut queue).unwrap();
        let event = queue.advance().unwrap();
        assert_eq!(0.5, event.time);

        let task = broker.complete(0, 0, &mut queue).unwrap();
        assert_eq!(TaskStatus::Failed, task.status());
        assert_eq!(Some(0.5), task.actual_execution_time());
        assert!(broker.injected_failures().contains(&0));
    }

    #[test]
    fn test_task_cannot_be_assigned_twice() {
        let mut broker = broker(FailureInjector::disabled());
        let mut queue = EventQueue::new();
        let mut rng = Pcg64::seed_from_u64(0);
        broker.submit_vms(vec![vm(0), vm(1)]).unwrap();
        broker.submit_tasks(&[TaskSpec::new(0, 10, 1.0)]).unwrap();
        broker.admit(0, &mut rng).unwrap();
        broker.assign(0, &mut queue).unwrap();
        assert!(broker.assign(0, &mut queue).is_err());
        assert!(broker.admit(0, &mut rng).is_err());
        assert_eq!(1, queue.pending_count());
    }

    #[test]
    fn test_rejected_batch_registers_nothing() {
        let mut broker = broker(FailureInjector::disabled());
        broker.submit_vms(vec![vm(0)]).unwrap();
        broker.submit_tasks(&[TaskSpec::new(0, 1, 1.0)]).unwrap();

        assert_eq!(
            SimulationError::DuplicateTask(0),
            broker
                .submit_tasks(&[TaskSpec::new(1, 1, 1.0), TaskSpec::new(0, 1, 1.0)])
                .unwrap_err()
        );
        assert_eq!(
            SimulationError::DuplicateTask(2),
            broker
                .submit_tasks(&[TaskSpec::new(2, 1, 1.0), TaskSpec::new(2, 1, 1.0)])
                .unwrap_err()
        );
        assert_eq!(1, broker.task_count());
        assert!(broker.get_task(1).is_none());
        assert!(broker.get_task(2).is_none());
        assert_eq!(1, broker.metrics_collector.borrow().total_tasks);
    }
}
