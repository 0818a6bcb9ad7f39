//! Policies assigning an arriving task to one of the broker's VMs.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::common::VmId;
use crate::core::task::Task;
use crate::core::vm::Vm;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TaskAssignmentPolicyKind {
    #[default]
    RoundRobin,
    LeastLoaded,
}

pub trait TaskAssignmentPolicy {
    // VMs are ordered by id. Returns None only if there are no VMs.
    fn select_vm(&mut self, task: &Task, vms: &BTreeMap<VmId, Vm>) -> Option<VmId>;
}

pub fn resolve_task_assignment_policy(
    kind: TaskAssignmentPolicyKind,
) -> Box<dyn TaskAssignmentPolicy> {
    match kind {
        TaskAssignmentPolicyKind::RoundRobin => Box::new(RoundRobin::default()),
        TaskAssignmentPolicyKind::LeastLoaded => Box::new(LeastLoaded {}),
    }
}

/// n-th assigned task goes to the (n mod vm count)-th VM.
#[derive(Default)]
pub struct RoundRobin {
    assigned: usize,
}

impl TaskAssignmentPolicy for RoundRobin {
    fn select_vm(&mut self, _task: &Task, vms: &BTreeMap<VmId, Vm>) -> Option<VmId> {
        if vms.is_empty() {
            return None;
        }
        let vm_id = vms.keys().nth(self.assigned % vms.len()).copied();
        self.assigned += 1;
        vm_id
    }
}

/// VM with the fewest running tasks, lowest id on ties.
pub struct LeastLoaded {}

impl TaskAssignmentPolicy for LeastLoaded {
    fn select_vm(&mut self, _task: &Task, vms: &BTreeMap<VmId, Vm>) -> Option<VmId> {
        vms.values()
            .min_by_key(|vm| (vm.scheduler().running_count(), vm.id()))
            .map(|vm| vm.id())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{LeastLoaded, RoundRobin, TaskAssignmentPolicy};
    use crate::core::common::VmId;
    use crate::core::event_queue::EventQueue;
    use crate::core::task::{Task, TaskSpec};
    use crate::core::vm::{Vm, VmSpec};

    fn vms(ids: &[VmId]) -> BTreeMap<VmId, Vm> {
        let spec = VmSpec {
            mips: 1000.0,
            pes: 1,
            ram: 1024,
            bw: 1000,
            storage: 1000,
        };
        ids.iter().map(|&id| (id, Vm::new(id, spec))).collect()
    }

    fn task() -> Task {
        Task::new(&TaskSpec::new(0, 1000, 1.0))
    }

    #[test]
    fn test_round_robin_cycles_in_id_order() {
        let vms = vms(&[5, 2, 9]);
        let mut policy = RoundRobin::default();
        let picked: Vec<VmId> = (0..7)
            .map(|_| policy.select_vm(&task(), &vms).unwrap())
            .collect();
        assert_eq!(vec![2, 5, 9, 2, 5, 9, 2], picked);
    }

    #[test]
    fn test_no_vms_no_assignment() {
        let vms = vms(&[]);
        assert_eq!(None, RoundRobin::default().select_vm(&task(), &vms));
        assert_eq!(None, LeastLoaded {}.select_vm(&task(), &vms));
    }

    #[test]
    fn test_least_loaded_prefers_idle_vm() {
        let mut vms = vms(&[0, 1, 2]);
        let mut queue = EventQueue::new();
        let mut policy = LeastLoaded {};
        assert_eq!(Some(0), policy.select_vm(&task(), &vms));

        vms.get_mut(&0)
            .unwrap()
            .scheduler_mut()
            .submit(10, 100.0, &mut queue)
            .unwrap();
        vms.get_mut(&1)
            .unwrap()
            .scheduler_mut()
            .submit(11, 100.0, &mut queue)
            .unwrap();
        assert_eq!(Some(2), policy.select_vm(&task(), &vms));
    }
}
