//! Synthetic workload built from configuration with an injected random generator.

use rand::Rng;

use crate::config::{VmGroup, WorkloadConfig};
use crate::core::task::TaskSpec;
use crate::core::vm::Vm;

/// Draws `task_count` tasks with uniformly distributed lengths and deadlines. Task ids start at 0.
pub fn generate_workload<R: Rng + ?Sized>(config: &WorkloadConfig, rng: &mut R) -> Vec<TaskSpec> {
    let mut tasks = Vec::with_capacity(config.task_count as usize);
    for id in 0..config.task_count {
        let length = rng.gen_range(config.length_range.min..=config.length_range.max);
        let deadline = rng.gen_range(config.deadline_range.min..=config.deadline_range.max);
        let submission_time = config
            .arrival_interval
            .map(|interval| interval * id as f64)
            .unwrap_or(0.0);
        tasks.push(TaskSpec {
            id,
            length,
            pes: config.pes,
            ram: config.ram,
            bw: config.bw,
            storage: config.storage,
            submission_time,
            deadline,
        });
    }
    tasks
}

/// Creates VMs of all groups with ids assigned sequentially from 0.
pub fn generate_vms(groups: &[VmGroup]) -> Vec<Vm> {
    let mut vms = vec![];
    let mut next_id = 0;
    for group in groups {
        for _ in 0..group.count {
            vms.push(Vm::new(next_id, group.spec));
            next_id += 1;
        }
    }
    vms
}
