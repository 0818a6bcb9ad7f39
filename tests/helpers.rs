use std::rc::Rc;

use cloudlet_sim::config::SimulationConfig;
use cloudlet_sim::core::task::TaskStatus;
use cloudlet_sim::core::vm::VmSpec;
use cloudlet_sim::simulator::{CloudSimulation, SimulationResult};

pub fn vm_spec(mips: f64) -> VmSpec {
    VmSpec {
        mips,
        pes: 1,
        ram: 1024,
        bw: 1000,
        storage: 1000,
    }
}

/// Builds the simulation from the config, generates its VMs and workload and runs it until the
/// event queue drains.
pub fn run_to_completion(config: SimulationConfig) -> (CloudSimulation, SimulationResult) {
    let mut sim = CloudSimulation::new(Rc::new(config)).unwrap();
    sim.initialize().unwrap();
    sim.run_until_no_events().unwrap();
    let result = sim.finish().unwrap();
    (sim, result)
}

pub fn statuses(result: &SimulationResult) -> Vec<TaskStatus> {
    result.rows.iter().map(|row| row.status).collect()
}

pub fn check_report_is_consistent(result: &SimulationResult, penalty_per_violation: f64) {
    let report = &result.report;
    assert_eq!(
        report.total_tasks,
        report.success_count + report.failure_count
    );
    assert_eq!(report.total_tasks, result.rows.len() as u64);
    assert_eq!(
        report.violation_count,
        result.rows.iter().filter(|row| row.violated).count() as u64
    );
    assert_eq!(
        report.violation_count as f64 * penalty_per_violation,
        report.total_penalty
    );
}
