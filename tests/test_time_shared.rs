mod helpers;

use std::rc::Rc;

use cloudlet_sim::core::task_scheduler::interface::TaskScheduler;
use cloudlet_sim::core::task_scheduler::time_shared::TimeSharedScheduler;
use cloudlet_sim::core::vm::Vm;
use cloudlet_sim::simulator::CloudSimulation;
use cloudlet_sim::test_util::helpers::{assert_time_eq, default_test_simulation_config, task_spec};

use helpers::vm_spec;

fn single_vm_simulation(mips: f64) -> CloudSimulation {
    let mut sim = CloudSimulation::new(Rc::new(default_test_simulation_config())).unwrap();
    sim.submit_vms(vec![Vm::new(0, vm_spec(mips))]).unwrap();
    sim
}

fn scheduler(sim: &CloudSimulation) -> &TimeSharedScheduler {
    sim.broker
        .get_vm(0)
        .unwrap()
        .scheduler()
        .downcast_ref::<TimeSharedScheduler>()
        .unwrap()
}

#[test]
fn test_rates_are_recomputed_on_every_change() {
    let mut sim = single_vm_simulation(1000.0);
    sim.submit_tasks(vec![task_spec(0, 1000, 10.0), task_spec(1, 3000, 10.0)])
        .unwrap();

    // both arrivals
    assert!(sim.step().unwrap());
    assert_eq!(Some(1000.0), scheduler(&sim).current_rate(0));
    assert!(sim.step().unwrap());
    assert_eq!(Some(500.0), scheduler(&sim).current_rate(0));
    assert_eq!(Some(500.0), scheduler(&sim).current_rate(1));
    assert_eq!(2, scheduler(&sim).completion_event_count());

    // task 0 departs at 2, task 1 takes the whole vm
    assert!(sim.step().unwrap());
    assert_time_eq(2.0, sim.time());
    assert_eq!(None, scheduler(&sim).current_rate(0));
    assert_eq!(Some(1000.0), scheduler(&sim).current_rate(1));
    assert_time_eq(2000.0, scheduler(&sim).remaining(1).unwrap());
    assert_eq!(1, scheduler(&sim).completion_event_count());

    assert!(sim.step().unwrap());
    assert_time_eq(4.0, sim.time());
    assert_eq!(0, scheduler(&sim).completion_event_count());
    assert!(!sim.step().unwrap());
}

#[test]
fn test_stale_completions_never_fire() {
    let mut sim = single_vm_simulation(100.0);
    let specs = (0..10)
        .map(|id| {
            let mut spec = task_spec(id, 1000, 1000.0);
            spec.submission_time = id as f64;
            spec
        })
        .collect();
    sim.submit_tasks(specs).unwrap();
    sim.run_until_no_events().unwrap();

    // one arrival and one completion per task, every rescheduled completion was canceled
    assert_eq!(20, sim.event_count());
    assert_eq!(10, sim.broker.finished_count());
    // total work of 10000 on rate 100 with the vm busy since 0
    assert_time_eq(100.0, sim.time());
}
