mod helpers;

use cloudlet_sim::core::task::TaskStatus;
use cloudlet_sim::test_util::helpers::default_test_simulation_config;

use helpers::{check_report_is_consistent, run_to_completion, statuses};

#[test]
fn test_all_tasks_fail_with_probability_one() {
    let mut config = default_test_simulation_config();
    config.failure.probability = 1.0;
    let (sim, result) = run_to_completion(config);

    assert_eq!(vec![TaskStatus::Failed; 4], statuses(&result));
    assert_eq!(0, result.report.success_count);
    assert_eq!(4, result.report.failure_count);
    assert_eq!(0, result.report.violation_count);
    assert_eq!(0.0, result.report.total_penalty);
    assert_eq!(4, sim.metrics_collector.borrow().injected_failures);
    assert_eq!(4, sim.metrics_collector.borrow().tasks_failed);
}

#[test]
fn test_failed_tasks_run_replacement_length() {
    let mut config = default_test_simulation_config();
    config.failure.probability = 1.0;
    config.failure.length_range.min = 5000;
    config.failure.length_range.max = 5000;
    let (_, result) = run_to_completion(config);

    // two tasks of 5000 per vm of rate 1000
    for row in result.rows.iter() {
        assert!((row.actual_execution_time - 10.0).abs() < 1e-9);
        assert!(!row.violated);
    }
}

#[test]
fn test_only_injected_tasks_fail() {
    let mut config = default_test_simulation_config();
    config.failure.probability = 0.5;
    config.workload.task_count = 40;
    let (sim, result) = run_to_completion(config);

    let injected = sim.broker.injected_failures();
    for row in result.rows.iter() {
        let expected = if injected.contains(&row.id) {
            TaskStatus::Failed
        } else {
            TaskStatus::Success
        };
        assert_eq!(expected, row.status);
    }
    assert_eq!(injected.len() as u64, result.report.failure_count);
    assert_eq!(40, result.report.total_tasks);
    check_report_is_consistent(&result, 10.0);
}

#[test]
fn test_no_failures_with_probability_zero() {
    let mut config = default_test_simulation_config();
    config.workload.task_count = 20;
    let (sim, result) = run_to_completion(config);

    assert!(sim.broker.injected_failures().is_empty());
    assert_eq!(20, result.report.success_count);
    assert_eq!(0, sim.metrics_collector.borrow().injected_failures);
}
