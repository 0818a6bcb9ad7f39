use crate::config::SimulationConfig;
use crate::core::task::TaskSpec;

/// Datacenter with one 2-PE host, two single-core VMs of rate 1000 and four tasks of length
/// 40000 with no failure injection. Tests adjust fields of the returned config.
pub fn default_test_simulation_config() -> SimulationConfig {
    let default = r#"
    sim_name: "test_cloudlet_sim"
    seed: 123
    datacenter:
      name: "test_datacenter"
      characteristics:
        architecture: "x86"
        os: "Linux"
        vmm: "Xen"
        time_zone: 10.0
        cost_per_sec: 3.0
        cost_per_mem: 0.05
        cost_per_storage: 0.1
        cost_per_bw: 0.1
      hosts:
        - count: 1
          pe_count: 2
          pe_mips: 1000.0
          ram: 4096
          bw: 20000
          storage: 1000000
    vms:
      - count: 2
        mips: 1000.0
        pes: 1
        ram: 1024
        bw: 10000
        storage: 1000
    workload:
      task_count: 4
      length_range: { min: 40000, max: 40000 }
      deadline_range: { min: 50.0, max: 150.0 }
      pes: 1
      ram: 512
      bw: 300
      storage: 300
    failure:
      probability: 0.0
      length_range: { min: 10000, max: 80000 }
    sla:
      penalty_per_violation: 10.0
    "#;

    serde_yaml::from_str::<SimulationConfig>(default)
        .unwrap_or_else(|err| panic!("default test config is broken: {}", err))
}

pub fn task_spec(id: u64, length: u64, deadline: f64) -> TaskSpec {
    TaskSpec::new(id, length, deadline)
}

pub fn assert_time_eq(expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() < 1e-9,
        "expected time {}, got {}",
        expected,
        actual
    );
}
