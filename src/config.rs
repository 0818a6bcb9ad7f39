//! Config fields definitions for the cloudlet simulation

use serde::Deserialize;

use crate::core::assignment::TaskAssignmentPolicyKind;
use crate::core::datacenter::{DatacenterCharacteristics, HostGroup};
use crate::core::error::SimulationError;
use crate::core::failure::LengthRange;
use crate::core::vm::VmSpec;
use crate::core::vm_allocation::VmAllocationPolicyKind;

use crate::metrics::printer::MetricsPrinterConfig;

#[derive(Debug, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub sim_name: String,
    pub seed: u64,
    /// If not set default output of logs is stderr
    pub logs_filepath: Option<String>,
    pub datacenter: DatacenterConfig,
    pub vms: Vec<VmGroup>,
    pub workload: WorkloadConfig,
    pub failure: FailureConfig,
    pub sla: SlaConfig,
    #[serde(default)]
    pub task_assignment_policy: TaskAssignmentPolicyKind,
    pub metrics_printer: Option<MetricsPrinterConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DatacenterConfig {
    pub name: String,
    #[serde(default)]
    pub characteristics: DatacenterCharacteristics,
    #[serde(default)]
    pub vm_allocation_policy: VmAllocationPolicyKind,
    pub hosts: Vec<HostGroup>,
}

/// Group of identical VMs. Ids are assigned sequentially over all groups.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct VmGroup {
    pub count: u32,
    #[serde(flatten)]
    pub spec: VmSpec,
}

/// Inclusive range of deadlines.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct DeadlineRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WorkloadConfig {
    pub task_count: u64,
    pub length_range: LengthRange,
    pub deadline_range: DeadlineRange,
    pub pes: u32,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
    /// Task i arrives at i * arrival_interval. All tasks arrive at 0 if not set.
    pub arrival_interval: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FailureConfig {
    pub probability: f64,
    /// Workload given to a task selected for failure.
    pub length_range: LengthRange,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SlaConfig {
    pub penalty_per_violation: f64,
}

fn invalid(message: String) -> Result<(), SimulationError> {
    Err(SimulationError::InvalidConfig(message))
}

impl SimulationConfig {
    pub fn total_vms(&self) -> u32 {
        self.vms.iter().map(|group| group.count).sum()
    }

    pub fn total_hosts(&self) -> u32 {
        self.datacenter.hosts.iter().map(|group| group.count).sum()
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.total_hosts() == 0 {
            return invalid("datacenter has no hosts".to_string());
        }
        for host in self.datacenter.hosts.iter() {
            if host.pe_count == 0 || !(host.pe_mips > 0.0) {
                return invalid(format!("host group {:?} has no compute capacity", host));
            }
        }
        if self.total_vms() == 0 {
            return invalid("no vms requested".to_string());
        }
        for vm in self.vms.iter() {
            if vm.spec.pes == 0 || !(vm.spec.mips > 0.0) {
                return invalid(format!("vm group {:?} has no compute capacity", vm));
            }
        }

        let workload = &self.workload;
        if workload.task_count == 0 {
            return invalid("workload has no tasks".to_string());
        }
        if workload.length_range.min > workload.length_range.max {
            return invalid("workload length range is inverted".to_string());
        }
        if !(workload.deadline_range.min >= 0.0)
            || !(workload.deadline_range.min <= workload.deadline_range.max)
            || !workload.deadline_range.max.is_finite()
        {
            return invalid("deadline range must be finite, non-negative and ordered".to_string());
        }
        if let Some(interval) = workload.arrival_interval {
            if !(interval >= 0.0) || !interval.is_finite() {
                return invalid("arrival interval must be finite and non-negative".to_string());
            }
        }

        if !(0.0..=1.0).contains(&self.failure.probability) {
            return invalid(format!(
                "failure probability {} is outside [0, 1]",
                self.failure.probability
            ));
        }
        if self.failure.length_range.min > self.failure.length_range.max {
            return invalid("failure length range is inverted".to_string());
        }
        if !(self.sla.penalty_per_violation >= 0.0) || !self.sla.penalty_per_violation.is_finite() {
            return invalid("penalty per violation must be finite and non-negative".to_string());
        }
        Ok(())
    }
}
