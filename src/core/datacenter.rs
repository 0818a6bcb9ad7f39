//! Datacenter owning the hosts and the placement of VMs on them.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::common::{HostId, Resources, VmId};
use crate::core::error::SimulationError;
use crate::core::host::{Host, ProcessingElement};
use crate::core::vm::VmSpec;
use crate::core::vm_allocation::{
    resolve_vm_allocation_policy, VmAllocationPolicy, VmAllocationPolicyKind,
};

/// Descriptive properties and prices of a datacenter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DatacenterCharacteristics {
    pub architecture: String,
    pub os: String,
    pub vmm: String,
    pub time_zone: f64,
    /// Price of one time unit of task execution.
    pub cost_per_sec: f64,
    /// Price of one MB of RAM held by a VM.
    pub cost_per_mem: f64,
    /// Price of one MB of storage held by a VM.
    pub cost_per_storage: f64,
    /// Price of one unit of bandwidth used by a task.
    pub cost_per_bw: f64,
}

impl Default for DatacenterCharacteristics {
    fn default() -> Self {
        Self {
            architecture: "x86".to_string(),
            os: "Linux".to_string(),
            vmm: "Xen".to_string(),
            time_zone: 0.0,
            cost_per_sec: 0.0,
            cost_per_mem: 0.0,
            cost_per_storage: 0.0,
            cost_per_bw: 0.0,
        }
    }
}

impl DatacenterCharacteristics {
    pub fn vm_cost(&self, spec: &VmSpec) -> f64 {
        self.cost_per_mem * spec.ram as f64 + self.cost_per_storage * spec.storage as f64
    }

    pub fn task_cost(&self, execution_time: f64, bw: u64) -> f64 {
        self.cost_per_sec * execution_time + self.cost_per_bw * bw as f64
    }
}

/// Group of identical hosts.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct HostGroup {
    pub count: u32,
    pub pe_count: u32,
    pub pe_mips: f64,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
}

pub struct Datacenter {
    name: String,
    characteristics: DatacenterCharacteristics,
    /// Hosts in registration order.
    hosts: Vec<Host>,
    placements: BTreeMap<VmId, HostId>,
    allocation_policy: Box<dyn VmAllocationPolicy>,
}

impl Datacenter {
    pub fn new(
        name: String,
        characteristics: DatacenterCharacteristics,
        allocation_policy: Box<dyn VmAllocationPolicy>,
    ) -> Self {
        Self {
            name,
            characteristics,
            hosts: Default::default(),
            placements: Default::default(),
            allocation_policy,
        }
    }

    /// Builds a datacenter with hosts numbered in group order.
    pub fn from_host_groups(
        name: String,
        characteristics: DatacenterCharacteristics,
        policy: VmAllocationPolicyKind,
        groups: &[HostGroup],
    ) -> Self {
        let mut datacenter = Self::new(name, characteristics, resolve_vm_allocation_policy(policy));
        for group in groups {
            for _ in 0..group.count {
                datacenter.add_host(
                    group.pe_count,
                    group.pe_mips,
                    Resources::new(group.ram, group.bw, group.storage),
                );
            }
        }
        info!(
            "Datacenter {:?} created with {} hosts",
            datacenter.name,
            datacenter.hosts.len()
        );
        datacenter
    }

    /// Registers a host and returns its id. Only valid before simulation start.
    pub fn add_host(&mut self, pe_count: u32, pe_mips: f64, capacity: Resources) -> HostId {
        let id = self.hosts.len() as HostId;
        let pes = (0..pe_count)
            .map(|pe_id| ProcessingElement::new(pe_id, pe_mips))
            .collect();
        self.hosts.push(Host::new(id, pes, capacity));
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn characteristics(&self) -> &DatacenterCharacteristics {
        &self.characteristics
    }

    pub fn set_allocation_policy(&mut self, allocation_policy: Box<dyn VmAllocationPolicy>) {
        self.allocation_policy = allocation_policy;
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, host_id: HostId) -> Option<&Host> {
        self.hosts.get(host_id as usize)
    }

    pub fn host_of(&self, vm_id: VmId) -> Option<HostId> {
        self.placements.get(&vm_id).copied()
    }

    pub fn vm_count(&self) -> usize {
        self.placements.len()
    }

    /// Places the VM on a host chosen by the allocation policy and reserves its resources there.
    pub fn allocate(&mut self, vm_id: VmId, spec: &VmSpec) -> Result<HostId, SimulationError> {
        if self.placements.contains_key(&vm_id) {
            return Err(SimulationError::DuplicateVm(vm_id));
        }
        let host_id = self
            .allocation_policy
            .select_host(spec, &self.hosts)
            .ok_or(SimulationError::InsufficientCapacity { vm_id })?;
        let host = self
            .hosts
            .get_mut(host_id as usize)
            .ok_or(SimulationError::InsufficientCapacity { vm_id })?;
        if !host.reserve(vm_id, spec) {
            return Err(SimulationError::InsufficientCapacity { vm_id });
        }
        self.placements.insert(vm_id, host_id);
        debug!("Vm {} placed on host {}", vm_id, host_id);
        Ok(host_id)
    }

    /// Destroys the VM placement, returning its capacity to the host.
    pub fn release(&mut self, vm_id: VmId) -> Result<HostId, SimulationError> {
        let host_id = self
            .placements
            .remove(&vm_id)
            .ok_or(SimulationError::UnknownVm(vm_id))?;
        if let Some(host) = self.hosts.get_mut(host_id as usize) {
            host.release(vm_id);
        }
        debug!("Vm {} destroyed on host {}", vm_id, host_id);
        Ok(host_id)
    }
}
