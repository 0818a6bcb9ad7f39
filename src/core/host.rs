//! Physical hosts and their processing elements.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::common::{HostId, Resources, VmId};
use crate::core::vm::VmSpec;

/// Tolerance on PE rate comparisons, so that VMs which exactly fill a PE are placed.
const MIPS_EPSILON: f64 = 1e-9;

/// Single core of a host. Its rate may be split among several VMs.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProcessingElement {
    pub id: u32,
    /// Compute rate in instructions per time unit.
    pub mips: f64,
    free_mips: f64,
}

impl ProcessingElement {
    pub fn new(id: u32, mips: f64) -> Self {
        Self {
            id,
            mips,
            free_mips: mips,
        }
    }

    pub fn free_mips(&self) -> f64 {
        self.free_mips
    }
}

/// What a placed VM holds on its host until it is destroyed.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VmAllocation {
    pub pe_ids: Vec<u32>,
    pub mips_per_pe: f64,
    pub resources: Resources,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Host {
    id: HostId,
    pes: Vec<ProcessingElement>,
    capacity: Resources,
    free: Resources,
    allocations: BTreeMap<VmId, VmAllocation>,
}

impl Host {
    pub fn new(id: HostId, pes: Vec<ProcessingElement>, capacity: Resources) -> Self {
        Self {
            id,
            pes,
            capacity,
            free: capacity,
            allocations: Default::default(),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn pes(&self) -> &[ProcessingElement] {
        &self.pes
    }

    pub fn capacity(&self) -> &Resources {
        &self.capacity
    }

    pub fn free(&self) -> &Resources {
        &self.free
    }

    pub fn total_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.mips).sum()
    }

    pub fn vm_ids(&self) -> impl Iterator<Item = &VmId> {
        self.allocations.keys()
    }

    pub fn allocation(&self, vm_id: VmId) -> Option<&VmAllocation> {
        self.allocations.get(&vm_id)
    }

    /// Picks `spec.pes` distinct PEs with at least `spec.mips` free rate each, in PE order.
    fn select_pes(&self, spec: &VmSpec) -> Option<Vec<u32>> {
        let selected: Vec<u32> = self
            .pes
            .iter()
            .filter(|pe| pe.free_mips + MIPS_EPSILON >= spec.mips)
            .take(spec.pes as usize)
            .map(|pe| pe.id)
            .collect();
        if selected.len() < spec.pes as usize {
            return None;
        }
        Some(selected)
    }

    pub fn is_suitable(&self, spec: &VmSpec) -> bool {
        spec.resources().fits_into(&self.free) && self.select_pes(spec).is_some()
    }

    /// Reserves PE rate and resources for the VM. Returns false and changes nothing if the host
    /// does not have enough free capacity.
    pub fn reserve(&mut self, vm_id: VmId, spec: &VmSpec) -> bool {
        if self.allocations.contains_key(&vm_id) || !spec.resources().fits_into(&self.free) {
            return false;
        }
        let Some(pe_ids) = self.select_pes(spec) else {
            return false;
        };
        self.free.subtract(&spec.resources());
        self.allocations.insert(
            vm_id,
            VmAllocation {
                pe_ids,
                mips_per_pe: spec.mips,
                resources: spec.resources(),
            },
        );
        self.update_free_mips();
        true
    }

    /// Returns everything held by the VM to the free pool.
    pub fn release(&mut self, vm_id: VmId) -> Option<VmAllocation> {
        let allocation = self.allocations.remove(&vm_id)?;
        self.free.add(&allocation.resources);
        self.update_free_mips();
        Some(allocation)
    }

    /// Recomputes free rate of every PE from the current allocations, so repeated reserve/release
    /// cycles do not accumulate rounding error.
    fn update_free_mips(&mut self) {
        for pe in self.pes.iter_mut() {
            let reserved: f64 = self
                .allocations
                .values()
                .filter(|allocation| allocation.pe_ids.contains(&pe.id))
                .map(|allocation| allocation.mips_per_pe)
                .sum();
            pe.free_mips = (pe.mips - reserved).max(0.0);
        }
    }
}
