//! Policies choosing the host for a new VM.

use serde::Deserialize;

use crate::core::common::HostId;
use crate::core::host::Host;
use crate::core::vm::VmSpec;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum VmAllocationPolicyKind {
    #[default]
    FirstFit,
    BestFit,
}

// Trait which should implement any VM placement policy of a datacenter.
pub trait VmAllocationPolicy {
    // Hosts are passed in registration order. Returns None if no host can take the VM.
    fn select_host(&self, vm: &VmSpec, hosts: &[Host]) -> Option<HostId>;
}

pub fn resolve_vm_allocation_policy(kind: VmAllocationPolicyKind) -> Box<dyn VmAllocationPolicy> {
    match kind {
        VmAllocationPolicyKind::FirstFit => Box::new(FirstFit {}),
        VmAllocationPolicyKind::BestFit => Box::new(BestFit {}),
    }
}

/// Takes the first suitable host.
pub struct FirstFit {}

impl VmAllocationPolicy for FirstFit {
    fn select_host(&self, vm: &VmSpec, hosts: &[Host]) -> Option<HostId> {
        hosts
            .iter()
            .find(|host| host.is_suitable(vm))
            .map(|host| host.id())
    }
}

/// Takes the suitable host that is left with the least free RAM.
pub struct BestFit {}

impl VmAllocationPolicy for BestFit {
    fn select_host(&self, vm: &VmSpec, hosts: &[Host]) -> Option<HostId> {
        let mut best: Option<(&Host, u64)> = None;
        for host in hosts.iter().filter(|host| host.is_suitable(vm)) {
            let ram_left = host.free().ram - vm.ram;
            match best {
                Some((_, best_ram_left)) if best_ram_left <= ram_left => {}
                _ => best = Some((host, ram_left)),
            }
        }
        best.map(|(host, _)| host.id())
    }
}
