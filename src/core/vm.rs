//! Virtual machines requested by the broker and placed on datacenter hosts.

use serde::{Deserialize, Serialize};

use crate::core::common::{HostId, Resources, VmId};
use crate::core::task_scheduler::interface::TaskScheduler;
use crate::core::task_scheduler::time_shared::TimeSharedScheduler;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct VmSpec {
    /// Rate of each virtual core, in instructions per time unit.
    pub mips: f64,
    pub pes: u32,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
}

impl VmSpec {
    pub fn resources(&self) -> Resources {
        Resources::new(self.ram, self.bw, self.storage)
    }

    /// Total compute rate shared by the tasks running on the VM.
    pub fn total_mips(&self) -> f64 {
        self.mips * self.pes as f64
    }
}

pub struct Vm {
    id: VmId,
    spec: VmSpec,
    host: Option<HostId>,
    scheduler: Box<dyn TaskScheduler>,
}

impl Vm {
    /// Creates a VM sharing its rate between tasks with the time-shared policy.
    pub fn new(id: VmId, spec: VmSpec) -> Self {
        let scheduler = Box::new(TimeSharedScheduler::new(id, spec.total_mips()));
        Self::with_scheduler(id, spec, scheduler)
    }

    pub fn with_scheduler(id: VmId, spec: VmSpec, scheduler: Box<dyn TaskScheduler>) -> Self {
        Self {
            id,
            spec,
            host: None,
            scheduler,
        }
    }

    pub fn id(&self) -> VmId {
        self.id
    }

    pub fn spec(&self) -> &VmSpec {
        &self.spec
    }

    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    pub fn set_host(&mut self, host: Option<HostId>) {
        self.host = host;
    }

    pub fn scheduler(&self) -> &dyn TaskScheduler {
        self.scheduler.as_ref()
    }

    pub fn scheduler_mut(&mut self) -> &mut dyn TaskScheduler {
        self.scheduler.as_mut()
    }
}
