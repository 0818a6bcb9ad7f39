use serde::{Deserialize, Serialize};

pub type TaskId = u64;
pub type VmId = u32;
pub type HostId = u32;
pub type EventId = u64;

/// RAM (MB), bandwidth (Mbit/s) and storage (MB) amounts that are reserved or consumed as a whole.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Resources {
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
}

impl Resources {
    pub fn new(ram: u64, bw: u64, storage: u64) -> Self {
        Self { ram, bw, storage }
    }

    pub fn fits_into(&self, other: &Resources) -> bool {
        self.ram <= other.ram && self.bw <= other.bw && self.storage <= other.storage
    }

    pub fn subtract(&mut self, other: &Resources) {
        self.ram -= other.ram;
        self.bw -= other.bw;
        self.storage -= other.storage;
    }

    pub fn add(&mut self, other: &Resources) {
        self.ram += other.ram;
        self.bw += other.bw;
        self.storage += other.storage;
    }
}

#[cfg(test)]
mod tests {
    use super::Resources;

    #[test]
    fn test_fits_into_checks_every_dimension() {
        let free = Resources::new(2048, 10000, 1_000_000);
        assert!(Resources::new(1024, 10000, 1000).fits_into(&free));
        assert!(!Resources::new(4096, 1, 1).fits_into(&free));
        assert!(!Resources::new(1, 10001, 1).fits_into(&free));
        assert!(!Resources::new(1, 1, 1_000_001).fits_into(&free));
    }

    #[test]
    fn test_subtract_then_add_restores() {
        let mut free = Resources::new(2048, 10000, 1_000_000);
        let request = Resources::new(512, 1000, 300);
        free.subtract(&request);
        assert_eq!(Resources::new(1536, 9000, 999_700), free);
        free.add(&request);
        assert_eq!(Resources::new(2048, 10000, 1_000_000), free);
    }
}
