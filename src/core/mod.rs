pub mod assignment;
pub mod broker;
pub mod common;
pub mod datacenter;
pub mod error;
pub mod event_queue;
pub mod events;
pub mod failure;
pub mod host;
pub mod sla;
pub mod task;
pub mod task_scheduler;
pub mod vm;
pub mod vm_allocation;
