pub mod interface;
pub mod time_shared;
