pub mod config;
pub mod core;
pub mod metrics {
    pub mod collector;
    pub mod printer;
}
pub mod simulation_callbacks;
pub mod simulator;
pub mod test_util {
    pub mod helpers;
}
pub mod trace {
    pub mod generator;
}
