pub mod inflation_attack;
pub mod scenario;
pub mod workload;
