pub mod nodes;
pub mod pods;
pub mod workloads;
