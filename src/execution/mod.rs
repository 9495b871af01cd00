pub mod persistence;
pub mod risk;
pub mod simulator;
pub mod types;
