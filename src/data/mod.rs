pub mod bracket;
pub mod snapshot;
pub mod types;
pub mod weather;
