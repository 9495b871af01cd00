pub mod confidence;
pub mod consensus;
pub mod edge;
pub mod sizing;
pub mod types;
pub mod weather_edge;
