// Library exports for the Isolation agent
// The `isolation` binary, integration tests and benches all build on these modules

pub mod agent;
pub mod board;
pub mod cache;
pub mod config;
pub mod debug_logger;
pub mod game;
pub mod heuristics;
pub mod search;
pub mod simple_profiler;
pub mod types;
