pub mod config;
pub mod logging;

// Orchestration engine
pub mod batch;
pub mod catalog;
pub mod detect;
pub mod scheduler;
pub mod source;
pub mod stats;
pub mod store;
pub mod tasks;
