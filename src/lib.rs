pub mod config;
pub mod cpu_stress;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod record;
pub mod sampler;
pub mod signal;
