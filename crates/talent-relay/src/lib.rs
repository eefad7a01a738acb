pub mod analysis;
pub mod config;
pub mod connectors;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod sink;
pub mod status;
pub mod sync;
pub mod telemetry;
pub mod transform;
