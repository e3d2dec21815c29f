pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sheet;
pub mod sinks;
pub mod sources;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use pipeline::{Envelope, Pipeline, PipelineError};
