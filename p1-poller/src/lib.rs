pub mod cli;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod service;
pub mod sinks;
pub mod sources;

#[cfg(test)]
mod test_support;

pub use pipeline::{Envelope, Pipeline};
