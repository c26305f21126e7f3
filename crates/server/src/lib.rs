//! HTTP surface of packlink: the webhook API, authentication and metrics.

pub mod api;
pub mod metrics;
pub mod state;
