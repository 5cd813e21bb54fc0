pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;

// Application use case and its ports, plus the adapters that implement them
pub mod app;
pub mod infra;
