//! Environment-driven configuration

pub mod runtime;
