//! I/O seams for the wizard.

pub mod config;
pub mod services;
pub mod snapshot;
pub mod store;
