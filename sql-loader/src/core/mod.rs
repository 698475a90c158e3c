//! Deterministic, pure logic shared by the wizard.
//!
//! Nothing here touches the store or the network. Every function maps wizard
//! data to a value, so the whole module is exercised by plain unit tests.

pub mod capacity;
pub mod ingest;
pub mod sql;
pub mod step;
pub mod types;
