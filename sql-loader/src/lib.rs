//! Resumable SQL data loader wizard.
//!
//! This crate sequences the "load data with SQL" flow: pick an input source,
//! pick an input format, edit the generated ingestion statement, and submit it
//! as an ingestion task. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step derivation, capacity
//!   decisions, query generation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting seams (durable snapshot store, config, and the
//!   remote collaborators the wizard talks to).
//!
//! Orchestration modules ([`wizard`], [`gate`], [`submit`], [`session`])
//! coordinate core logic with I/O to implement the wizard transitions.

pub mod core;
pub mod exit_codes;
pub mod gate;
pub mod io;
pub mod logging;
pub mod session;
pub mod submit;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod wizard;
