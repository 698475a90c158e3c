//! Stable exit codes for `sql-loader` CLI commands.

/// Command succeeded; for `status`, a fresh wizard would open on input selection.
pub const OK: i32 = 0;
/// Command failed due to invalid config, a corrupt snapshot, or other errors.
pub const INVALID: i32 = 1;
/// `sql-loader status`: an unsubmitted snapshot exists and a session would ask to resume it.
pub const NEEDS_VERIFY: i32 = 2;
/// `sql-loader status`: a submitted task is being tracked.
pub const IN_PROGRESS: i32 = 3;
