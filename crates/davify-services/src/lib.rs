//! Davify Services Layer
//!
//! Hosts the expiry sweeper (the housekeeping side of the system) and the
//! archive bundling used for multi-file uploads. Business logic lives here;
//! the CLI stays thin.

pub mod archive;
pub mod sweep;

pub use archive::{archive_name, create_archive, ARCHIVE_EXT};
pub use sweep::{sweep_directory, sweep_directory_at, SweepFailure, SweepReport, SweepService};
