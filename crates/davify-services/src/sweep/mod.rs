pub mod service;

pub use service::{sweep_directory, sweep_directory_at, SweepFailure, SweepReport, SweepService};
