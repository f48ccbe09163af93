//! Davify Core Library
//!
//! This crate provides the filename-encoding scheme shared by the uploader
//! and the expiry sweeper: the lifetime code table, upload-name composition
//! and parsing, connection configuration, and notification rendering.
//! Everything here is synchronous and does no I/O besides reading env vars.

pub mod config;
pub mod error;
pub mod filename;
pub mod lifetime;
pub mod notify;

// Re-export commonly used types
pub use config::WebDavConfig;
pub use error::NameError;
pub use filename::{
    compose, extract_max_age, version_suffix, FileAgePolicy, UploadFilename, RANDOM_PREFIX_LEN,
};
pub use lifetime::{LifetimeEntry, LifetimeTable, CODE_ALPHABET};
pub use notify::{render_notification, Notification};
