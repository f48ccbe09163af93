pub mod service;

pub use service::{archive_name, create_archive, ARCHIVE_EXT};
