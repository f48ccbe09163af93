//! WebDAV transfer client.
//!
//! The uploader side of the system: a thin PUT client over reqwest. The
//! sweeper never talks to this crate; it works on the server's local
//! filesystem directly.

pub mod webdav;

pub use webdav::{StorageError, StorageResult, WebDavClient};
