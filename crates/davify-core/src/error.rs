use std::time::Duration;
use thiserror::Error;

/// Errors raised when composing an upload name or translating lifetimes.
///
/// All three variants mean the caller supplied a lifetime outside the
/// published menu; they are never produced while parsing foreign filenames
/// (the parser classifies those as [`crate::FileAgePolicy::Unknown`] instead).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("unknown lifetime label: {0:?}")]
    UnknownLabel(String),

    #[error("no lifetime code assigned for duration {0:?}")]
    UnknownDuration(Duration),

    #[error("unknown lifetime code: {0:?}")]
    UnknownCode(char),
}
