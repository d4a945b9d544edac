//! Error types for archive minification.

use thiserror::Error;

/// The input could not be interpreted as a single-part ZIP archive.
///
/// Every variant is fatal to one [`minify`](super::minify) call; nothing is
/// recovered internally. Retrying the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedArchive {
    /// No End of Central Directory signature in the searchable tail.
    #[error("end of central directory record not found")]
    TrailerNotFound,

    /// A record or field would extend past the end of the input.
    #[error("{what} at offset {offset:#x} (+{len} bytes) runs past end of archive ({size} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: usize,
        len: usize,
        size: usize,
    },

    /// A local file header disagrees with its central directory entry.
    #[error(
        "local header at {offset:#x} declares a {header}-byte name, central directory says {directory}"
    )]
    NameLengthMismatch {
        offset: usize,
        header: u16,
        directory: u16,
    },
}

/// Result type for minification.
pub type Result<T> = std::result::Result<T, MalformedArchive>;
