//! ZIP archive parsing and minification.
//!
//! ## Architecture
//!
//! - [`structures`]: Typed views of ZIP records (EOCD, central directory
//!   entries, local file headers) with named field offsets
//! - [`parser`]: Bounds-checked location and walking of those records
//! - [`minifier`]: Rebuilds an archive without directories, extra fields
//!   and comments
//! - [`extractor`]: Lists and extracts entries, used to verify output
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Minification keeps that order, so every offset it writes can be derived
//! from the lengths of what was already emitted.
//!
//! ## Limitations
//!
//! - No ZIP64 support: sentinel values are passed through unchanged
//! - No multi-disk archive support
//! - Encrypted entries are copied without inspection
//! - Checksums are copied, never recomputed

mod error;
mod extractor;
mod minifier;
mod parser;
mod structures;

pub use error::MalformedArchive;
pub use extractor::{ExtractedFile, ZipExtractor, verify_contents};
pub use minifier::{Minified, MinifyStats, minify, minify_with_stats};
pub use parser::{CentralDirectory, FileRecord, Files, ZipParser};
pub use structures::*;
