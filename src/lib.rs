//! # zipmin
//!
//! Shrinks ZIP archives by rewriting them without the parts most extractors
//! never need.
//!
//! Minification drops:
//!
//! - Directory entries (names ending in `/`)
//! - Extra fields, from both local headers and the central directory
//! - File comments and the archive comment
//!
//! File contents are copied byte for byte and every offset, size and count is
//! recomputed, so all files still extract. Archives that rely on any of the
//! dropped parts lose that information: empty directories, 7-Zip timestamps,
//! Unicode path extra fields and the like. ZIP64 and multi-disk archives are
//! not supported.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipmin::{BatchOptions, LocalFileStore, minify_all};
//!
//! #[tokio::main]
//! async fn main() {
//!     let paths: Vec<std::path::PathBuf> = vec!["archive.zip".into()];
//!     let options = BatchOptions { verify: true, ..Default::default() };
//!
//!     for report in minify_all(Arc::new(LocalFileStore::new()), &paths, &options).await {
//!         match report.outcome {
//!             Ok(savings) => println!("{}: saved {} bytes", report.path.display(), savings.saved()),
//!             Err(e) => eprintln!("{}: {:#}", report.path.display(), e),
//!         }
//!     }
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod io;
pub mod zip;

pub use batch::{BatchOptions, FileReport, Savings, minify_all};
pub use cli::Cli;
pub use io::{ArchiveStore, LocalFileStore};
pub use zip::{MalformedArchive, ZipExtractor, ZipFileEntry, minify};
