//! Archive minification.
//!
//! Rebuilds an archive from its non-directory entries only: every Local File
//! Header loses its extra field, every Central Directory entry loses its
//! extra field and comment, and the EOCD loses its comment. Offsets, sizes
//! and counts are recomputed against the output, never copied through.
//!
//! The input is never mutated. Each record is copied into an owned output
//! buffer first and patched there.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use super::error::Result;
use super::parser::{FileRecord, ZipParser};
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};

/// Counters describing one minification pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MinifyStats {
    /// Entries written to the output.
    pub entries_kept: usize,
    /// Directory placeholders dropped.
    pub directories_dropped: usize,
    /// Extra field bytes dropped from headers and directory entries.
    pub extra_bytes_dropped: usize,
    /// Comment bytes dropped from directory entries and the EOCD.
    pub comment_bytes_dropped: usize,
}

/// Output of a minification pass.
#[derive(Debug, Clone)]
pub struct Minified {
    pub data: Vec<u8>,
    pub stats: MinifyStats,
}

/// Minify an archive held in memory.
///
/// # Errors
///
/// Returns [`MalformedArchive`](super::MalformedArchive) when the trailer
/// cannot be found or any record would read past the end of `input`.
///
/// # Example
///
/// ```no_run
/// let original = std::fs::read("archive.zip")?;
/// let smaller = zipmin::zip::minify(&original)?;
/// assert!(smaller.len() <= original.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn minify(input: &[u8]) -> Result<Vec<u8>> {
    minify_with_stats(input).map(|minified| minified.data)
}

/// Like [`minify`], also reporting what was dropped.
pub fn minify_with_stats(input: &[u8]) -> Result<Minified> {
    let parser = ZipParser::new(input);
    let (eocd, eocd_offset) = parser.find_eocd()?;
    debug!(
        "end of central directory at {:#x}: {} entries, directory {} bytes at {:#x}",
        eocd_offset, eocd.total_entries, eocd.cd_size, eocd.cd_offset
    );

    let mut compactor = Compactor::default();
    compactor.stats.comment_bytes_dropped += eocd.comment_len as usize;

    let mut files = parser.central_directory(&eocd)?.files();
    for cdh in files.by_ref() {
        let cdh = cdh?;
        let record = parser.file_record(&cdh)?;
        compactor.push(&cdh, &record);
    }
    compactor.stats.directories_dropped = files.skipped();

    Ok(compactor.assemble(&eocd))
}

/// Accumulates minified file records and directory entries.
///
/// The running record offset is `records.len()` and the running directory
/// size is `directory.len()`; both start at zero for every pass.
#[derive(Debug, Default)]
struct Compactor {
    records: Vec<u8>,
    directory: Vec<u8>,
    stats: MinifyStats,
}

impl Compactor {
    fn push(&mut self, cdh: &CentralDirectoryHeader<'_>, record: &FileRecord<'_>) {
        let record_offset = self.records.len();
        debug!(
            "keeping {} ({} content bytes) at {:#x}",
            String::from_utf8_lossy(cdh.file_name()),
            record.content.len(),
            record_offset
        );

        self.records.reserve(record.minified_len());
        self.records.extend_from_slice(record.header);
        LittleEndian::write_u16(
            &mut self.records[record_offset + LocalFileHeader::EXTRA_LEN..],
            0,
        );
        self.records.extend_from_slice(record.content);
        self.records.extend_from_slice(record.descriptor);

        let entry_offset = self.directory.len();
        self.directory.extend_from_slice(cdh.prefix);
        let entry = &mut self.directory[entry_offset..];
        LittleEndian::write_u16(&mut entry[CentralDirectoryHeader::EXTRA_LEN..], 0);
        LittleEndian::write_u16(&mut entry[CentralDirectoryHeader::COMMENT_LEN..], 0);
        LittleEndian::write_u32(
            &mut entry[CentralDirectoryHeader::LFH_OFFSET..],
            record_offset as u32,
        );

        self.stats.entries_kept += 1;
        self.stats.extra_bytes_dropped += record.extra_field_len as usize + cdh.extra_field_len as usize;
        self.stats.comment_bytes_dropped += cdh.comment_len as usize;
    }

    /// Concatenate records, directory and the rewritten EOCD.
    fn assemble(self, eocd: &EndOfCentralDirectory) -> Minified {
        let trailer = rewrite_trailer(
            eocd,
            self.stats.entries_kept as u16,
            self.directory.len() as u32,
            self.records.len() as u32,
        );

        let mut data = self.records;
        data.reserve(self.directory.len() + EndOfCentralDirectory::SIZE);
        data.extend_from_slice(&self.directory);
        data.extend_from_slice(&trailer.to_bytes());

        Minified {
            data,
            stats: self.stats,
        }
    }
}

/// Both entry counts are set to `entries`: only single-part archives are produced.
fn rewrite_trailer(
    eocd: &EndOfCentralDirectory,
    entries: u16,
    cd_size: u32,
    cd_offset: u32,
) -> EndOfCentralDirectory {
    EndOfCentralDirectory {
        disk_entries: entries,
        total_entries: entries,
        cd_size,
        cd_offset,
        comment_len: 0,
        ..eocd.clone()
    }
}
