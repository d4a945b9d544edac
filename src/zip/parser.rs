//! Low-level ZIP archive parser.
//!
//! This module walks the binary structures of an archive held entirely in
//! memory. Every read goes through a bounds check first, so a malformed
//! archive surfaces as [`MalformedArchive`] instead of a panic.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) near the buffer's end
//! 2. Walk the Central Directory, one entry at a time
//! 3. For each entry, resolve its Local File Header and content span

use log::{debug, warn};

use super::error::{MalformedArchive, Result};
use super::structures::*;

/// Byte spans making up one file record in the input.
///
/// `header` is the fixed header plus file name; the extra field between it
/// and `content` is deliberately not part of the record.
#[derive(Debug, Clone)]
pub struct FileRecord<'a> {
    pub header: &'a [u8],
    /// Length of the extra field skipped between `header` and `content`.
    pub extra_field_len: u16,
    pub content: &'a [u8],
    /// Trailing data descriptor, empty unless flag bit 3 is set.
    pub descriptor: &'a [u8],
}

impl FileRecord<'_> {
    /// Length once the extra field is removed.
    pub fn minified_len(&self) -> usize {
        self.header.len() + self.content.len() + self.descriptor.len()
    }
}

/// Parser over an in-memory ZIP archive.
///
/// Holds nothing but a borrow of the input, so any number of parsers can
/// share one buffer.
#[derive(Debug, Clone, Copy)]
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Scans backwards starting 22 bytes before the end for the EOCD
    /// signature and takes the first hit, down to the start of the buffer
    /// so data appended after the archive does not hide it. The comment
    /// length is not cross-checked, so a comment that itself contains
    /// `PK\x05\x06` at least 22 bytes before the end is mistaken for the
    /// trailer.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, usize)> {
        let size = EndOfCentralDirectory::SIZE;
        if self.data.len() < size {
            return Err(MalformedArchive::TrailerNotFound);
        }

        let last = self.data.len() - size;

        let offset = (0..=last)
            .rev()
            .find(|&i| &self.data[i..i + 4] == EndOfCentralDirectory::SIGNATURE)
            .ok_or(MalformedArchive::TrailerNotFound)?;

        let eocd = EndOfCentralDirectory::parse(self.data, offset)?;
        if eocd.is_zip64() {
            warn!(
                "end of central directory at {:#x} carries ZIP64 sentinel values; output will not be usable",
                offset
            );
        }

        Ok((eocd, offset))
    }

    /// Iterate over every Central Directory entry, directories included.
    ///
    /// The directory range declared by `eocd` must lie inside the buffer.
    pub fn central_directory(&self, eocd: &EndOfCentralDirectory) -> Result<CentralDirectory<'a>> {
        let cd_offset = eocd.cd_offset as usize;
        read_slice(self.data, cd_offset, eocd.cd_size as usize, "central directory")?;

        Ok(CentralDirectory {
            data: self.data,
            cursor: cd_offset,
            remaining: eocd.total_entries,
        })
    }

    /// Resolve the Local File Header an entry points at.
    ///
    /// The header must declare the same name length as the entry; the name
    /// bytes themselves are not compared.
    pub fn local_header(&self, cdh: &CentralDirectoryHeader<'a>) -> Result<LocalFileHeader<'a>> {
        let lfh = LocalFileHeader::parse(self.data, cdh.lfh_offset as usize)?;

        if lfh.file_name_len != cdh.file_name_len {
            return Err(MalformedArchive::NameLengthMismatch {
                offset: lfh.offset,
                header: lfh.file_name_len,
                directory: cdh.file_name_len,
            });
        }

        Ok(lfh)
    }

    /// Resolve the header, content and data descriptor spans of an entry.
    ///
    /// The stored size comes from the Local File Header, except when the
    /// entry was streamed (flag bit 3) and the header sizes are zero; the
    /// directory entry's size is used then.
    pub fn file_record(&self, cdh: &CentralDirectoryHeader<'a>) -> Result<FileRecord<'a>> {
        let lfh = self.local_header(cdh)?;
        let streamed = lfh.has_data_descriptor();

        let stored_size = if streamed {
            cdh.compressed_size
        } else {
            lfh.compressed_size
        };

        let data_offset = lfh.data_offset();
        let content = read_slice(self.data, data_offset, stored_size as usize, "file content")?;

        let descriptor = if streamed {
            let descriptor_offset = data_offset + content.len();
            let signed = self
                .data
                .get(descriptor_offset..descriptor_offset + 4)
                .is_some_and(|sig| sig == DATA_DESCRIPTOR_SIGNATURE);
            let len = if signed {
                DATA_DESCRIPTOR_SIZE + 4
            } else {
                DATA_DESCRIPTOR_SIZE
            };
            read_slice(self.data, descriptor_offset, len, "data descriptor")?
        } else {
            &[]
        };

        Ok(FileRecord {
            header: lfh.prefix,
            extra_field_len: lfh.extra_field_len,
            content,
            descriptor,
        })
    }

    /// List all entries of the archive.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, _) = self.find_eocd()?;
        self.central_directory(&eocd)?
            .map(|cdh| cdh.map(|cdh| ZipFileEntry::from(&cdh)))
            .collect()
    }
}

/// Forward-only walk over the Central Directory.
///
/// Entries are stored back to back, so the cursor always advances by the
/// full span of the entry just read. Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct CentralDirectory<'a> {
    data: &'a [u8],
    cursor: usize,
    remaining: u16,
}

impl<'a> CentralDirectory<'a> {
    /// Keep only entries that carry content, dropping directory placeholders.
    pub fn files(self) -> Files<'a> {
        Files {
            entries: self,
            skipped: 0,
        }
    }
}

impl<'a> Iterator for CentralDirectory<'a> {
    type Item = Result<CentralDirectoryHeader<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match CentralDirectoryHeader::parse(self.data, self.cursor) {
            Ok(cdh) => {
                self.remaining -= 1;
                self.cursor += cdh.span();
                Some(Ok(cdh))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Central Directory walk without directory placeholders.
///
/// Errors are passed through; [`skipped`](Self::skipped) counts the
/// placeholders dropped so far.
#[derive(Debug, Clone)]
pub struct Files<'a> {
    entries: CentralDirectory<'a>,
    skipped: usize,
}

impl Files<'_> {
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a> Iterator for Files<'a> {
    type Item = Result<CentralDirectoryHeader<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Ok(cdh) if cdh.is_directory() => {
                    debug!(
                        "skipping directory entry {}",
                        String::from_utf8_lossy(cdh.file_name())
                    );
                    self.skipped += 1;
                }
                entry => return Some(entry),
            }
        }
    }
}
