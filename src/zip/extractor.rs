use flate2::read::DeflateDecoder;
use std::io::Read;

use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CentralDirectoryHeader, CompressionMethod, ZipFileEntry};

/// Content of one non-directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Raw name bytes as stored in the archive.
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl ExtractedFile {
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// In-memory ZIP extractor
pub struct ZipExtractor<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    /// List all entries in the archive, directories included
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        Ok(self.parser.list_files()?)
    }

    /// Extract every non-directory entry, in directory order
    pub fn extract_all(&self) -> Result<Vec<ExtractedFile>> {
        let (eocd, _) = self.parser.find_eocd()?;

        let mut files = Vec::with_capacity(eocd.total_entries as usize);
        for cdh in self.parser.central_directory(&eocd)?.files() {
            let cdh = cdh?;
            let data = self
                .extract_entry(&cdh)
                .with_context(|| format!("extracting {}", String::from_utf8_lossy(cdh.file_name())))?;
            files.push(ExtractedFile {
                name: cdh.file_name().to_vec(),
                data,
            });
        }

        Ok(files)
    }

    /// Decode one entry's stored content
    fn extract_entry(&self, cdh: &CentralDirectoryHeader<'a>) -> Result<Vec<u8>> {
        let record = self.parser.file_record(cdh)?;
        let expected = cdh.uncompressed_size as usize;

        let data = match cdh.compression_method {
            CompressionMethod::Stored => record.content.to_vec(),
            CompressionMethod::Deflate => {
                // Decode at most one byte past the declared size
                let mut buf = Vec::with_capacity(expected.min(record.content.len().saturating_mul(4)));
                DeflateDecoder::new(record.content)
                    .take(expected as u64 + 1)
                    .read_to_end(&mut buf)?;
                buf
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method: {} (only STORED and DEFLATE are supported)",
                    method
                );
            }
        };

        if data.len() != expected {
            bail!(
                "expected {} bytes of content, got {}",
                expected,
                data.len()
            );
        }

        Ok(data)
    }
}

/// Check that `minified` holds exactly the files of `original`, byte for byte.
///
/// Directory placeholders of `original` are ignored. Order must match since
/// minification never reorders entries.
pub fn verify_contents(original: &[u8], minified: &[u8]) -> Result<()> {
    let before = ZipExtractor::new(original)
        .extract_all()
        .context("reading original archive")?;
    let after = ZipExtractor::new(minified)
        .extract_all()
        .context("reading minified archive")?;

    if before.len() != after.len() {
        bail!(
            "minified archive holds {} files, original holds {}",
            after.len(),
            before.len()
        );
    }

    for (a, b) in before.iter().zip(&after) {
        if a.name != b.name {
            bail!(
                "entry order changed: expected {}, found {}",
                a.display_name(),
                b.display_name()
            );
        }
        if a.data != b.data {
            bail!("content of {} differs after minification", a.display_name());
        }
    }

    Ok(())
}
