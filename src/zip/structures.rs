use byteorder::{ByteOrder, LittleEndian};

use super::error::{MalformedArchive, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    /// Short label used in listings.
    pub fn name(&self) -> String {
        match self {
            CompressionMethod::Stored => "Stored".to_string(),
            CompressionMethod::Deflate => "Defl:N".to_string(),
            CompressionMethod::Unknown(v) => format!("Unk:{:03}", v),
        }
    }
}

/// General purpose flag: sizes and CRC live in a data descriptor after the content.
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Borrow `len` bytes at `offset`, or report what could not be read.
pub(crate) fn read_slice<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8]> {
    let out_of_bounds = || MalformedArchive::OutOfBounds {
        what,
        offset,
        len,
        size: data.len(),
    };
    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    data.get(offset..end).ok_or_else(out_of_bounds)
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    const DISK_NUMBER: usize = 4;
    const DISK_WITH_CD: usize = 6;
    const DISK_ENTRIES: usize = 8;
    const TOTAL_ENTRIES: usize = 10;
    const CD_SIZE: usize = 12;
    const CD_OFFSET: usize = 16;
    const COMMENT_LEN: usize = 20;

    /// Parse the fixed portion of a trailer starting at `offset`.
    ///
    /// The signature is assumed to have been matched by the caller.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let raw = read_slice(data, offset, Self::SIZE, "end of central directory")?;

        Ok(Self {
            disk_number: LittleEndian::read_u16(&raw[Self::DISK_NUMBER..]),
            disk_with_cd: LittleEndian::read_u16(&raw[Self::DISK_WITH_CD..]),
            disk_entries: LittleEndian::read_u16(&raw[Self::DISK_ENTRIES..]),
            total_entries: LittleEndian::read_u16(&raw[Self::TOTAL_ENTRIES..]),
            cd_size: LittleEndian::read_u32(&raw[Self::CD_SIZE..]),
            cd_offset: LittleEndian::read_u32(&raw[Self::CD_OFFSET..]),
            comment_len: LittleEndian::read_u16(&raw[Self::COMMENT_LEN..]),
        })
    }

    /// Serialize the fixed portion. The comment itself is never emitted.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(Self::SIGNATURE);
        LittleEndian::write_u16(&mut out[Self::DISK_NUMBER..], self.disk_number);
        LittleEndian::write_u16(&mut out[Self::DISK_WITH_CD..], self.disk_with_cd);
        LittleEndian::write_u16(&mut out[Self::DISK_ENTRIES..], self.disk_entries);
        LittleEndian::write_u16(&mut out[Self::TOTAL_ENTRIES..], self.total_entries);
        LittleEndian::write_u32(&mut out[Self::CD_SIZE..], self.cd_size);
        LittleEndian::write_u32(&mut out[Self::CD_OFFSET..], self.cd_offset);
        LittleEndian::write_u16(&mut out[Self::COMMENT_LEN..], self.comment_len);
        out
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
///
/// Borrowed view over one directory entry of the input. `prefix` covers the
/// fixed portion plus the file name; the extra field and comment that follow
/// are only accounted for in [`span`](Self::span).
#[derive(Debug, Clone)]
pub struct CentralDirectoryHeader<'a> {
    /// Position of the entry within the input.
    pub offset: usize,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_field_len: u16,
    pub comment_len: u16,
    pub lfh_offset: u32,
    pub prefix: &'a [u8],
}

impl<'a> CentralDirectoryHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";
    pub const MIN_SIZE: usize = 46;

    const METHOD: usize = 10;
    const MOD_TIME: usize = 12;
    const MOD_DATE: usize = 14;
    const CRC32: usize = 16;
    const COMPRESSED_SIZE: usize = 20;
    const UNCOMPRESSED_SIZE: usize = 24;
    pub(crate) const NAME_LEN: usize = 28;
    pub(crate) const EXTRA_LEN: usize = 30;
    pub(crate) const COMMENT_LEN: usize = 32;
    pub(crate) const LFH_OFFSET: usize = 42;

    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self> {
        let fixed = read_slice(data, offset, Self::MIN_SIZE, "central directory entry")?;
        let file_name_len = LittleEndian::read_u16(&fixed[Self::NAME_LEN..]);
        let prefix = read_slice(
            data,
            offset,
            Self::MIN_SIZE + file_name_len as usize,
            "central directory file name",
        )?;

        Ok(Self {
            offset,
            compression_method: CompressionMethod::from_u16(LittleEndian::read_u16(
                &fixed[Self::METHOD..],
            )),
            last_mod_time: LittleEndian::read_u16(&fixed[Self::MOD_TIME..]),
            last_mod_date: LittleEndian::read_u16(&fixed[Self::MOD_DATE..]),
            crc32: LittleEndian::read_u32(&fixed[Self::CRC32..]),
            compressed_size: LittleEndian::read_u32(&fixed[Self::COMPRESSED_SIZE..]),
            uncompressed_size: LittleEndian::read_u32(&fixed[Self::UNCOMPRESSED_SIZE..]),
            file_name_len,
            extra_field_len: LittleEndian::read_u16(&fixed[Self::EXTRA_LEN..]),
            comment_len: LittleEndian::read_u16(&fixed[Self::COMMENT_LEN..]),
            lfh_offset: LittleEndian::read_u32(&fixed[Self::LFH_OFFSET..]),
            prefix,
        })
    }

    pub fn file_name(&self) -> &'a [u8] {
        &self.prefix[Self::MIN_SIZE..]
    }

    /// Directory placeholders end with '/'
    pub fn is_directory(&self) -> bool {
        self.file_name().last() == Some(&b'/')
    }

    /// Bytes occupied in the input: fixed portion, name, extra field, comment.
    pub fn span(&self) -> usize {
        self.prefix.len() + self.extra_field_len as usize + self.comment_len as usize
    }
}

/// Local File Header (LFH) - 30 bytes
#[derive(Debug, Clone)]
pub struct LocalFileHeader<'a> {
    /// Position of the header within the input.
    pub offset: usize,
    pub flags: u16,
    pub compressed_size: u32,
    pub file_name_len: u16,
    pub extra_field_len: u16,
    pub prefix: &'a [u8],
}

impl<'a> LocalFileHeader<'a> {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    const FLAGS: usize = 6;
    const COMPRESSED_SIZE: usize = 18;
    pub(crate) const NAME_LEN: usize = 26;
    pub(crate) const EXTRA_LEN: usize = 28;

    /// Parse the header at `offset`, taking the name length from the header itself.
    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self> {
        let fixed = read_slice(data, offset, Self::SIZE, "local file header")?;
        let file_name_len = LittleEndian::read_u16(&fixed[Self::NAME_LEN..]);
        let prefix = read_slice(
            data,
            offset,
            Self::SIZE + file_name_len as usize,
            "local file name",
        )?;

        Ok(Self {
            offset,
            flags: LittleEndian::read_u16(&fixed[Self::FLAGS..]),
            compressed_size: LittleEndian::read_u32(&fixed[Self::COMPRESSED_SIZE..]),
            file_name_len,
            extra_field_len: LittleEndian::read_u16(&fixed[Self::EXTRA_LEN..]),
            prefix,
        })
    }

    /// Sizes and CRC follow the content in a data descriptor.
    pub fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Offset of the first content byte, just past the extra field.
    pub fn data_offset(&self) -> usize {
        self.offset + self.prefix.len() + self.extra_field_len as usize
    }
}

/// Data descriptor trailing content written in streaming mode.
pub const DATA_DESCRIPTOR_SIGNATURE: &[u8] = b"PK\x07\x08";
/// Descriptor length without the optional signature (crc, sizes).
pub const DATA_DESCRIPTOR_SIZE: usize = 12;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub extra_field_len: u16,
    pub comment_len: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Bytes minification would drop from this entry's directory record alone.
    pub fn droppable_bytes(&self) -> u64 {
        self.extra_field_len as u64 + self.comment_len as u64
    }
}

impl From<&CentralDirectoryHeader<'_>> for ZipFileEntry {
    fn from(cdh: &CentralDirectoryHeader<'_>) -> Self {
        Self {
            // Use lossy conversion to handle non-UTF8 filenames gracefully
            file_name: String::from_utf8_lossy(cdh.file_name()).into_owned(),
            compression_method: cdh.compression_method,
            compressed_size: cdh.compressed_size as u64,
            uncompressed_size: cdh.uncompressed_size as u64,
            crc32: cdh.crc32,
            last_mod_time: cdh.last_mod_time,
            last_mod_date: cdh.last_mod_date,
            extra_field_len: cdh.extra_field_len,
            comment_len: cdh.comment_len,
            is_directory: cdh.is_directory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_slice_reports_overrun() {
        let data = [0u8; 10];
        assert_eq!(read_slice(&data, 4, 6, "x").unwrap(), &data[4..]);
        assert_eq!(
            read_slice(&data, 8, 4, "field"),
            Err(MalformedArchive::OutOfBounds {
                what: "field",
                offset: 8,
                len: 4,
                size: 10,
            })
        );
        assert!(read_slice(&data, usize::MAX, 2, "x").is_err());
    }

    #[test]
    fn eocd_bytes_match_parse() {
        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: 3,
            total_entries: 3,
            cd_size: 0x1234,
            cd_offset: 0xABCDEF,
            comment_len: 0,
        };
        let bytes = eocd.to_bytes();
        assert_eq!(&bytes[..4], EndOfCentralDirectory::SIGNATURE);
        assert_eq!(&bytes[12..16], &[0x34, 0x12, 0, 0]);
        assert_eq!(EndOfCentralDirectory::parse(&bytes, 0).unwrap(), eocd);
        assert!(!eocd.is_zip64());
    }

    #[test]
    fn directory_name_marks_placeholder() {
        let mut raw = vec![0u8; CentralDirectoryHeader::MIN_SIZE];
        raw[..4].copy_from_slice(CentralDirectoryHeader::SIGNATURE);
        raw[28] = 4;
        raw[30] = 7;
        raw[32] = 2;
        raw.extend_from_slice(b"dir/");
        raw.extend_from_slice(&[0u8; 9]);

        let cdh = CentralDirectoryHeader::parse(&raw, 0).unwrap();
        assert!(cdh.is_directory());
        assert_eq!(cdh.file_name(), b"dir/");
        assert_eq!(cdh.span(), 46 + 4 + 7 + 2);
        assert_eq!(cdh.span(), raw.len());
    }

    #[test]
    fn truncated_name_is_out_of_bounds() {
        let mut raw = vec![0u8; CentralDirectoryHeader::MIN_SIZE];
        raw[28] = 10;
        raw.extend_from_slice(b"short");
        assert!(matches!(
            CentralDirectoryHeader::parse(&raw, 0),
            Err(MalformedArchive::OutOfBounds {
                what: "central directory file name",
                ..
            })
        ));
    }

    #[test]
    fn mod_date_and_time() {
        let entry = ZipFileEntry {
            file_name: "a".to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            // 2021-06-15 13:45:30
            last_mod_date: ((2021 - 1980) << 9) | (6 << 5) | 15,
            last_mod_time: (13 << 11) | (45 << 5) | 15,
            extra_field_len: 20,
            comment_len: 5,
            is_directory: false,
        };
        assert_eq!(entry.mod_date(), (2021, 6, 15));
        assert_eq!(entry.mod_time(), (13, 45, 30));
        assert_eq!(entry.droppable_bytes(), 25);
    }
}
