//! Byte-level ZIP fixture builder shared by the integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

/// 2021-06-15 12:30:00 in DOS format.
const DOS_DATE: u16 = ((2021 - 1980) << 9) | (6 << 5) | 15;
const DOS_TIME: u16 = (12 << 11) | (30 << 5);

struct Entry {
    name: Vec<u8>,
    stored: Vec<u8>,
    method: u16,
    crc32: u32,
    uncompressed_size: u32,
    local_extra: Vec<u8>,
    central_extra: Vec<u8>,
    comment: Vec<u8>,
    streamed: Option<bool>,
}

/// Builds archives field by field so tests control every byte.
#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a STORED file.
    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.as_bytes().to_vec(),
            stored: data.to_vec(),
            method: 0,
            crc32: crc32fast::hash(data),
            uncompressed_size: data.len() as u32,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
            streamed: None,
        });
        self
    }

    /// Add a DEFLATE file.
    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let stored = encoder.finish().unwrap();

        self.entries.push(Entry {
            name: name.as_bytes().to_vec(),
            stored,
            method: 8,
            crc32: crc32fast::hash(data),
            uncompressed_size: data.len() as u32,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
            streamed: None,
        });
        self
    }

    /// Add a directory placeholder; `name` should end with '/'.
    pub fn dir(self, name: &str) -> Self {
        self.file(name, b"")
    }

    /// Give the last entry a well-formed extra field of `len` bytes
    /// (at least 4) in both its local header and directory entry.
    pub fn extra(mut self, len: usize) -> Self {
        let field = extra_field(len);
        let entry = self.entries.last_mut().unwrap();
        entry.local_extra = field.clone();
        entry.central_extra = field;
        self
    }

    /// Give the last entry extra fields of different lengths per record.
    pub fn extras(mut self, local: usize, central: usize) -> Self {
        let entry = self.entries.last_mut().unwrap();
        entry.local_extra = extra_field(local);
        entry.central_extra = extra_field(central);
        self
    }

    /// Give the last entry a file comment.
    pub fn comment(mut self, comment: &str) -> Self {
        self.entries.last_mut().unwrap().comment = comment.as_bytes().to_vec();
        self
    }

    /// Write the last entry in streaming mode: zero sizes in the local
    /// header and a data descriptor after the content.
    pub fn streamed(mut self, with_signature: bool) -> Self {
        self.entries.last_mut().unwrap().streamed = Some(with_signature);
        self
    }

    pub fn archive_comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for e in &self.entries {
            let offset = out.len() as u32;
            let flags: u16 = if e.streamed.is_some() { 0x0008 } else { 0 };
            let (crc, csize, uncompressed) = if e.streamed.is_some() {
                (0, 0, 0)
            } else {
                (e.crc32, e.stored.len() as u32, e.uncompressed_size)
            };

            out.extend_from_slice(b"PK\x03\x04");
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(flags).unwrap();
            out.write_u16::<LittleEndian>(e.method).unwrap();
            out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(csize).unwrap();
            out.write_u32::<LittleEndian>(uncompressed).unwrap();
            out.write_u16::<LittleEndian>(e.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(e.local_extra.len() as u16).unwrap();
            out.extend_from_slice(&e.name);
            out.extend_from_slice(&e.local_extra);
            out.extend_from_slice(&e.stored);

            if let Some(with_signature) = e.streamed {
                if with_signature {
                    out.extend_from_slice(b"PK\x07\x08");
                }
                out.write_u32::<LittleEndian>(e.crc32).unwrap();
                out.write_u32::<LittleEndian>(e.stored.len() as u32).unwrap();
                out.write_u32::<LittleEndian>(e.uncompressed_size).unwrap();
            }

            let is_dir = e.name.last() == Some(&b'/');
            central.extend_from_slice(b"PK\x01\x02");
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(flags).unwrap();
            central.write_u16::<LittleEndian>(e.method).unwrap();
            central.write_u16::<LittleEndian>(DOS_TIME).unwrap();
            central.write_u16::<LittleEndian>(DOS_DATE).unwrap();
            central.write_u32::<LittleEndian>(e.crc32).unwrap();
            central.write_u32::<LittleEndian>(e.stored.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(e.uncompressed_size).unwrap();
            central.write_u16::<LittleEndian>(e.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(e.central_extra.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(e.comment.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(if is_dir { 0x10 } else { 0 }).unwrap();
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.extend_from_slice(&e.name);
            central.extend_from_slice(&e.central_extra);
            central.extend_from_slice(&e.comment);
        }

        let cd_offset = out.len() as u32;
        let count = self.entries.len() as u16;
        out.extend_from_slice(&central);
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }
}

/// An extra field block with a private header ID and zero payload.
fn extra_field(len: usize) -> Vec<u8> {
    assert!(len >= 4, "an extra field needs a 4-byte header");
    let mut field = Vec::with_capacity(len);
    field.write_u16::<LittleEndian>(0x6666).unwrap();
    field.write_u16::<LittleEndian>((len - 4) as u16).unwrap();
    field.resize(len, 0);
    field
}

/// Read every file back with the `zip` crate, in archive order.
pub fn read_all(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
    let mut files = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        files.push((file.name().to_string(), data));
    }
    files
}
