//! Zip access that survives truncated downloads.
//!
//! Crawls frequently fetch only a byte range of a document, which cuts off
//! the central directory at the end of the archive. When `zip::ZipArchive`
//! cannot open the bytes, entries are recovered by walking the local file
//! headers from the front.

use flate2::bufread::DeflateDecoder;
use indexmap::IndexMap;
use memchr::memmem;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Largest inflated entry that is read.
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// Upper bound on entries recovered by the local-header scan.
pub const MAX_SCANNED_ENTRIES: usize = 10_000;

const LOCAL_HEADER_SIGNATURE: &[u8] = b"PK\x03\x04";
const LOCAL_HEADER_LEN: usize = 30;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

enum Backing<'a> {
    Archive(ZipArchive<Cursor<&'a [u8]>>),
    Scanned(IndexMap<String, ScannedEntry<'a>>),
}

/// Entry located by the local-header scan, inflated only when read.
#[derive(Debug, Clone, Copy)]
struct ScannedEntry<'a> {
    method: u16,
    data: &'a [u8],
}

impl ScannedEntry<'_> {
    fn read(&self) -> Option<Vec<u8>> {
        match self.method {
            METHOD_DEFLATED => inflate_entry(self.data),
            _ => Some(self.data[..self.data.len().min(MAX_ENTRY_SIZE as usize)].to_vec()),
        }
    }
}

/// Read access to the entries of a possibly truncated zip archive.
pub struct ZipContainer<'a> {
    backing: Backing<'a>,
}

impl<'a> ZipContainer<'a> {
    /// Open `bytes` as a zip archive.
    ///
    /// Returns `None` only when neither the central directory nor any local
    /// header yields an entry.
    pub fn open(bytes: &'a [u8]) -> Option<Self> {
        match ZipArchive::new(Cursor::new(bytes)) {
            Ok(archive) => Some(Self {
                backing: Backing::Archive(archive),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Central directory unreadable, scanning local headers");
                let entries = scan_local_headers(bytes);
                if entries.is_empty() {
                    None
                } else {
                    Some(Self {
                        backing: Backing::Scanned(entries),
                    })
                }
            }
        }
    }

    /// True when entries were recovered from local headers.
    pub fn is_recovered(&self) -> bool {
        matches!(self.backing, Backing::Scanned(_))
    }

    /// Inflated contents of `name`, or `None` when missing or unreadable.
    pub fn get_entry(&mut self, name: &str) -> Option<Vec<u8>> {
        match &mut self.backing {
            Backing::Archive(archive) => {
                let file = archive.by_name(name).ok()?;
                let mut data = Vec::new();
                match file.take(MAX_ENTRY_SIZE).read_to_end(&mut data) {
                    Ok(_) => Some(data),
                    Err(e) if !data.is_empty() => {
                        tracing::debug!(entry = name, error = %e, "Partial zip entry read");
                        Some(data)
                    }
                    Err(e) => {
                        tracing::debug!(entry = name, error = %e, "Failed to read zip entry");
                        None
                    }
                }
            }
            Backing::Scanned(entries) => entries.get(name)?.read(),
        }
    }

    /// Entry contents decoded as UTF-8, lossily.
    pub fn get_entry_string(&mut self, name: &str) -> Option<String> {
        self.get_entry(name)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn entry_names(&self) -> Vec<String> {
        match &self.backing {
            Backing::Archive(archive) => archive.file_names().map(str::to_string).collect(),
            Backing::Scanned(entries) => entries.keys().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::Archive(archive) => archive.len(),
            Backing::Scanned(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

/// Locate entries by walking `PK\x03\x04` headers in file order.
///
/// Nothing is inflated here. An entry without a usable compressed size runs
/// up to the next local header or the end of input.
fn scan_local_headers(bytes: &[u8]) -> IndexMap<String, ScannedEntry<'_>> {
    let mut entries = IndexMap::new();
    let mut cursor = 0usize;

    while entries.len() < MAX_SCANNED_ENTRIES {
        let Some(offset) = memmem::find(&bytes[cursor..], LOCAL_HEADER_SIGNATURE) else {
            break;
        };
        let header = cursor + offset;
        let Some(entry) = LocalEntry::parse(bytes, header) else {
            break;
        };

        let data = &bytes[entry.data_start.min(bytes.len())..];
        let len = if entry.compressed_size == 0 && (entry.has_descriptor || entry.method == METHOD_DEFLATED) {
            memmem::find(data, LOCAL_HEADER_SIGNATURE).unwrap_or(data.len())
        } else {
            (entry.compressed_size as usize).min(data.len())
        };

        match entry.method {
            METHOD_DEFLATED | METHOD_STORED if !entry.name.ends_with('/') => {
                entries.entry(entry.name).or_insert(ScannedEntry {
                    method: entry.method,
                    data: &data[..len],
                });
            }
            METHOD_DEFLATED | METHOD_STORED => {}
            method => tracing::debug!(entry = %entry.name, method, "Unsupported zip compression method"),
        }

        let next = entry.data_start.saturating_add(len.max(1));
        if next >= bytes.len() {
            break;
        }
        cursor = next;
    }

    entries
}

struct LocalEntry {
    name: String,
    method: u16,
    has_descriptor: bool,
    compressed_size: u32,
    data_start: usize,
}

impl LocalEntry {
    fn parse(bytes: &[u8], header: usize) -> Option<Self> {
        if bytes.len() < header + LOCAL_HEADER_LEN {
            return None;
        }
        let flags = read_u16(bytes, header + 6)?;
        let method = read_u16(bytes, header + 8)?;
        let compressed_size = read_u32(bytes, header + 18)?;
        let name_len = usize::from(read_u16(bytes, header + 26)?);
        let extra_len = usize::from(read_u16(bytes, header + 28)?);

        let name_start = header + LOCAL_HEADER_LEN;
        let name = bytes.get(name_start..name_start + name_len)?;

        Some(Self {
            name: String::from_utf8_lossy(name).into_owned(),
            method,
            has_descriptor: flags & FLAG_DATA_DESCRIPTOR != 0,
            compressed_size,
            data_start: name_start + name_len + extra_len,
        })
    }
}

/// Inflate a raw deflate stream until its end marker or the end of input.
///
/// Truncated streams give their partial output.
fn inflate_entry(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut output = Vec::new();
    match (&mut decoder).take(MAX_ENTRY_SIZE).read_to_end(&mut output) {
        Ok(_) => Some(output),
        Err(e) if !output.is_empty() => {
            tracing::debug!(error = %e, "Truncated deflate entry, keeping partial output");
            Some(output)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to inflate zip entry");
            None
        }
    }
}
